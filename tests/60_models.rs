mod common;

use anyhow::Result;
use jobly_api::database::DatabaseError;
use jobly_api::models::{
    Company, CompanyFilter, CompanyUpdate, Job, JobFilter, JobUpdate, NewCompany, NewJob, NewUser, User, UserUpdate,
};
use sqlx::PgPool;

async fn seed_company(pool: &PgPool, employees: i32) -> Result<Company> {
    let handle = common::unique("c");
    let company = Company::create(
        pool,
        &NewCompany {
            handle: handle.clone(),
            name: format!("Company {}", handle),
            description: "Desc".to_string(),
            num_employees: Some(employees),
            logo_url: None,
        },
    )
    .await?;
    Ok(company)
}

async fn seed_job(pool: &PgPool, handle: &str, title: &str, salary: i32, equity: Option<f64>) -> Result<Job> {
    let job = Job::create(
        pool,
        &NewJob {
            title: title.to_string(),
            salary: Some(salary),
            equity,
            company_handle: handle.to_string(),
        },
    )
    .await?;
    Ok(job)
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "password1".to_string(),
        first_name: "U".to_string(),
        last_name: "F".to_string(),
        email: format!("{}@user.com", username),
        is_admin: false,
    }
}

#[tokio::test]
async fn company_crud_round() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let company = seed_company(&pool, 3).await?;
    assert!(matches!(
        Company::create(
            &pool,
            &NewCompany {
                handle: company.handle.clone(),
                name: "Other".to_string(),
                description: "D".to_string(),
                num_employees: None,
                logo_url: None,
            }
        )
        .await,
        Err(DatabaseError::Duplicate(_))
    ));

    let update = CompanyUpdate { num_employees: Some(Some(10)), ..Default::default() };
    let updated = Company::update(&pool, &company.handle, &update).await?;
    assert_eq!(updated.num_employees, Some(10));
    assert_eq!(updated.name, company.name);

    let detail = Company::get(&pool, &company.handle).await?;
    assert!(detail.jobs.is_empty());

    Company::remove(&pool, &company.handle).await?;
    assert!(matches!(Company::get(&pool, &company.handle).await, Err(DatabaseError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn explicit_null_clears_nullable_columns() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let company = seed_company(&pool, 7).await?;
    let with_logo = CompanyUpdate { logo_url: Some(Some("http://logo.img".to_string())), ..Default::default() };
    assert_eq!(
        Company::update(&pool, &company.handle, &with_logo).await?.logo_url.as_deref(),
        Some("http://logo.img")
    );

    let cleared: CompanyUpdate =
        serde_json::from_value(serde_json::json!({ "name": "Renamed", "logoUrl": null, "numEmployees": null }))?;
    let updated = Company::update(&pool, &company.handle, &cleared).await?;
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.logo_url, None);
    assert_eq!(updated.num_employees, None);
    assert_eq!(updated.description, company.description);

    let job = seed_job(&pool, &company.handle, "Clearable", 5000, Some(0.1)).await?;
    let cleared: JobUpdate = serde_json::from_value(serde_json::json!({ "salary": null, "equity": null }))?;
    let updated = Job::update(&pool, job.id, &cleared).await?;
    assert_eq!(updated.salary, None);
    assert_eq!(updated.equity, None);
    assert_eq!(updated.title, "Clearable");

    // Same statement text with a value after a NULL
    let reset = JobUpdate { salary: Some(Some(6000)), equity: Some(Some(0.2)), ..Default::default() };
    let updated = Job::update(&pool, job.id, &reset).await?;
    assert_eq!(updated.salary, Some(6000));
    assert_eq!(updated.equity, Some(0.2));

    Company::remove(&pool, &company.handle).await?;
    Ok(())
}

#[tokio::test]
async fn company_filters_by_name_and_size() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let small = seed_company(&pool, 2).await?;
    let large = seed_company(&pool, 500).await?;

    let found = Company::find_all(
        &pool,
        &CompanyFilter { name: Some(small.handle.to_uppercase()), ..Default::default() },
    )
    .await?;
    assert_eq!(found, vec![small.clone()]);

    let found = Company::find_all(&pool, &CompanyFilter { min_employees: Some(400), ..Default::default() }).await?;
    assert!(found.contains(&large));
    assert!(!found.contains(&small));

    let found = Company::find_all(
        &pool,
        &CompanyFilter { name: Some(small.handle.clone()), min_employees: Some(400), max_employees: None },
    )
    .await?;
    assert!(found.is_empty());

    Company::remove(&pool, &small.handle).await?;
    Company::remove(&pool, &large.handle).await?;
    Ok(())
}

#[tokio::test]
async fn job_filters_and_partial_update() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let company = seed_company(&pool, 1).await?;
    let title = common::unique("welder");
    let with_equity = seed_job(&pool, &company.handle, &title, 90000, Some(0.05)).await?;
    let without = seed_job(&pool, &company.handle, &title, 40000, Some(0.0)).await?;

    let found = Job::find_all(
        &pool,
        &JobFilter { title: Some(title.to_uppercase()), min_salary: None, has_equity: Some(true) },
    )
    .await?;
    assert_eq!(found, vec![with_equity.clone()]);

    let found = Job::find_all(
        &pool,
        &JobFilter { title: Some(title.clone()), min_salary: None, has_equity: Some(false) },
    )
    .await?;
    assert_eq!(found.len(), 2);

    let found = Job::find_all(
        &pool,
        &JobFilter { title: Some(title.clone()), min_salary: Some(50000), has_equity: None },
    )
    .await?;
    assert_eq!(found, vec![with_equity.clone()]);

    let updated = Job::update(&pool, without.id, &JobUpdate { salary: Some(Some(45000)), ..Default::default() }).await?;
    assert_eq!(updated.salary, Some(45000));
    assert_eq!(updated.title, title);
    assert_eq!(updated.company_handle, company.handle);

    // Deleting the company cascades to its jobs
    Company::remove(&pool, &company.handle).await?;
    assert!(matches!(Job::get(&pool, with_equity.id).await, Err(DatabaseError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn job_for_missing_company_is_rejected() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let result = seed_job(&pool, &common::unique("ghost"), "J", 1, None).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn user_lifecycle_with_application() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };

    let username = common::unique("u");
    let user = User::register(&pool, &new_user(&username)).await?;
    assert!(!user.is_admin);
    assert!(matches!(User::register(&pool, &new_user(&username)).await, Err(DatabaseError::Duplicate(_))));

    assert_eq!(User::authenticate(&pool, &username, "password1").await?, user);
    assert!(matches!(
        User::authenticate(&pool, &username, "wrong").await,
        Err(DatabaseError::Unauthorized(_))
    ));

    let update = UserUpdate { password: Some(Some("new-password".to_string())), ..Default::default() };
    User::update(&pool, &username, &update).await?;
    assert!(User::authenticate(&pool, &username, "new-password").await.is_ok());

    let company = seed_company(&pool, 1).await?;
    let job = seed_job(&pool, &company.handle, "Applied", 1000, None).await?;
    assert_eq!(User::apply_to_job(&pool, &username, job.id).await?, job.id);
    assert!(matches!(
        User::apply_to_job(&pool, &username, job.id).await,
        Err(DatabaseError::Duplicate(_))
    ));
    assert!(matches!(
        User::apply_to_job(&pool, &username, -1).await,
        Err(DatabaseError::NotFound(_))
    ));

    let detail = User::get(&pool, &username).await?;
    assert_eq!(detail.jobs, vec![job.id]);

    User::remove(&pool, &username).await?;
    Company::remove(&pool, &company.handle).await?;
    assert!(matches!(User::get(&pool, &username).await, Err(DatabaseError::NotFound(_))));
    Ok(())
}
