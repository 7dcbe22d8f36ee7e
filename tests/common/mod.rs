#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Cargo builds the binary for integration tests and exposes its path
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_jobly-api"));
        cmd.env("PORT", port.to_string())
            .env("APP_ENV", "test")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Ok(url) = std::env::var("JOBLY_TEST_DATABASE_URL") {
            cmd.env("DATABASE_URL", url);
        }

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Degraded still means the server is accepting requests
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(30)).await?;
    Ok(server)
}

/// Pool for the test database, or `None` when `JOBLY_TEST_DATABASE_URL`
/// is unset. Loads the schema on first connect.
pub async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("JOBLY_TEST_DATABASE_URL") else {
        eprintln!("JOBLY_TEST_DATABASE_URL not set, skipping database test");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("failed to connect to test database")?;

    // Test binaries run in parallel; serialize schema creation with an advisory lock
    let schema = format!(
        "BEGIN; SELECT pg_advisory_xact_lock(4242); {} COMMIT;",
        include_str!("../../sql/jobly-schema.sql")
    );
    pool.execute(schema.as_str())
        .await
        .context("failed to load schema")?;

    Ok(Some(pool))
}

/// Short unique suffix so parallel tests never collide on keys.
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}
