use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{self, auth, companies, jobs, users};
use crate::middleware::authenticate_jwt;

/// Build the full application router.
pub fn app(config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
                .layer(middleware::from_fn(authenticate_jwt)),
        );

    if config.security.enable_cors {
        match cors_layer(&config.security.cors_origins) {
            Some(cors) => router = router.layer(cors),
            None => tracing::warn!("CORS enabled but no valid origins configured; not adding CORS headers"),
        }
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn auth_routes() -> Router {
    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router {
    Router::new()
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/:handle",
            get(companies::get).patch(companies::update).delete(companies::remove),
        )
}

fn job_routes() -> Router {
    Router::new()
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/:id", get(jobs::get).patch(jobs::update).delete(jobs::remove))
}

fn user_routes() -> Router {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/jobs/:id", post(users::apply))
}

/// CORS restricted to the configured origins. `None` when none parse.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
