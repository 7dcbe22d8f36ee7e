use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobly_api::database::DatabaseManager;

#[derive(Parser, Debug)]
#[command(name = "jobly-api", version, about = "Jobly job board API server")]
struct Args {
    /// Port to listen on (defaults to the configured port)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobly_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = jobly_api::config::config();
    tracing::info!("Starting Jobly API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECRET_KEY must be set in {:?} mode", config.environment);
    }

    let app = jobly_api::app::app(config);

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("{}:{}", args.bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Jobly API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
