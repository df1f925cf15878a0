use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use benchforge_server::db;
use benchforge_server::db::store::{SqlProjectStore, SqliteSink};
use benchforge_server::orchestrator::launcher::DockerLauncher;
use benchforge_server::orchestrator::registry::RuntimeRegistry;
use benchforge_server::orchestrator::{OrchestratorSettings, RunOrchestrator};
use benchforge_server::server::config::ServerConfig;
use benchforge_server::web::{create_axum_router, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!("Starting BenchForge server.");

    let db_pool = db::init_pool(&config.database_url).await?;

    let orchestrator = Arc::new(RunOrchestrator::new(
        Arc::new(SqlProjectStore::new(db_pool.clone())),
        Arc::new(DockerLauncher),
        Arc::new(SqliteSink::new(db_pool.clone())),
        RuntimeRegistry::with_overrides(&config.runtimes),
        OrchestratorSettings::from_config(&config),
    ));

    let app_state = AppState {
        db_pool,
        orchestrator,
        config: config.clone(),
    };
    let router = create_axum_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    info!(address = %config.listen_address, "BenchForge server listening.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}
