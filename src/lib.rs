pub mod accounts;
pub mod api;
pub mod assistant;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;
pub mod scan;
pub mod storage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("State error: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        scan_delay_ms = config.scan_delay.as_millis() as u64,
        "Configuration loaded"
    );

    let core = Arc::new(core_state::CoreState::new(config));
    core.prepare()?;

    let server = api::start_server(core.clone(), core.config.bind_addr).await?;
    tracing::info!(addr = %server.local_addr(), "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received");
    server.stop().await;
    Ok(())
}
