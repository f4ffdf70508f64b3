use analytics_console::config::get_configuration;
use analytics_console::services::{metrics::init_metrics, BackendClient};
use analytics_console::startup::build_router;
use analytics_console::AppState;
use dotenvy::dotenv;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(&configuration.telemetry)?;
    init_metrics()?;

    let report_defaults = configuration
        .reports
        .default_range()
        .ok_or_else(|| anyhow::anyhow!("Report default range is inverted"))?;

    if configuration.backend.role_key.is_none() {
        info!("No fallback role key configured; login bundles must carry their own key");
    }

    let backend = Arc::new(BackendClient::new(configuration.backend.clone())?);
    let state = AppState::new(
        backend,
        report_defaults,
        configuration.backend.role_key.clone(),
    );

    let app = build_router(state, &configuration.server);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(
        backend = %configuration.backend.url,
        "Starting analytics-console on {}", address
    );
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
