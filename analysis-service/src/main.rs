use analysis_service::config::RelayConfig;
use analysis_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::load()?;

    init_tracing(
        "analysis-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        e
    })?;

    app.run_until_stopped().await?;
    Ok(())
}
