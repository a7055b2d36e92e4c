use tracing_subscriber::EnvFilter;

use pressline_engine::config::EngineConfig;
use pressline_engine::{pipeline, PipelineError};

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pressline=info".parse().expect("static directive parses")))
        .init();

    tracing::info!("pressline engine starting");

    let engine = EngineConfig::from_env();
    engine.log_redacted();

    let config = pressline_engine::config::empty_effective_config();

    let result = pipeline::run(&engine, &config).await?;

    if result.success {
        tracing::info!(files = result.manifest.files.len(), bytes = result.manifest.total_bytes, "pressline run complete");
        Ok(())
    } else {
        tracing::error!(error = ?result.error_summary, "pressline run failed");
        std::process::exit(1);
    }
}
