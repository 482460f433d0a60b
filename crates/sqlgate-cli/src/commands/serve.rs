use std::path::Path;

use anyhow::Context;
use sqlgate_core::config::Config;

/// Load configuration and run the facade until the process is stopped.
pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("load configuration from {}", config_path.display()))?;
    config.validate().context("validate configuration")?;

    tracing::info!(config = %config_path.display(), "starting gateway");
    sqlgate_server::serve(config).await.context("run facade")?;

    Ok(())
}
