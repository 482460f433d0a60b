use std::path::Path;

use anyhow::Context;
use sqlgate_core::config::{Config, UsersConfig};

/// Validate a configuration file. Exits non-zero when validation fails, so
/// the command can gate deployments.
pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("load configuration from {}", config_path.display()))?;
    config.validate().context("validate configuration")?;

    let users = match &config.users {
        UsersConfig::Config(users) => users.len().to_string(),
        UsersConfig::Oidc(oidc) => format!("oidc ({})", oidc.issuer_url),
    };

    println!("configuration ok");
    println!("  targets: {}", config.targets.len());
    for target in &config.targets {
        println!("    {} ({} tables)", target.id, target.tables.len());
    }
    println!("  users:   {users}");
    println!("  rules:   {}", config.acls.len());

    Ok(())
}
