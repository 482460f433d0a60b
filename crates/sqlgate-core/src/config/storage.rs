//! Internal storage database settings.

use serde::{Deserialize, Serialize};

/// Connection settings for the internal database that keeps query history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,

    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

impl StorageConfig {
    /// Render the connection as a postgres URL.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username,
            self.password,
            self.host,
            self.port,
            self.database,
            if self.use_ssl { "require" } else { "disable" },
        )
    }
}

fn default_max_pool_size() -> u32 {
    4
}
