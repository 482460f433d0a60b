//! HTTP facade settings.

use serde::{Deserialize, Serialize};

/// Listener and session settings for the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacadeConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Key used to sign session cookies.
    pub cookie_secret: String,
}

fn default_port() -> u16 {
    8080
}
