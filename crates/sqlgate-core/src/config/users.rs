//! Identity provider configuration.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Where user identities come from.
///
/// Serialized as a discriminated union:
/// `{"provider": "config", "configuration": [...]}` or
/// `{"provider": "oidc", "configuration": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", content = "configuration", rename_all = "lowercase")]
pub enum UsersConfig {
    /// Static user list embedded in the configuration file.
    Config(Vec<User>),
    /// An external OIDC issuer.
    Oidc(OidcProvider),
}

impl UsersConfig {
    /// The static user list, when this provider carries one.
    pub fn static_users(&self) -> Option<&[User]> {
        match self {
            UsersConfig::Config(users) => Some(users),
            UsersConfig::Oidc(_) => None,
        }
    }
}

/// A statically configured operator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
}

/// OIDC issuer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcProvider {
    pub client_id: String,
    pub client_secret: String,
    pub issuer_url: String,
    pub redirect_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_provider_round_trips() {
        let raw = r#"{
            "provider": "config",
            "configuration": [{"id": "u1", "username": "alice", "password": "pw"}]
        }"#;
        let users: UsersConfig = serde_json::from_str(raw).unwrap();
        let list = users.static_users().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].username, "alice");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let raw = r#"{"provider": "ldap", "configuration": []}"#;
        assert!(serde_json::from_str::<UsersConfig>(raw).is_err());
    }
}
