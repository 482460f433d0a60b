//! Gateway configuration.
//!
//! The whole gateway is driven by a single JSON document read at startup:
//!
//! - **targets**: backend databases with their declared table/column sheets
//! - **users**: the identity provider (static list or OIDC)
//! - **acls**: the ordered access rule list
//! - **facade**: HTTP listener settings
//! - **storage**: the internal database that keeps query history
//!
//! Everything here is immutable for the lifetime of the process. Validation
//! happens once, in [`Config::validate`], and a process must refuse to start
//! when it fails.

pub mod acl;
pub mod facade;
pub mod storage;
pub mod target;
pub mod users;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use acl::{AclRule, STAR};
pub use facade::FacadeConfig;
pub use storage::StorageConfig;
pub use target::{Connection, Target, TargetTable};
pub use users::{OidcProvider, User, UsersConfig};

use crate::TargetId;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub targets: Vec<Target>,
    pub users: UsersConfig,
    #[serde(default)]
    pub acls: Vec<AclRule>,
    pub facade: FacadeConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON content.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Find a target by id.
    pub fn target(&self, id: &TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| &t.id == id)
    }

    /// Check the internal consistency of the configuration.
    ///
    /// Rules:
    /// 1. every declared table name is schema-qualified (`schema.table`);
    /// 2. target ids and user ids are unique;
    /// 3. every ACL whose `target` and `tbl` are both literal references a
    ///    declared (target, table) pair;
    /// 4. with the static users provider, every non-wildcard ACL `user`
    ///    references a declared user.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut target_ids = HashSet::new();
        let mut declared = HashSet::new();
        for target in &self.targets {
            if !target_ids.insert(&target.id) {
                return Err(ConfigError::invalid(format!(
                    "duplicate target id: {}",
                    target.id
                )));
            }

            for table in &target.tables {
                if !table.table.contains('.') {
                    return Err(ConfigError::invalid(format!(
                        "table '{}' on target '{}' must be schema-qualified, like 'public.{}'",
                        table.table, target.id, table.table
                    )));
                }
                declared.insert((target.id.as_str(), table.table.as_str()));
            }
        }

        for rule in &self.acls {
            if rule.target == STAR || rule.tbl == STAR {
                continue;
            }
            if !declared.contains(&(rule.target.as_str(), rule.tbl.as_str())) {
                return Err(ConfigError::invalid(format!(
                    "ACL rule references undeclared table '{}' on target '{}'",
                    rule.tbl, rule.target
                )));
            }
        }

        if let UsersConfig::Config(users) = &self.users {
            let mut known = HashSet::new();
            for user in users {
                if !known.insert(user.id.as_str()) {
                    return Err(ConfigError::invalid(format!(
                        "duplicate user id: {}",
                        user.id
                    )));
                }
            }

            for rule in &self.acls {
                if rule.user != STAR && !known.contains(rule.user.as_str()) {
                    return Err(ConfigError::invalid(format!(
                        "ACL rule references unknown user '{}'",
                        rule.user
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        r#"{
            "targets": [
                {
                    "id": "t1",
                    "type": "postgres",
                    "connection": {
                        "host": "localhost",
                        "port": 5432,
                        "user": "gw",
                        "password": "gw",
                        "db": "app"
                    },
                    "tables": [
                        {"table": "public.clients", "fields": ["id", "name", "email"]}
                    ]
                }
            ],
            "users": {
                "provider": "config",
                "configuration": [
                    {"id": "u1", "username": "alice", "password": "secret"}
                ]
            },
            "acls": [
                {"user": "u1", "op": "select", "target": "t1", "tbl": "public.clients", "allow": true}
            ],
            "facade": {"port": 8080, "cookie_secret": "0123456789abcdef"},
            "storage": {
                "host": "localhost",
                "port": 5432,
                "database": "gateway",
                "username": "gw",
                "password": "gw"
            }
        }"#
        .to_owned()
    }

    #[test]
    fn parses_and_validates_sample() {
        let cfg = Config::from_json(&sample()).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.targets.len(), 1);
        assert_eq!(cfg.targets[0].default_schema, "public");
        assert_eq!(cfg.acls.len(), 1);
    }

    #[test]
    fn rejects_table_without_schema() {
        let raw = sample().replace("public.clients", "clients");
        let cfg = Config::from_json(&raw).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_acl_for_undeclared_table() {
        let mut cfg = Config::from_json(&sample()).unwrap();
        cfg.acls.push(AclRule {
            user: "u1".into(),
            op: "select".into(),
            target: "t1".into(),
            tbl: "public.orders".into(),
            allow: true,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_acl_for_unknown_user() {
        let mut cfg = Config::from_json(&sample()).unwrap();
        cfg.acls.push(AclRule {
            user: "ghost".into(),
            op: "*".into(),
            target: "*".into(),
            tbl: "*".into(),
            allow: true,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn wildcard_acl_fields_skip_table_linkage() {
        let mut cfg = Config::from_json(&sample()).unwrap();
        cfg.acls.push(AclRule {
            user: "u1".into(),
            op: "*".into(),
            target: "*".into(),
            tbl: "*".into(),
            allow: false,
        });
        cfg.validate().unwrap();
    }

    #[test]
    fn parses_oidc_provider() {
        let raw = sample().replace(
            r#""provider": "config","#,
            r#""provider": "oidc","#,
        );
        let raw = raw.replace(
            r#""configuration": [
                    {"id": "u1", "username": "alice", "password": "secret"}
                ]"#,
            r#""configuration": {
                    "client_id": "gw",
                    "client_secret": "s",
                    "issuer_url": "https://idp.example.com",
                    "redirect_url": "https://gw.example.com/auth/callback",
                    "scopes": ["profile"]
                }"#,
        );
        // The sample ACL names user u1; with an OIDC provider there is no
        // static user list to check against, so validation passes.
        let cfg = Config::from_json(&raw).unwrap();
        assert!(matches!(cfg.users, UsersConfig::Oidc(_)));
        cfg.validate().unwrap();
    }
}
