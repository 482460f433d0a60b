//! Target database definitions.

use serde::{Deserialize, Serialize};

use crate::TargetId;

/// One backend database the gateway brokers access to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Informational engine label, e.g. "postgres".
    #[serde(rename = "type")]
    pub kind: String,

    pub connection: Connection,

    /// Schema prepended to table references that omit one.
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// The declared table whitelist. Columns not listed here are
    /// inaccessible even when they exist in the underlying database.
    pub tables: Vec<TargetTable>,
}

impl Target {
    /// Look up a declared table by its fully-qualified name.
    pub fn table(&self, name: &str) -> Option<&TargetTable> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// A declared table: fully-qualified name plus its column whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTable {
    /// Always `schema.table`; configuration without the schema component is
    /// rejected at load.
    pub table: String,
    pub fields: Vec<String>,
}

/// Connection parameters for a target. Consumed by the connection pool, not
/// by the policy kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,

    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

impl Connection {
    /// Render the connection as a postgres URL.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.db,
            if self.use_ssl { "require" } else { "disable" },
        )
    }
}

fn default_schema() -> String {
    "public".to_owned()
}

fn default_max_pool_size() -> u32 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_url_reflects_ssl_mode() {
        let conn = Connection {
            host: "db.internal".into(),
            port: 5432,
            user: "gw".into(),
            password: "pw".into(),
            db: "app".into(),
            use_ssl: true,
            max_pool_size: 4,
        };
        assert_eq!(
            conn.url(),
            "postgres://gw:pw@db.internal:5432/app?sslmode=require"
        );
    }
}
