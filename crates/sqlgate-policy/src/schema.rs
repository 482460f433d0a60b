//! Declared-schema validation.

use sqlgate_core::config::TargetTable;

use crate::error::PolicyError;
use crate::vector::AccessVector;

/// The declared schema of one target database: its default schema name plus
/// the table/column whitelist from configuration.
#[derive(Debug, Clone)]
pub struct DbSchema {
    default_schema: String,
    tables: Vec<TargetTable>,
}

impl DbSchema {
    pub fn new(default_schema: impl Into<String>, tables: Vec<TargetTable>) -> Self {
        Self {
            default_schema: default_schema.into(),
            tables,
        }
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Look up a declared table. Names without a schema component also
    /// match under the default schema, so `clients` finds `public.clients`.
    pub fn table(&self, name: &str) -> Option<&TargetTable> {
        if let Some(table) = self.tables.iter().find(|t| t.table == name) {
            return Some(table);
        }
        if !name.contains('.') {
            let prefixed = format!("{}.{name}", self.default_schema);
            return self.tables.iter().find(|t| t.table == prefixed);
        }
        None
    }

    /// Check that every vector references only declared tables and columns.
    pub fn validate(&self, vectors: &[AccessVector]) -> Result<(), PolicyError> {
        for vector in vectors {
            let Some(table) = self.table(&vector.table) else {
                return Err(PolicyError::unknown_table(&vector.table));
            };

            for column in &vector.columns {
                if !table.fields.iter().any(|field| field == column) {
                    return Err(PolicyError::unknown_column(&vector.table, column));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgate_core::Op;

    fn schema() -> DbSchema {
        DbSchema::new(
            "public",
            vec![TargetTable {
                table: "public.clients".into(),
                fields: vec!["id".into(), "name".into(), "email".into()],
            }],
        )
    }

    fn vector(table: &str, columns: &[&str]) -> AccessVector {
        AccessVector::new(
            Op::Select,
            table.into(),
            columns.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn declared_columns_pass() {
        schema()
            .validate(&[vector("public.clients", &["id", "email"])])
            .unwrap();
    }

    #[test]
    fn bare_name_matches_under_default_schema() {
        schema().validate(&[vector("clients", &["id"])]).unwrap();
    }

    #[test]
    fn unknown_table_is_a_denial() {
        let err = schema()
            .validate(&[vector("public.orders", &["id"])])
            .unwrap_err();
        assert_eq!(err.kind(), crate::PolicyErrorKind::UnknownTable);
        assert!(err.is_access_denied());
    }

    #[test]
    fn unknown_column_is_a_denial() {
        let err = schema()
            .validate(&[vector("public.clients", &["id", "ssn"])])
            .unwrap_err();
        assert_eq!(err.kind(), crate::PolicyErrorKind::UnknownColumn);
        assert!(err.is_access_denied());
    }

    #[test]
    fn qualified_name_does_not_fall_back() {
        let err = schema()
            .validate(&[vector("other.clients", &["id"])])
            .unwrap_err();
        assert_eq!(err.kind(), crate::PolicyErrorKind::UnknownTable);
    }
}
