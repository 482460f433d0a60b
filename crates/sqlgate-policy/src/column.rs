//! Column reference support type.

use crate::error::PolicyError;

/// A column reference as written in the statement: optional qualifier
/// tokens (alias, relation, `schema.relation`, `catalog.schema.relation`)
/// plus the bare column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnRef {
    qualifier: Vec<String>,
    name: String,
}

impl ColumnRef {
    /// An unqualified reference. Resolved through the statement's
    /// single-table fallback.
    pub(crate) fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: Vec::new(),
            name: name.into(),
        }
    }

    /// A reference already attributed to a known table, e.g. an INSERT
    /// target column.
    pub(crate) fn for_table(table: &str, name: impl Into<String>) -> Self {
        Self {
            qualifier: vec![table.to_owned()],
            name: name.into(),
        }
    }

    /// Build from the identifier tokens of a (possibly compound) column
    /// reference. The last token is the column; everything before it
    /// qualifies the table.
    pub(crate) fn from_tokens(mut tokens: Vec<String>) -> Result<Self, PolicyError> {
        if tokens.is_empty() || tokens.len() > 4 {
            return Err(PolicyError::complicated(
                "column reference must have between 1 and 4 name parts",
            ));
        }
        let name = tokens.pop().unwrap_or_default();
        Ok(Self {
            qualifier: tokens,
            name,
        })
    }

    /// The qualifier in the form the table resolver indexes by. Empty for
    /// unqualified references.
    pub(crate) fn qualifier(&self) -> String {
        self.qualifier.join(".")
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_name(self) -> String {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_into_qualifier_and_name() {
        let col = ColumnRef::from_tokens(vec!["public".into(), "clients".into(), "id".into()])
            .unwrap();
        assert_eq!(col.qualifier(), "public.clients");
        assert_eq!(col.name(), "id");
    }

    #[test]
    fn single_token_is_bare() {
        let col = ColumnRef::from_tokens(vec!["id".into()]).unwrap();
        assert_eq!(col.qualifier(), "");
        assert_eq!(col.name(), "id");
    }

    #[test]
    fn too_many_tokens_are_rejected() {
        let tokens = vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()];
        assert!(ColumnRef::from_tokens(tokens).is_err());
        assert!(ColumnRef::from_tokens(Vec::new()).is_err());
    }
}
