//! Policy kernel for the sqlgate database gateway.
//!
//! Decides, for each incoming SQL string, whether it may be sent to a
//! target database:
//!
//! 1. **Canonicalise**: parse the statement (PostgreSQL dialect) and
//!    rewrite it into access vectors, one `(op, table, columns)` triple per
//!    table it touches.
//! 2. **Schema-validate**: every vector must reference only declared
//!    tables and columns.
//! 3. **Access-check**: every vector must be allowed by the rule list.
//!
//! The canonicaliser is the security boundary: when it cannot confidently
//! describe what a construct touches, it refuses rather than approximates.
//! The kernel performs no I/O and holds no mutable state; a policy check is
//! a pure function of the query text, the target schema, and the rule list,
//! and may run concurrently from any number of request handlers.

mod acl;
mod column;
mod delete;
mod error;
mod expr;
mod insert;
mod schema;
mod select;
mod tables;
mod update;
mod vector;

pub use acl::{by_op, by_table, by_target, by_user, AclSet, RuleFilter};
pub use error::{PolicyError, PolicyErrorKind};
pub use schema::DbSchema;
pub use vector::AccessVector;

use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Parse one statement and rewrite it as access vectors.
///
/// `default_schema` qualifies table references that omit a schema, so the
/// emitted table names are always fully qualified.
pub fn make_vectors(
    query: &str,
    default_schema: &str,
) -> Result<Vec<AccessVector>, PolicyError> {
    let mut statements = Parser::parse_sql(&PostgreSqlDialect {}, query)
        .map_err(|err| PolicyError::bad_query(format!("parse error: {err}")))?;

    if statements.len() != 1 {
        return Err(PolicyError::bad_query(
            "query must contain exactly one statement",
        ));
    }
    let statement = statements
        .pop()
        .ok_or_else(|| PolicyError::bad_query("query must contain exactly one statement"))?;

    match statement {
        Statement::Query(query) => select::handle_select(*query, default_schema),
        Statement::Insert(insert) => insert::handle_insert(insert, default_schema),
        Statement::Update {
            table,
            assignments,
            from,
            selection,
            returning,
            or,
        } => update::handle_update(
            table,
            assignments,
            from.is_some(),
            selection,
            returning,
            or.is_some(),
            default_schema,
        ),
        Statement::Delete(delete) => delete::handle_delete(delete, default_schema),
        Statement::CreateTable(_)
        | Statement::CreateIndex(_)
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::Drop { .. }
        | Statement::Truncate { .. } => Err(PolicyError::bad_query(
            "schema-modifying statements are not allowed",
        )),
        other => Err(PolicyError::complicated(format!(
            "unsupported statement type: {}",
            statement_label(&other)
        ))),
    }
}

/// Check a query against the target schema and the curried access
/// predicate. The first failing stage short-circuits: canonicalisation,
/// then schema validation, then the rule check per vector.
pub fn is_allowed<F>(schema: &DbSchema, have_access: F, query: &str) -> Result<(), PolicyError>
where
    F: Fn(&AccessVector) -> bool,
{
    let vectors = make_vectors(query, schema.default_schema())?;

    schema.validate(&vectors)?;

    for vector in &vectors {
        if !have_access(vector) {
            return Err(PolicyError::access_denied(vector));
        }
    }

    Ok(())
}

/// A short label for rejection messages; the full statement is the user's
/// own input and does not need echoing.
fn statement_label(statement: &Statement) -> &'static str {
    match statement {
        Statement::Explain { .. } => "EXPLAIN",
        Statement::ShowVariable { .. } => "SHOW",
        Statement::StartTransaction { .. } => "transaction control",
        Statement::Commit { .. } => "transaction control",
        Statement::Rollback { .. } => "transaction control",
        Statement::Copy { .. } => "COPY",
        Statement::Grant { .. } | Statement::Revoke { .. } => "privilege management",
        _ => "statement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgate_core::config::TargetTable;

    fn schema() -> DbSchema {
        DbSchema::new(
            "public",
            vec![TargetTable {
                table: "public.clients".into(),
                fields: vec!["id".into(), "name".into(), "email".into()],
            }],
        )
    }

    #[test]
    fn empty_input_is_a_bad_query() {
        let err = make_vectors("", "public").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::BadQuery);
    }

    #[test]
    fn non_sql_input_is_a_bad_query() {
        let err = make_vectors("what time is it?", "public").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::BadQuery);
    }

    #[test]
    fn multi_statement_input_is_a_bad_query() {
        let err = make_vectors("select id from t; select id from t", "public").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::BadQuery);
    }

    #[test]
    fn ddl_is_a_bad_query() {
        for query in [
            "CREATE TABLE aaa(id text)",
            "ALTER TABLE aaa ADD COLUMN id text",
            "DROP TABLE aaa",
            "TRUNCATE aaa",
            "CREATE INDEX idx ON aaa(id)",
        ] {
            let err = make_vectors(query, "public").unwrap_err();
            assert_eq!(err.kind(), PolicyErrorKind::BadQuery, "{query}");
        }
    }

    #[test]
    fn non_dml_statements_are_complicated() {
        let err = make_vectors("EXPLAIN SELECT id FROM clients", "public").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::ComplicatedQuery);
    }

    #[test]
    fn make_vectors_emits_qualified_sorted_unique_columns() {
        let vectors =
            make_vectors("select name, id, name from clients", "public").unwrap();
        assert_eq!(vectors.len(), 1);
        assert!(vectors[0].table.contains('.'));
        assert_eq!(vectors[0].columns, vec!["id", "name"]);
    }

    #[test]
    fn is_allowed_runs_all_three_stages() {
        let schema = schema();
        is_allowed(&schema, |_| true, "select id from clients").unwrap();

        let err = is_allowed(&schema, |_| false, "select id from clients").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::AccessDenied);

        let err =
            is_allowed(&schema, |_| true, "select id, ssn from clients").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::UnknownColumn);
        assert!(err.is_access_denied());

        let err = is_allowed(&schema, |_| true, "select id from orders").unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::UnknownTable);
    }

    #[test]
    fn is_allowed_is_deterministic() {
        let schema = schema();
        let query = "select id, email from clients where name = 'x'";
        let first = is_allowed(&schema, |_| true, query).is_ok();
        for _ in 0..3 {
            assert_eq!(is_allowed(&schema, |_| true, query).is_ok(), first);
        }
    }
}
