//! INSERT statement handling.

use sqlgate_core::Op;
use sqlparser::ast::{
    ConflictTarget, Expr, Insert, OnConflictAction, OnInsert, Query, SetExpr, TableObject,
};

use crate::column::ColumnRef;
use crate::error::PolicyError;
use crate::expr::{
    is_constant, is_default_marker, operator_supported, returning_columns, set_target_column,
};
use crate::tables::{split_object_name, Tables};
use crate::vector::{group_by_table, AccessVector};

pub(crate) fn handle_insert(
    insert: Insert,
    default_schema: &str,
) -> Result<Vec<AccessVector>, PolicyError> {
    if insert.or.is_some() || insert.ignore || insert.overwrite || insert.replace_into {
        return Err(PolicyError::complicated(
            "non-postgres INSERT forms are not supported",
        ));
    }
    if !insert.assignments.is_empty() {
        return Err(PolicyError::complicated("INSERT ... SET is not supported"));
    }
    if insert.partitioned.is_some() || !insert.after_columns.is_empty() {
        return Err(PolicyError::complicated(
            "partitioned INSERT is not supported",
        ));
    }

    let name = match &insert.table {
        TableObject::TableName(name) => name,
        TableObject::TableFunction(_) => {
            return Err(PolicyError::complicated(
                "table functions are not supported",
            ));
        }
    };

    let mut tables = Tables::new(default_schema);
    let (catalog, schema, relation) = split_object_name(name)?;
    let alias = insert.table_alias.as_ref().map(|a| a.value.clone());
    let table = tables.put(catalog, schema, relation, alias)?;
    tables.finalize();

    let mut columns: Vec<ColumnRef> = insert
        .columns
        .iter()
        .map(|ident| ColumnRef::for_table(&table, ident.value.clone()))
        .collect();

    match &insert.source {
        // INSERT ... DEFAULT VALUES touches no columns beyond the clauses
        // handled below.
        None => {}
        Some(source) => validate_values_source(source)?,
    }

    if let Some(returning) = &insert.returning {
        columns.extend(returning_columns(returning)?);
    }

    if let Some(on) = &insert.on {
        collect_on_conflict(on, &table, &mut columns)?;
    }

    group_by_table(Op::Insert, &tables, columns)
}

/// The INSERT source must be a plain VALUES list of constants and `DEFAULT`
/// markers. `INSERT ... SELECT` would pull from tables the target list does
/// not mention, so it is refused outright.
fn validate_values_source(source: &Query) -> Result<(), PolicyError> {
    if source.with.is_some()
        || source.order_by.is_some()
        || !source.locks.is_empty()
        || source.for_clause.is_some()
    {
        return Err(PolicyError::complicated("unsupported INSERT source"));
    }

    match source.body.as_ref() {
        SetExpr::Values(values) => {
            for row in &values.rows {
                for item in row {
                    if !is_constant(item) && !is_default_marker(item) {
                        return Err(PolicyError::complicated(
                            "INSERT values may contain only constants and DEFAULT",
                        ));
                    }
                }
            }
            Ok(())
        }
        SetExpr::Select(_) => Err(PolicyError::complicated(
            "INSERT ... SELECT is not supported",
        )),
        _ => Err(PolicyError::complicated("unsupported INSERT source")),
    }
}

fn collect_on_conflict(
    on: &OnInsert,
    table: &str,
    columns: &mut Vec<ColumnRef>,
) -> Result<(), PolicyError> {
    let OnInsert::OnConflict(conflict) = on else {
        return Err(PolicyError::complicated(
            "unsupported INSERT conflict clause",
        ));
    };

    match &conflict.conflict_target {
        None => {}
        Some(ConflictTarget::Columns(idents)) => {
            columns.extend(
                idents
                    .iter()
                    .map(|ident| ColumnRef::for_table(table, ident.value.clone())),
            );
        }
        Some(ConflictTarget::OnConstraint(_)) => {
            return Err(PolicyError::complicated(
                "ON CONFLICT ON CONSTRAINT is not supported",
            ));
        }
    }

    match &conflict.action {
        OnConflictAction::DoNothing => Ok(()),
        OnConflictAction::DoUpdate(update) => {
            if update.selection.is_some() {
                return Err(PolicyError::complicated(
                    "ON CONFLICT ... WHERE is not supported",
                ));
            }
            for assignment in &update.assignments {
                columns.push(set_target_column(&assignment.target, table)?);
                validate_conflict_value(&assignment.value)?;
            }
            Ok(())
        }
    }
}

/// DO UPDATE values may reference the `excluded` pseudo-row; only the SET
/// targets count toward the vector, but the value shape is still vetted.
fn validate_conflict_value(expr: &Expr) -> Result<(), PolicyError> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => Ok(()),
        Expr::BinaryOp { left, op, right } => {
            if !operator_supported(op) {
                return Err(PolicyError::complicated(format!(
                    "operator '{op}' is not supported in conflict updates"
                )));
            }
            validate_conflict_value(left)?;
            validate_conflict_value(right)
        }
        Expr::Nested(inner) => validate_conflict_value(inner),
        other if is_constant(other) || is_default_marker(other) => Ok(()),
        other => Err(PolicyError::complicated(format!(
            "unsupported conflict update value: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_vectors;
    use crate::PolicyErrorKind;

    fn vectors(query: &str) -> Vec<AccessVector> {
        make_vectors(query, "public").unwrap()
    }

    fn refused(query: &str) {
        let err = make_vectors(query, "public").unwrap_err();
        assert_eq!(
            err.kind(),
            PolicyErrorKind::ComplicatedQuery,
            "query should be refused as complicated: {query} ({err})"
        );
    }

    #[test]
    fn plain_insert_collects_target_columns() {
        let vecs = vectors("INSERT INTO clients(id, name, email) VALUES ('1', 'a', 'b')");
        assert_eq!(vecs.len(), 1);
        assert_eq!(vecs[0].op, Op::Insert);
        assert_eq!(vecs[0].table, "public.clients");
        assert_eq!(vecs[0].columns, vec!["email", "id", "name"]);
    }

    #[test]
    fn default_values_produces_an_empty_vector() {
        let vecs = vectors("INSERT INTO clients DEFAULT VALUES");
        assert_eq!(vecs.len(), 1);
        assert_eq!(vecs[0].table, "public.clients");
        assert!(vecs[0].columns.is_empty());
    }

    #[test]
    fn multi_row_values_are_allowed() {
        let vecs = vectors("INSERT INTO clients(id) VALUES (1), (2), (3)");
        assert_eq!(vecs[0].columns, vec!["id"]);
    }

    #[test]
    fn returning_columns_are_collected() {
        let vecs = vectors("INSERT INTO clients(id) VALUES (1) RETURNING email, name");
        assert_eq!(vecs[0].columns, vec!["email", "id", "name"]);
    }

    #[test]
    fn returning_star_is_refused() {
        refused("INSERT INTO clients(id) VALUES (1) RETURNING *");
    }

    #[test]
    fn explicit_schema_is_preserved() {
        let vecs = vectors("INSERT INTO s1.t1(c1) VALUES (1)");
        assert_eq!(vecs[0].table, "s1.t1");
    }

    #[test]
    fn on_conflict_columns_are_collected() {
        let vecs = vectors(
            "INSERT INTO clients(id) VALUES (1) ON CONFLICT (email) DO NOTHING",
        );
        assert_eq!(vecs[0].columns, vec!["email", "id"]);
    }

    #[test]
    fn on_conflict_update_targets_are_collected() {
        let vecs = vectors(
            "INSERT INTO clients(id) VALUES (1) ON CONFLICT (id) DO UPDATE SET name = excluded.name",
        );
        assert_eq!(vecs[0].columns, vec!["id", "name"]);
    }

    #[test]
    fn on_conflict_constraint_name_is_refused() {
        refused(
            "INSERT INTO clients(id) VALUES (1) ON CONFLICT ON CONSTRAINT clients_pkey DO NOTHING",
        );
    }

    #[test]
    fn on_conflict_update_predicate_is_refused() {
        refused(
            "INSERT INTO clients(id) VALUES (1) ON CONFLICT (id) DO UPDATE SET name = 'x' WHERE clients.id > 0",
        );
    }

    #[test]
    fn insert_select_is_refused() {
        refused("INSERT INTO clients(id) SELECT id FROM archive");
    }

    #[test]
    fn values_with_expressions_are_refused() {
        refused("INSERT INTO clients(id) VALUES (other_column)");
        refused("INSERT INTO clients(id) VALUES ((SELECT max(id) FROM clients))");
    }
}
