//! DELETE statement handling.

use sqlgate_core::Op;
use sqlparser::ast::{Delete, FromTable};

use crate::error::PolicyError;
use crate::expr::{collect_condition, returning_columns};
use crate::tables::{register_table_factor, Tables};
use crate::vector::{group_by_table, AccessVector};

pub(crate) fn handle_delete(
    delete: Delete,
    default_schema: &str,
) -> Result<Vec<AccessVector>, PolicyError> {
    if !delete.tables.is_empty() {
        return Err(PolicyError::complicated(
            "multi-table DELETE is not supported",
        ));
    }
    if delete.using.is_some() {
        return Err(PolicyError::complicated("DELETE ... USING is not supported"));
    }
    if !delete.order_by.is_empty() || delete.limit.is_some() {
        return Err(PolicyError::complicated(
            "ORDER BY and LIMIT are not supported in DELETE",
        ));
    }

    let from = match &delete.from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
    };
    if from.len() != 1 {
        return Err(PolicyError::complicated(
            "DELETE requires exactly one table",
        ));
    }
    if !from[0].joins.is_empty() {
        return Err(PolicyError::complicated("JOIN expressions are not supported"));
    }

    let mut tables = Tables::new(default_schema);
    register_table_factor(&mut tables, &from[0].relation)?;
    tables.finalize();

    let mut columns = Vec::new();
    if let Some(returning) = &delete.returning {
        columns.extend(returning_columns(returning)?);
    }
    if let Some(selection) = &delete.selection {
        collect_condition(selection, &mut columns)?;
    }

    group_by_table(Op::Delete, &tables, columns)
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
    fn where_columns_are_captured() {
        let vecs = vectors("DELETE FROM clients WHERE id = 42");
        assert_eq!(vecs.len(), 1);
        assert_eq!(vecs[0].op, Op::Delete);
        assert_eq!(vecs[0].table, "public.clients");
        assert_eq!(vecs[0].columns, vec!["id"]);
    }

    #[test]
    fn bare_delete_produces_an_empty_vector() {
        let vecs = vectors("DELETE FROM clients");
        assert_eq!(vecs[0].table, "public.clients");
        assert!(vecs[0].columns.is_empty());
    }

    #[test]
    fn returning_columns_are_captured() {
        let vecs = vectors("DELETE FROM clients WHERE id = 1 RETURNING email, name");
        assert_eq!(vecs[0].columns, vec!["email", "id", "name"]);
    }

    #[test]
    fn returning_star_is_refused() {
        refused("DELETE FROM clients RETURNING *");
    }

    #[test]
    fn boolean_where_trees_are_supported() {
        let vecs = vectors("DELETE FROM clients WHERE id > 10 AND email IS NULL");
        assert_eq!(vecs[0].columns, vec!["email", "id"]);
    }

    #[test]
    fn using_is_refused() {
        refused("DELETE FROM clients USING orders WHERE clients.id = orders.client_id");
    }

    #[test]
    fn where_subquery_is_refused() {
        refused("DELETE FROM clients WHERE id IN (SELECT client_id FROM orders)");
    }

    #[test]
    fn explicit_schema_is_preserved() {
        let vecs = vectors("DELETE FROM s1.t1 WHERE c1 = 1");
        assert_eq!(vecs[0].table, "s1.t1");
    }
}
