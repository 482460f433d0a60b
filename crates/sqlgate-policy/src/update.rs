//! UPDATE statement handling.

use sqlgate_core::Op;
use sqlparser::ast::{Assignment, Expr, SelectItem, TableWithJoins};

use crate::error::PolicyError;
use crate::expr::{
    collect_condition, collect_set_value, returning_columns, set_target_column,
};
use crate::tables::{register_table_factor, Tables};
use crate::vector::{group_by_table, AccessVector};

#[allow(clippy::too_many_arguments)]
pub(crate) fn handle_update(
    table: TableWithJoins,
    assignments: Vec<Assignment>,
    has_from: bool,
    selection: Option<Expr>,
    returning: Option<Vec<SelectItem>>,
    has_or: bool,
    default_schema: &str,
) -> Result<Vec<AccessVector>, PolicyError> {
    if has_from {
        return Err(PolicyError::complicated("UPDATE ... FROM is not supported"));
    }
    if has_or {
        return Err(PolicyError::complicated(
            "non-postgres UPDATE forms are not supported",
        ));
    }
    if !table.joins.is_empty() {
        return Err(PolicyError::complicated("JOIN expressions are not supported"));
    }

    let mut tables = Tables::new(default_schema);
    let fqn = register_table_factor(&mut tables, &table.relation)?;
    tables.finalize();

    let mut columns = Vec::new();
    for assignment in &assignments {
        columns.push(set_target_column(&assignment.target, &fqn)?);
        collect_set_value(&assignment.value, &mut columns)?;
    }

    if let Some(returning) = &returning {
        columns.extend(returning_columns(returning)?);
    }

    if let Some(selection) = &selection {
        collect_condition(selection, &mut columns)?;
    }

    group_by_table(Op::Update, &tables, columns)
}
