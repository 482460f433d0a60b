//! SELECT statement handling.

use sqlgate_core::Op;
use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, OrderByKind,
    Query, SelectItem, SetExpr,
};

use crate::column::ColumnRef;
use crate::error::PolicyError;
use crate::expr::{collect_comparison, column_from_expr};
use crate::tables::{register_table_factor, Tables};
use crate::vector::{group_by_table, AccessVector};

/// Function names permitted in the target list.
const ALLOWED_FUNCTIONS: &[&str] = &["count", "lower", "upper"];

pub(crate) fn handle_select(
    query: Query,
    default_schema: &str,
) -> Result<Vec<AccessVector>, PolicyError> {
    if query.with.is_some() {
        return Err(PolicyError::complicated(
            "common table expressions are not supported",
        ));
    }
    if !query.locks.is_empty() || query.for_clause.is_some() {
        return Err(PolicyError::complicated("locking clauses are not supported"));
    }

    let select = match *query.body {
        SetExpr::Select(select) => select,
        SetExpr::SetOperation { .. } => {
            return Err(PolicyError::complicated(
                "set operations (UNION/INTERSECT/EXCEPT) are not supported",
            ));
        }
        SetExpr::Values(_) => {
            return Err(PolicyError::complicated(
                "VALUES statements are not supported",
            ));
        }
        _ => return Err(PolicyError::complicated("unsupported query body")),
    };

    if select.distinct.is_some() {
        return Err(PolicyError::complicated("DISTINCT is not supported"));
    }
    if select.top.is_some() {
        return Err(PolicyError::complicated("TOP is not supported"));
    }
    if select.into.is_some() {
        return Err(PolicyError::complicated("SELECT INTO is not supported"));
    }
    if select.having.is_some() {
        return Err(PolicyError::complicated("HAVING is not supported"));
    }
    if !select.named_window.is_empty() || select.qualify.is_some() {
        return Err(PolicyError::complicated("window clauses are not supported"));
    }
    if !select.lateral_views.is_empty()
        || select.prewhere.is_some()
        || !select.cluster_by.is_empty()
        || !select.distribute_by.is_empty()
        || !select.sort_by.is_empty()
        || select.value_table_mode.is_some()
        || select.connect_by.is_some()
    {
        return Err(PolicyError::complicated("unsupported SELECT clause"));
    }

    if select.from.len() != 1 {
        return Err(PolicyError::complicated(
            "SELECT requires exactly one table in FROM",
        ));
    }
    let from = &select.from[0];
    if !from.joins.is_empty() {
        return Err(PolicyError::complicated("JOIN expressions are not supported"));
    }

    let mut tables = Tables::new(default_schema);
    register_table_factor(&mut tables, &from.relation)?;
    tables.finalize();

    let mut columns = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                collect_target(expr, &mut columns)?;
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                return Err(PolicyError::complicated(
                    "star expressions are not supported",
                ));
            }
        }
    }

    if let Some(selection) = &select.selection {
        collect_comparison(selection, &mut columns)?;
    }

    if let Some(order_by) = &query.order_by {
        if order_by.interpolate.is_some() {
            return Err(PolicyError::complicated(
                "ORDER BY interpolation is not supported",
            ));
        }
        match &order_by.kind {
            OrderByKind::Expressions(items) => {
                for item in items {
                    if item.with_fill.is_some() {
                        return Err(PolicyError::complicated("WITH FILL is not supported"));
                    }
                    columns.push(column_from_expr(&item.expr)?);
                }
            }
            OrderByKind::All(_) => {
                return Err(PolicyError::complicated("ORDER BY ALL is not supported"));
            }
        }
    }

    match &select.group_by {
        GroupByExpr::Expressions(exprs, modifiers) => {
            if !modifiers.is_empty() {
                return Err(PolicyError::complicated(
                    "GROUP BY modifiers are not supported",
                ));
            }
            for expr in exprs {
                columns.push(column_from_expr(expr)?);
            }
        }
        GroupByExpr::All(_) => {
            return Err(PolicyError::complicated("GROUP BY ALL is not supported"));
        }
    }

    group_by_table(Op::Select, &tables, columns)
}

/// One target-list entry: a column reference or a whitelisted function call
/// over column references.
fn collect_target(expr: &Expr, columns: &mut Vec<ColumnRef>) -> Result<(), PolicyError> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            columns.push(column_from_expr(expr)?);
            Ok(())
        }
        Expr::Function(function) => collect_function(function, columns),
        other => Err(PolicyError::complicated(format!(
            "unsupported select target: {other}"
        ))),
    }
}

fn collect_function(
    function: &Function,
    columns: &mut Vec<ColumnRef>,
) -> Result<(), PolicyError> {
    if function.over.is_some() {
        return Err(PolicyError::complicated("window functions are not supported"));
    }
    if function.filter.is_some() {
        return Err(PolicyError::complicated("FILTER clauses are not supported"));
    }
    if !function.within_group.is_empty() {
        return Err(PolicyError::complicated(
            "ordered-set aggregates are not supported",
        ));
    }
    if function.null_treatment.is_some() {
        return Err(PolicyError::complicated(
            "IGNORE/RESPECT NULLS is not supported",
        ));
    }
    if !matches!(function.parameters, FunctionArguments::None) {
        return Err(PolicyError::complicated(
            "parameterized function calls are not supported",
        ));
    }

    let name = match function.name.0.as_slice() {
        [part] => part
            .as_ident()
            .map(|ident| ident.value.to_ascii_lowercase())
            .ok_or_else(|| PolicyError::complicated("unsupported function name"))?,
        _ => {
            return Err(PolicyError::complicated(
                "qualified function names are not supported",
            ));
        }
    };
    if !ALLOWED_FUNCTIONS.contains(&name.as_str()) {
        return Err(PolicyError::complicated(format!(
            "function '{name}' is not allowed"
        )));
    }

    match &function.args {
        FunctionArguments::None => Ok(()),
        FunctionArguments::Subquery(_) => Err(PolicyError::complicated(
            "subqueries are not supported in function arguments",
        )),
        FunctionArguments::List(list) => {
            if list.duplicate_treatment.is_some() {
                return Err(PolicyError::complicated(
                    "DISTINCT aggregates are not supported",
                ));
            }
            if !list.clauses.is_empty() {
                return Err(PolicyError::complicated(
                    "function argument clauses are not supported",
                ));
            }
            for arg in &list.args {
                match arg {
                    FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => {
                        columns.push(column_from_expr(expr)?);
                    }
                    // count(*) touches no columns by itself.
                    FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => {}
                    FunctionArg::Unnamed(FunctionArgExpr::QualifiedWildcard(_)) => {
                        return Err(PolicyError::complicated(
                            "star expressions are not supported",
                        ));
                    }
                    _ => {
                        return Err(PolicyError::complicated(
                            "unsupported function argument",
                        ));
                    }
                }
            }
            Ok(())
        }
    }
}
