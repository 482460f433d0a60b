//! Shared expression walking.
//!
//! The collectors here implement the safety property of the kernel: a node
//! shape that is not positively recognised is refused, never skipped. New
//! parser constructs therefore fail closed.

use sqlparser::ast::{
    AssignmentTarget, BinaryOperator, Expr, SelectItem, UnaryOperator,
};

use crate::column::ColumnRef;
use crate::error::PolicyError;

/// Comparison and arithmetic operators permitted in filters and SET value
/// expressions.
pub(crate) fn operator_supported(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Plus
            | BinaryOperator::Minus
            | BinaryOperator::Multiply
            | BinaryOperator::StringConcat
    )
}

/// Literal values, optionally signed or parenthesised.
pub(crate) fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Value(_) => true,
        Expr::UnaryOp {
            op: UnaryOperator::Plus | UnaryOperator::Minus,
            expr,
        } => is_constant(expr),
        Expr::Nested(inner) => is_constant(inner),
        _ => false,
    }
}

/// A bare `DEFAULT` marker. The parser surfaces it as an unquoted
/// identifier in value position.
pub(crate) fn is_default_marker(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Identifier(ident)
            if ident.quote_style.is_none() && ident.value.eq_ignore_ascii_case("default")
    )
}

/// Extract a column reference from an identifier expression.
pub(crate) fn column_from_expr(expr: &Expr) -> Result<ColumnRef, PolicyError> {
    match expr {
        Expr::Identifier(ident) => Ok(ColumnRef::bare(ident.value.clone())),
        Expr::CompoundIdentifier(idents) => {
            ColumnRef::from_tokens(idents.iter().map(|i| i.value.clone()).collect())
        }
        other => Err(PolicyError::complicated(format!(
            "expected a column reference, found: {other}"
        ))),
    }
}

/// Collect columns from a single comparison: a whitelisted binary operator,
/// LIKE/ILIKE, BETWEEN, an IN list of constants, or a null test.
pub(crate) fn collect_comparison(
    expr: &Expr,
    columns: &mut Vec<ColumnRef>,
) -> Result<(), PolicyError> {
    match expr {
        Expr::BinaryOp { left, op, right } => {
            if !operator_supported(op) {
                return Err(PolicyError::complicated(format!(
                    "operator '{op}' is not supported in filters"
                )));
            }
            collect_operand(left, columns)?;
            collect_operand(right, columns)
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            collect_operand(expr, columns)?;
            collect_operand(pattern, columns)
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_operand(expr, columns)?;
            collect_operand(low, columns)?;
            collect_operand(high, columns)
        }
        Expr::InList { expr, list, .. } => {
            collect_operand(expr, columns)?;
            for item in list {
                if !is_constant(item) {
                    return Err(PolicyError::complicated(
                        "IN lists may contain only constants",
                    ));
                }
            }
            Ok(())
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => collect_operand(inner, columns),
        Expr::Nested(inner) => collect_comparison(inner, columns),
        Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => Err(
            PolicyError::complicated("subqueries are not supported in filters"),
        ),
        other => Err(PolicyError::complicated(format!(
            "unsupported filter expression: {other}"
        ))),
    }
}

/// One side of a comparison: a column reference, a constant, or a nested
/// comparison (arithmetic over columns).
fn collect_operand(expr: &Expr, columns: &mut Vec<ColumnRef>) -> Result<(), PolicyError> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            columns.push(column_from_expr(expr)?);
            Ok(())
        }
        Expr::BinaryOp { .. } => collect_comparison(expr, columns),
        Expr::Nested(inner) => collect_operand(inner, columns),
        Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => Err(
            PolicyError::complicated("subqueries are not supported in filters"),
        ),
        other if is_constant(other) => Ok(()),
        other => Err(PolicyError::complicated(format!(
            "unsupported operand: {other}"
        ))),
    }
}

/// Collect columns from a boolean filter tree: AND/OR/NOT over comparisons.
/// Used by the UPDATE and DELETE handlers; SELECT filters stay at the
/// single-comparison level.
pub(crate) fn collect_condition(
    expr: &Expr,
    columns: &mut Vec<ColumnRef>,
) -> Result<(), PolicyError> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => {
            collect_condition(left, columns)?;
            collect_condition(right, columns)
        }
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr,
        } => collect_condition(expr, columns),
        Expr::Nested(inner) => collect_condition(inner, columns),
        _ => collect_comparison(expr, columns),
    }
}

/// Collect columns from a SET value expression: constants, `DEFAULT`,
/// column references, or whitelisted operator expressions over them.
pub(crate) fn collect_set_value(
    expr: &Expr,
    columns: &mut Vec<ColumnRef>,
) -> Result<(), PolicyError> {
    match expr {
        Expr::Identifier(_) if is_default_marker(expr) => Ok(()),
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            columns.push(column_from_expr(expr)?);
            Ok(())
        }
        Expr::BinaryOp { .. } => collect_comparison(expr, columns),
        Expr::Nested(inner) => collect_set_value(inner, columns),
        other if is_constant(other) => Ok(()),
        other => Err(PolicyError::complicated(format!(
            "unsupported SET value: {other}"
        ))),
    }
}

/// The bare column named by a SET assignment target.
pub(crate) fn set_target_column(
    target: &AssignmentTarget,
    table: &str,
) -> Result<ColumnRef, PolicyError> {
    match target {
        AssignmentTarget::ColumnName(name) => match name.0.as_slice() {
            [part] => part
                .as_ident()
                .map(|ident| ColumnRef::for_table(table, ident.value.clone()))
                .ok_or_else(|| PolicyError::complicated("unsupported SET target")),
            _ => Err(PolicyError::complicated(
                "qualified SET targets are not supported",
            )),
        },
        AssignmentTarget::Tuple(_) => Err(PolicyError::complicated(
            "tuple SET targets are not supported",
        )),
    }
}

/// Collect the columns of a RETURNING list. Star expressions are refused.
pub(crate) fn returning_columns(items: &[SelectItem]) -> Result<Vec<ColumnRef>, PolicyError> {
    let mut columns = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                columns.push(column_from_expr(expr)?);
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                return Err(PolicyError::complicated(
                    "star expressions are not supported in RETURNING",
                ));
            }
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    fn parse_expr(raw: &str) -> Expr {
        let sql = format!("SELECT 1 FROM t WHERE {raw}");
        let statements = Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
        match statements.into_iter().next().unwrap() {
            sqlparser::ast::Statement::Query(query) => match *query.body {
                sqlparser::ast::SetExpr::Select(select) => select.selection.unwrap(),
                _ => panic!("expected select"),
            },
            _ => panic!("expected query"),
        }
    }

    fn names(columns: Vec<ColumnRef>) -> Vec<String> {
        columns.into_iter().map(ColumnRef::into_name).collect()
    }

    #[test]
    fn comparison_collects_both_sides() {
        let mut columns = Vec::new();
        collect_comparison(&parse_expr("a = b"), &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a", "b"]);
    }

    #[test]
    fn arithmetic_nests() {
        let mut columns = Vec::new();
        collect_comparison(&parse_expr("a + 1 > b * 2"), &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a", "b"]);
    }

    #[test]
    fn unsupported_operator_is_refused() {
        let mut columns = Vec::new();
        let err = collect_comparison(&parse_expr("a % 2 = 0"), &mut columns).unwrap_err();
        assert_eq!(err.kind(), crate::PolicyErrorKind::ComplicatedQuery);
    }

    #[test]
    fn in_list_of_constants_is_allowed() {
        let mut columns = Vec::new();
        collect_comparison(&parse_expr("a IN (1, 2, 3)"), &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a"]);
    }

    #[test]
    fn in_list_with_column_is_refused() {
        let mut columns = Vec::new();
        assert!(collect_comparison(&parse_expr("a IN (b, 2)"), &mut columns).is_err());
    }

    #[test]
    fn in_subquery_is_refused() {
        let mut columns = Vec::new();
        assert!(
            collect_comparison(&parse_expr("a IN (SELECT a FROM t2)"), &mut columns).is_err()
        );
    }

    #[test]
    fn boolean_tree_is_condition_only() {
        let expr = parse_expr("a = 1 AND (b > 2 OR NOT c = 3)");
        let mut columns = Vec::new();
        assert!(collect_comparison(&expr, &mut columns).is_err());

        columns.clear();
        collect_condition(&expr, &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a", "b", "c"]);
    }

    #[test]
    fn null_test_collects_its_column() {
        let mut columns = Vec::new();
        collect_condition(&parse_expr("a IS NOT NULL"), &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a"]);
    }

    #[test]
    fn like_pattern_must_be_constant_or_column() {
        let mut columns = Vec::new();
        collect_comparison(&parse_expr("a LIKE 'prefix%'"), &mut columns).unwrap();
        assert_eq!(names(columns), vec!["a"]);
    }
}
