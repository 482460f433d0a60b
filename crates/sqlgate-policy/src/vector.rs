//! Access vectors: the canonical description of what a statement touches.

use std::collections::BTreeMap;
use std::fmt;

use sqlgate_core::Op;

use crate::column::ColumnRef;
use crate::error::PolicyError;
use crate::tables::Tables;

/// One `(operation, table, columns)` triple touched by a statement.
///
/// The table is always fully qualified and the column list is deduplicated
/// and sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessVector {
    pub op: Op,
    pub table: String,
    pub columns: Vec<String>,
}

impl AccessVector {
    pub(crate) fn new(op: Op, table: String, mut columns: Vec<String>) -> Self {
        columns.sort();
        columns.dedup();
        Self { op, table, columns }
    }
}

impl fmt::Display for AccessVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.op, self.table, self.columns.join(", "))
    }
}

/// Resolve every collected column to its owning table and fold the result
/// into one vector per table. Tables registered for the statement appear
/// even when no column referenced them, so constructions like
/// `INSERT … DEFAULT VALUES` still produce a vector to authorise.
pub(crate) fn group_by_table(
    op: Op,
    tables: &Tables,
    columns: Vec<ColumnRef>,
) -> Result<Vec<AccessVector>, PolicyError> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for table in tables.all() {
        grouped.entry(table).or_default();
    }

    for column in columns {
        let qualifier = column.qualifier();
        let Some(table) = tables.get(&qualifier) else {
            return Err(PolicyError::bad_query(format!(
                "column '{}' references unknown table or alias '{qualifier}'",
                column.name()
            )));
        };
        grouped.entry(table).or_default().push(column.into_name());
    }

    Ok(grouped
        .into_iter()
        .map(|(table, columns)| AccessVector::new(op, table, columns))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_sorted_and_unique() {
        let vector = AccessVector::new(
            Op::Select,
            "public.clients".into(),
            vec!["name".into(), "id".into(), "name".into()],
        );
        assert_eq!(vector.columns, vec!["id", "name"]);
        assert_eq!(vector.to_string(), "select public.clients (id, name)");
    }
}
