//! Query execution against target databases.
//!
//! Statements reach this module only after the policy kernel approved them.
//! Results are folded into a header/rows grid of JSON values so they can be
//! rendered as HTML, exported as JSON, and stored in history unchanged.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row};

use crate::error::FacadeError;

/// A tabular query result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Execute an approved statement and collect its result grid. Statements
/// without a result set (e.g. UPDATE without RETURNING) yield an empty
/// grid.
pub async fn run(pool: &PgPool, query: &str) -> Result<QueryGrid, FacadeError> {
    let rows = sqlx::query(query).fetch_all(pool).await?;

    let mut grid = QueryGrid::default();
    let Some(first) = rows.first() else {
        return Ok(grid);
    };

    grid.headers = first
        .columns()
        .iter()
        .map(|column| column.name().to_owned())
        .collect();

    for row in &rows {
        let mut values = Vec::with_capacity(grid.headers.len());
        for index in 0..grid.headers.len() {
            values.push(decode_value(row, index));
        }
        grid.rows.push(values);
    }

    Ok(grid)
}

/// Decode one cell into JSON. Postgres types are tried from most to least
/// specific; anything undecodable renders as null.
fn decode_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<BigDecimal>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.to_rfc3339()));
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.format("%Y-%m-%dT%H:%M:%S").to_string()));
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.format("%Y-%m-%d").to_string()));
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.format("%H:%M:%S").to_string()));
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, |v| json!(v));
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(index) {
        return v.unwrap_or(Value::Null);
    }

    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_serialization_is_stable() {
        let grid = QueryGrid {
            headers: vec!["id".into(), "name".into()],
            rows: vec![vec![json!(1), json!("a")], vec![json!(2), Value::Null]],
        };
        let raw = serde_json::to_string(&grid).unwrap();
        let back: QueryGrid = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.headers, grid.headers);
        assert_eq!(back.rows, grid.rows);
    }
}
