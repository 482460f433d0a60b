//! Query history storage.
//!
//! Every successfully executed query is stored in the internal database so
//! results can be revisited at a stable URL.

use chrono::{DateTime, Utc};
use sqlgate_core::{TargetId, UserId};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::FacadeError;
use crate::query::QueryGrid;

/// One stored query execution.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub target_id: TargetId,
    pub query: String,
    pub response: QueryGrid,
    pub created_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(user_id: UserId, target_id: TargetId, query: String, response: QueryGrid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            target_id,
            query,
            response,
            created_at: Utc::now(),
        }
    }
}

/// Create the history table when it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), FacadeError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queries (
            id         uuid PRIMARY KEY,
            user_id    text NOT NULL,
            target_id  text NOT NULL,
            query      text NOT NULL,
            response   jsonb NOT NULL,
            created_at timestamptz NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist one execution. A duplicate id surfaces as an integrity
/// violation instead of a generic database error.
pub async fn insert(pool: &PgPool, record: &QueryRecord) -> Result<(), FacadeError> {
    let result = sqlx::query(
        r#"
        INSERT INTO queries (id, user_id, target_id, query, response, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.id)
    .bind(record.user_id.as_str())
    .bind(record.target_id.as_str())
    .bind(&record.query)
    .bind(Json(&record.response))
    .bind(record.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            if let Some(db_err) = err.as_database_error() {
                if db_err.is_unique_violation() {
                    return Err(FacadeError::Integrity(format!(
                        "duplicate query record {}",
                        record.id
                    )));
                }
            }
            Err(FacadeError::Database(err))
        }
    }
}

/// Fetch one stored execution for a target.
pub async fn fetch(
    pool: &PgPool,
    target_id: &TargetId,
    id: Uuid,
) -> Result<Option<QueryRecord>, FacadeError> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, target_id, query, response, created_at
        FROM queries
        WHERE id = $1 AND target_id = $2
        "#,
    )
    .bind(id)
    .bind(target_id.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let response: Json<QueryGrid> = row.try_get("response")?;
    Ok(Some(QueryRecord {
        id: row.try_get("id")?,
        user_id: UserId::new(row.try_get::<String, _>("user_id")?),
        target_id: TargetId::new(row.try_get::<String, _>("target_id")?),
        query: row.try_get("query")?,
        response: response.0,
        created_at: row.try_get("created_at")?,
    }))
}
