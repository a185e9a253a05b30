//! AI processing audit log repository.
//!
//! Deletion is soft: rows get `deleted_at` and drop out of listings.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, types::Json, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    new_v7, AiLog, AiLogRepository, AiLogRequest, AiLogResponse, CreateAiLogRequest, Error,
    Result,
};

const LOG_COLUMNS: &str = "id, level, request, response, error, created_at";

fn log_from_row(row: &PgRow) -> Result<AiLog> {
    let level: String = row.get("level");
    Ok(AiLog {
        id: row.get("id"),
        level: level.parse()?,
        request: row
            .get::<Option<Json<AiLogRequest>>, _>("request")
            .map(|j| j.0),
        response: row
            .get::<Option<Json<AiLogResponse>>, _>("response")
            .map(|j| j.0),
        error: row.get("error"),
        created_at: row.get("created_at"),
    })
}

/// PostgreSQL implementation of AiLogRepository.
#[derive(Clone)]
pub struct PgAiLogRepository {
    pool: Pool<Postgres>,
}

impl PgAiLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AiLogRepository for PgAiLogRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<AiLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM ai_log
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(log_from_row).collect()
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<AiLog> {
        let row = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM ai_log
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("log {id}")))?;

        log_from_row(&row)
    }

    async fn create(&self, user_id: Uuid, req: CreateAiLogRequest) -> Result<AiLog> {
        let row = sqlx::query(&format!(
            "INSERT INTO ai_log (id, user_id, level, request, response, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {LOG_COLUMNS}"
        ))
        .bind(new_v7())
        .bind(user_id)
        .bind(req.level.as_str())
        .bind(req.request.map(Json))
        .bind(req.response.map(Json))
        .bind(req.error)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        log_from_row(&row)
    }

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE ai_log SET deleted_at = $3
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("log {id}")));
        }
        Ok(())
    }

    async fn soft_delete_all(&self, user_id: Uuid) -> Result<u64> {
        let affected = sqlx::query(
            "UPDATE ai_log SET deleted_at = $2
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        debug!(
            subsystem = "db",
            component = "ai_logs",
            op = "soft_delete_all",
            user_id = %user_id,
            result_count = affected,
            "Cleared AI logs"
        );
        Ok(affected)
    }
}
