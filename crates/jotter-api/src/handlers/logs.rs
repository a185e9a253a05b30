//! AI audit log HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use jotter_core::{AiLog, AiLogRepository, CreateAiLogRequest};

use crate::{ApiError, AppState, RequireUser};

/// Live (not deleted) records, newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<AiLog>>, ApiError> {
    Ok(Json(state.db.ai_logs.list(user.id).await?))
}

pub async fn get_log(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AiLog>, ApiError> {
    Ok(Json(state.db.ai_logs.get(user.id, id).await?))
}

pub async fn create_log(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateAiLogRequest>,
) -> Result<(StatusCode, Json<AiLog>), ApiError> {
    let log = state.db.ai_logs.create(user.id, body).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn delete_log(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.ai_logs.soft_delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete every record of the caller.
pub async fn clear_logs(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.db.ai_logs.soft_delete_all(user.id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
