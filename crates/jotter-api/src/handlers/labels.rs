//! Tag and category HTTP handlers.
//!
//! Both are flat, user-owned name lists with the same shape.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{Category, CategoryRepository, Tag, TagRepository};

use crate::{ApiError, AppState, RequireUser};

#[derive(Debug, Deserialize)]
pub struct NameBody {
    pub name: String,
}

// =============================================================================
// TAGS
// =============================================================================

pub async fn list_tags(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list(user.id).await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.db.tags.get(user.id, id).await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<NameBody>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.db.tags.create(user.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn rename_tag(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NameBody>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.db.tags.rename(user.id, id, &body.name).await?))
}

/// Delete a tag; notes that carried it keep existing without it.
pub async fn delete_tag(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.tags.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// CATEGORIES
// =============================================================================

pub async fn list_categories(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.categories.list(user.id).await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.db.categories.get(user.id, id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<NameBody>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.db.categories.create(user.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn rename_category(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NameBody>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(
        state.db.categories.rename(user.id, id, &body.name).await?,
    ))
}

/// Delete a category; its notes become uncategorized.
pub async fn delete_category(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.categories.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
