//! Note HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use jotter_core::{CreateNoteRequest, Note, NoteRepository, UpdateNoteRequest};

use crate::{ApiError, AppState, RequireUser};

#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Partial update. An explicit `"category_id": null` clears the category,
/// an absent field leaves it alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<CreateNoteBody> for CreateNoteRequest {
    fn from(body: CreateNoteBody) -> Self {
        Self {
            title: body.title,
            content: body.content,
            category_id: body.category_id,
            tag_ids: body.tag_ids,
        }
    }
}

impl From<UpdateNoteBody> for UpdateNoteRequest {
    fn from(body: UpdateNoteBody) -> Self {
        Self {
            title: body.title,
            content: body.content,
            category_id: body.category_id,
            tag_ids: body.tag_ids,
        }
    }
}

/// List the caller's notes, most recently updated first.
pub async fn list_notes(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list(user.id).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.notes.get(user.id, id).await?))
}

/// Create a note.
///
/// # Returns
/// - 201 Created with the note, its category and tags
/// - 400 Bad Request if the title is too long or a category/tag id is not the caller's
pub async fn create_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateNoteBody>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.db.notes.create(user.id, body.into()).await?;
    tracing::debug!(subsystem = "api", op = "create_note", note_id = %note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<Json<Note>, ApiError> {
    let req: UpdateNoteRequest = body.into();
    if req.is_empty() {
        return Ok(Json(state.db.notes.get(user.id, id).await?));
    }
    Ok(Json(state.db.notes.update(user.id, id, req).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.notes.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
