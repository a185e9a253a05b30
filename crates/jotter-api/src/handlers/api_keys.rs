//! Provider API key HTTP handlers.
//!
//! Keys are masked in every response except a single-key fetch.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{CreateProviderKeyRequest, ProviderKey, ProviderKeyRepository};
use jotter_inference::Provider;

use crate::{ApiError, AppState, RequireUser};

#[derive(Debug, Deserialize)]
pub struct CreateKeyBody {
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeyBody {
    pub api_key: String,
}

impl CreateKeyBody {
    /// Normalize the provider name and fill in its default model.
    fn into_request(self) -> Result<CreateProviderKeyRequest, ApiError> {
        let provider: Provider = self.provider.parse()?;
        let model = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());
        Ok(CreateProviderKeyRequest {
            provider: provider.as_str().to_string(),
            model,
            api_key: self.api_key,
        })
    }
}

pub async fn list_keys(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<ProviderKey>>, ApiError> {
    let keys = state.db.provider_keys.list(user.id).await?;
    Ok(Json(keys.iter().map(ProviderKey::masked).collect()))
}

pub async fn get_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderKey>, ApiError> {
    Ok(Json(state.db.provider_keys.get(user.id, id).await?))
}

/// Store a provider key.
///
/// # Returns
/// - 201 Created with the masked key
/// - 400 Bad Request for an unsupported provider or empty key
/// - 409 Conflict if a key for the same provider and model exists
pub async fn create_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateKeyBody>,
) -> Result<(StatusCode, Json<ProviderKey>), ApiError> {
    let key = state
        .db
        .provider_keys
        .create(user.id, body.into_request()?)
        .await?;
    Ok((StatusCode::CREATED, Json(key.masked())))
}

pub async fn update_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateKeyBody>,
) -> Result<Json<ProviderKey>, ApiError> {
    let key = state
        .db
        .provider_keys
        .update_key(user.id, id, &body.api_key)
        .await?;
    Ok(Json(key.masked()))
}

pub async fn delete_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.provider_keys.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
