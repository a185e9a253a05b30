//! Registration, login and the current user.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use jotter_core::{defaults::PASSWORD_MIN_LEN, CreateUserRequest, PublicUser, User, UserRepository};

use crate::{ApiError, AppState, RequireUser};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

const INVALID_LOGIN: &str = "invalid phone or password";

impl RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::BadRequest("username is required".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(ApiError::BadRequest("phone is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest("a valid email is required".to_string()));
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ApiError::BadRequest(format!(
                "password must be at least {} characters",
                PASSWORD_MIN_LEN
            )));
        }
        Ok(())
    }
}

fn issue(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue(&user.id.to_string())?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Hashing is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || jotter_crypto::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(jotter_core::Error::Internal(e.to_string())))?
        .map_err(ApiError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || jotter_crypto::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(jotter_core::Error::Internal(e.to_string())))?
        .map_err(ApiError::from)
}

/// Create an account and sign it in.
///
/// # Returns
/// - 201 Created with `{token, user}`
/// - 400 Bad Request on invalid fields or a phone/email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let phone = body.phone.trim().to_string();
    let email = body.email.trim().to_lowercase();
    if state.db.users.exists(&phone, &email).await? {
        return Err(ApiError::BadRequest(
            "phone or email already registered".to_string(),
        ));
    }

    let password_hash = hash_blocking(body.password).await?;
    let user = state
        .db
        .users
        .create(CreateUserRequest {
            username: body.username.trim().to_string(),
            password_hash,
            phone,
            email,
        })
        .await
        .map_err(|e| match e {
            jotter_core::Error::Conflict(_) => {
                ApiError::BadRequest("phone or email already registered".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(
        subsystem = "api",
        component = "auth",
        op = "register",
        user_id = %user.id,
        "User registered"
    );

    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

/// Sign in with phone and password.
///
/// Unknown phone and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .db
        .users
        .get_by_phone(body.phone.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_LOGIN.to_string()))?;

    if !verify_blocking(body.password, user.password_hash.clone()).await? {
        tracing::debug!(
            subsystem = "api",
            component = "auth",
            op = "login",
            user_id = %user.id,
            "Password mismatch"
        );
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_string()));
    }

    Ok(Json(issue(&state, user)?))
}

pub async fn me(RequireUser(user): RequireUser) -> Json<PublicUser> {
    Json(user.into())
}
