//! Domain models for jotter.
//!
//! Row types mirror the relational schema; request types are what the
//! repositories accept after the API layer validated user input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USERS
// =============================================================================

/// A registered account, including its password hash.
///
/// Never serialize this type to clients; use [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub phone: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client-facing view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            phone: u.phone,
            email: u.email,
            avatar: u.avatar,
            created_at: u.created_at,
        }
    }
}

/// Request for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
    pub phone: String,
    pub email: String,
}

// =============================================================================
// NOTES
// =============================================================================

/// A note with its category and tags resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating a note.
#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// Partial note update; `None` leaves the field untouched.
///
/// `category_id: Some(None)` detaches the note from its category.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category_id.is_none()
            && self.tag_ids.is_none()
    }
}

// =============================================================================
// TAGS & CATEGORIES
// =============================================================================

/// A user-owned label attached to notes (many-to-many).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-owned folder; a note belongs to at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// PROVIDER KEYS
// =============================================================================

/// A user's credential for a completion provider, with the key unsealed.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderKey {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub api_key: String,
    /// False when the stored value could not be unsealed (the server secret
    /// changed or the row is corrupt). `api_key` is empty then.
    #[serde(default = "readable_default")]
    pub readable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn readable_default() -> bool {
    true
}

impl std::fmt::Debug for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderKey")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &mask_secret(&self.api_key))
            .field("readable", &self.readable)
            .finish()
    }
}

impl ProviderKey {
    /// Copy of this key with the secret replaced by its masked form.
    pub fn masked(&self) -> Self {
        Self {
            api_key: mask_secret(&self.api_key),
            ..self.clone()
        }
    }
}

/// Mask a secret for display: first four and last four characters.
///
/// Secrets of eight characters or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Request for storing a provider key. The key is plaintext here and sealed
/// by the repository.
#[derive(Clone)]
pub struct CreateProviderKeyRequest {
    pub provider: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for CreateProviderKeyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateProviderKeyRequest")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

// =============================================================================
// AI LOGS
// =============================================================================

/// Outcome level of an AI processing audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiLogLevel {
    Info,
    Success,
    Error,
}

impl AiLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiLogLevel::Info => "info",
            AiLogLevel::Success => "success",
            AiLogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for AiLogLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(AiLogLevel::Info),
            "success" => Ok(AiLogLevel::Success),
            "error" => Ok(AiLogLevel::Error),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown log level: {other}"
            ))),
        }
    }
}

/// Request half of an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiLogRequest {
    pub text: String,
    pub model: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

/// Response half of an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiLogResponse {
    pub content: String,
    pub duration_ms: u64,
}

/// A persisted audit record of one AI processing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiLog {
    pub id: Uuid,
    pub level: AiLogLevel,
    pub request: Option<AiLogRequest>,
    pub response: Option<AiLogResponse>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request for writing an audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAiLogRequest {
    pub level: AiLogLevel,
    #[serde(default)]
    pub request: Option<AiLogRequest>,
    #[serde(default)]
    pub response: Option<AiLogResponse>,
    #[serde(default)]
    pub error: Option<String>,
}
