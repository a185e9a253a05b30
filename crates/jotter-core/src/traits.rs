//! Repository traits for jotter.
//!
//! Every method takes the owning `user_id`; rows owned by another user are
//! reported as not found.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Duplicate phone or email yields `Error::Conflict`.
    async fn create(&self, req: CreateUserRequest) -> Result<User>;

    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_by_phone(&self, phone: &str) -> Result<Option<User>>;

    /// Whether a user with this phone or email already exists.
    async fn exists(&self, phone: &str, email: &str) -> Result<bool>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes of a user, most recently updated first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Note>;

    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG & CATEGORY REPOSITORIES
// =============================================================================

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Tag>;

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag>;

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Tag>;

    /// Delete a tag and unlink it from every note.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Category>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Category>;

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Category>;

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Category>;

    /// Delete a category. Notes in it become uncategorized.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// PROVIDER KEY REPOSITORY
// =============================================================================

#[async_trait]
pub trait ProviderKeyRepository: Send + Sync {
    /// All keys of a user ordered by provider, then model. Keys that cannot
    /// be unsealed are included with `readable == false`.
    async fn list(&self, user_id: Uuid) -> Result<Vec<ProviderKey>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ProviderKey>;

    /// The key used for AI processing: the first readable key in list order.
    async fn primary(&self, user_id: Uuid) -> Result<Option<ProviderKey>>;

    /// Store a key. An existing (provider, model) pair yields `Error::Conflict`.
    async fn create(&self, user_id: Uuid, req: CreateProviderKeyRequest) -> Result<ProviderKey>;

    async fn update_key(&self, user_id: Uuid, id: Uuid, api_key: &str) -> Result<ProviderKey>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;
}

// =============================================================================
// AI LOG REPOSITORY
// =============================================================================

#[async_trait]
pub trait AiLogRepository: Send + Sync {
    /// Records not soft-deleted, newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<AiLog>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<AiLog>;

    async fn create(&self, user_id: Uuid, req: CreateAiLogRequest) -> Result<AiLog>;

    async fn soft_delete(&self, user_id: Uuid, id: Uuid) -> Result<()>;

    /// Soft-delete every record of the user, returning how many were affected.
    async fn soft_delete_all(&self, user_id: Uuid) -> Result<u64>;
}
