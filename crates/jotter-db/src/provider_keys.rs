//! Provider API key repository.
//!
//! Keys are sealed with [`SecretBox`] before they reach the database and
//! opened on the way out; plaintext never touches a column.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{info, warn};
use uuid::Uuid;

use jotter_core::{
    new_v7, CreateProviderKeyRequest, Error, ProviderKey, ProviderKeyRepository, Result,
};
use jotter_crypto::SecretBox;

use crate::conflict_or_db;

const KEY_COLUMNS: &str = "id, provider, model, sealed_key, created_at, updated_at";

/// PostgreSQL implementation of ProviderKeyRepository.
#[derive(Clone)]
pub struct PgProviderKeyRepository {
    pool: Pool<Postgres>,
    secrets: SecretBox,
}

impl PgProviderKeyRepository {
    pub fn new(pool: Pool<Postgres>, secrets: SecretBox) -> Self {
        Self { pool, secrets }
    }

    /// An unsealable row comes back with `readable == false` so the owner
    /// can still see and replace it.
    fn from_row(&self, row: &PgRow) -> ProviderKey {
        let id: Uuid = row.get("id");
        let sealed: String = row.get("sealed_key");
        let (api_key, readable) = match self.secrets.open(&sealed) {
            Ok(key) => (key, true),
            Err(e) => {
                warn!(
                    subsystem = "db",
                    component = "provider_keys",
                    op = "open",
                    key_id = %id,
                    error = %e,
                    "Stored provider key cannot be opened"
                );
                (String::new(), false)
            }
        };

        ProviderKey {
            id,
            provider: row.get("provider"),
            model: row.get("model"),
            api_key,
            readable,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn seal(&self, api_key: &str) -> Result<String> {
        self.secrets
            .seal(api_key)
            .map_err(|e| Error::Crypto(e.to_string()))
    }
}

fn validate_key_fields(provider: &str, model: &str, api_key: &str) -> Result<()> {
    if provider.trim().is_empty() {
        return Err(Error::InvalidInput("provider is required".into()));
    }
    if model.trim().is_empty() {
        return Err(Error::InvalidInput("model is required".into()));
    }
    if api_key.trim().is_empty() {
        return Err(Error::InvalidInput("api_key is required".into()));
    }
    Ok(())
}

#[async_trait]
impl ProviderKeyRepository for PgProviderKeyRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<ProviderKey>> {
        let rows = sqlx::query(&format!(
            "SELECT {KEY_COLUMNS} FROM provider_key
             WHERE user_id = $1
             ORDER BY provider, model"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(|row| self.from_row(row)).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ProviderKey> {
        let row = sqlx::query(&format!(
            "SELECT {KEY_COLUMNS} FROM provider_key WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("api key {id}")))?;

        Ok(self.from_row(&row))
    }

    async fn primary(&self, user_id: Uuid) -> Result<Option<ProviderKey>> {
        let rows = sqlx::query(&format!(
            "SELECT {KEY_COLUMNS} FROM provider_key
             WHERE user_id = $1
             ORDER BY provider, model"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| self.from_row(row))
            .find(|key| key.readable))
    }

    async fn create(&self, user_id: Uuid, req: CreateProviderKeyRequest) -> Result<ProviderKey> {
        let provider = req.provider.trim().to_lowercase();
        let model = req.model.trim().to_string();
        validate_key_fields(&provider, &model, &req.api_key)?;
        let sealed = self.seal(req.api_key.trim())?;
        let id = new_v7();

        let row = sqlx::query(&format!(
            "INSERT INTO provider_key (id, user_id, provider, model, sealed_key, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {KEY_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&provider)
        .bind(&model)
        .bind(&sealed)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "an API key for this provider and model already exists"))?;

        info!(
            subsystem = "db",
            component = "provider_keys",
            op = "create",
            key_id = %id,
            provider = %provider,
            model = %model,
            "Provider key stored"
        );
        Ok(self.from_row(&row))
    }

    async fn update_key(&self, user_id: Uuid, id: Uuid, api_key: &str) -> Result<ProviderKey> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidInput("api_key is required".into()));
        }
        let sealed = self.seal(api_key.trim())?;

        let row = sqlx::query(&format!(
            "UPDATE provider_key SET sealed_key = $3, updated_at = $4
             WHERE id = $1 AND user_id = $2
             RETURNING {KEY_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&sealed)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("api key {id}")))?;

        Ok(self.from_row(&row))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM provider_key WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("api key {id}")));
        }
        Ok(())
    }
}
