//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{defaults::NAME_MAX_LEN, new_v7, Error, Result, Tag, TagRepository};

/// Validate and normalize a tag or category name.
///
/// Rules:
/// - Surrounding whitespace is trimmed
/// - Length between 1 and [`NAME_MAX_LEN`] characters after trimming
/// - No control characters
///
/// Returns the trimmed name.
pub fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{kind} name cannot be empty")));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "{kind} name must be {NAME_MAX_LEN} characters or less"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(Error::InvalidInput(format!(
            "{kind} name contains control characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM tag
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Tag> {
        sqlx::query(
            "SELECT id, name, created_at, updated_at FROM tag WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .as_ref()
        .map(tag_from_row)
        .ok_or_else(|| Error::NotFound(format!("tag {id}")))
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag> {
        let name = validate_name("Tag", name)?;
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO tag (id, user_id, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(&name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(tag_from_row(&row))
    }

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Tag> {
        let name = validate_name("Tag", name)?;

        sqlx::query(
            "UPDATE tag SET name = $3, updated_at = $4
             WHERE id = $1 AND user_id = $2
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(&name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .as_ref()
        .map(tag_from_row)
        .ok_or_else(|| Error::NotFound(format!("tag {id}")))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let unlinked = sqlx::query(
            "DELETE FROM note_tag WHERE tag_id = $1
               AND EXISTS (SELECT 1 FROM tag WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM tag WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("tag {id}")));
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tags",
            op = "delete",
            tag_id = %id,
            unlinked,
            "Tag deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("Tag", "  rust  ").unwrap(), "rust");
    }

    #[test]
    fn test_validate_name_empty() {
        let err = validate_name("Tag", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Tag name cannot be empty");
    }

    #[test]
    fn test_validate_name_length_counts_chars() {
        let fifty_cjk = "字".repeat(NAME_MAX_LEN);
        assert!(validate_name("Category", &fifty_cjk).is_ok());
        let too_long = "a".repeat(NAME_MAX_LEN + 1);
        assert!(validate_name("Category", &too_long).is_err());
    }

    #[test]
    fn test_validate_name_rejects_control_chars() {
        assert!(validate_name("Tag", "bad\u{0007}name").is_err());
        assert!(validate_name("Tag", "with space").is_ok());
    }
}
