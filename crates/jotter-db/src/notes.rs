//! Note repository implementation.
//!
//! Notes are returned with their category and tags resolved. Tags are loaded
//! in one batched query per listing, keyed by note id.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgConnection, Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use jotter_core::{
    defaults::TITLE_MAX_LEN, new_v7, Category, CreateNoteRequest, Error, Note, NoteRepository,
    Result, Tag, UpdateNoteRequest,
};

use crate::tags::tag_from_row;

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.title, n.content, n.created_at, n.updated_at,
           c.id AS category_id, c.name AS category_name,
           c.created_at AS category_created_at, c.updated_at AS category_updated_at
    FROM note n
    LEFT JOIN category c ON c.id = n.category_id
"#;

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Tags of the given notes, grouped by note id and ordered by name.
    async fn load_tags(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Tag>>> {
        if note_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT nt.note_id, t.id, t.name, t.created_at, t.updated_at
            FROM note_tag nt
            JOIN tag t ON t.id = nt.tag_id
            WHERE nt.note_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_note: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in &rows {
            by_note
                .entry(row.get("note_id"))
                .or_default()
                .push(tag_from_row(row));
        }
        Ok(by_note)
    }
}

fn note_from_row(row: &PgRow, tags: Vec<Tag>) -> Note {
    let category = row
        .get::<Option<Uuid>, _>("category_id")
        .map(|id| Category {
            id,
            name: row.get("category_name"),
            created_at: row.get("category_created_at"),
            updated_at: row.get("category_updated_at"),
        });

    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category,
        tags,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Title must be {TITLE_MAX_LEN} characters or less"
        )));
    }
    Ok(())
}

/// Deduplicate tag ids, keeping first-seen order.
fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn ensure_category_owned(
    conn: &mut PgConnection,
    user_id: Uuid,
    category_id: Uuid,
) -> Result<()> {
    let found = sqlx::query("SELECT 1 FROM category WHERE id = $1 AND user_id = $2")
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::Database)?;
    if found.is_none() {
        return Err(Error::InvalidInput(format!(
            "category {category_id} does not exist"
        )));
    }
    Ok(())
}

async fn ensure_tags_owned(conn: &mut PgConnection, user_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let row = sqlx::query("SELECT COUNT(*) AS n FROM tag WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(tag_ids)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::Database)?;
    let owned: i64 = row.get("n");
    if owned != tag_ids.len() as i64 {
        return Err(Error::InvalidInput(
            "one or more tags do not exist".to_string(),
        ));
    }
    Ok(())
}

async fn link_tags(conn: &mut PgConnection, note_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO note_tag (note_id, tag_id)
         SELECT $1, UNNEST($2::uuid[])
         ON CONFLICT DO NOTHING",
    )
    .bind(note_id)
    .bind(tag_ids)
    .execute(&mut *conn)
    .await
    .map_err(Error::Database)?;
    Ok(())
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "{NOTE_SELECT} WHERE n.user_id = $1 ORDER BY n.updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
        let mut tags = self.load_tags(&ids).await?;

        let notes: Vec<Note> = rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                note_from_row(row, tags.remove(&id).unwrap_or_default())
            })
            .collect();

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            user_id = %user_id,
            result_count = notes.len(),
            "Listed notes"
        );
        Ok(notes)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            "{NOTE_SELECT} WHERE n.id = $1 AND n.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("note {id}")))?;

        let mut tags = self.load_tags(&[id]).await?;
        Ok(note_from_row(&row, tags.remove(&id).unwrap_or_default()))
    }

    async fn create(&self, user_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        validate_title(&req.title)?;
        let tag_ids = dedup_ids(&req.tag_ids);
        let id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if let Some(category_id) = req.category_id {
            ensure_category_owned(&mut tx, user_id, category_id).await?;
        }
        ensure_tags_owned(&mut tx, user_id, &tag_ids).await?;

        sqlx::query(
            "INSERT INTO note (id, user_id, title, content, category_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.category_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        link_tags(&mut tx, id, &tag_ids).await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "create",
            note_id = %id,
            tag_count = tag_ids.len(),
            "Note created"
        );
        self.get(user_id, id).await
    }

    async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        if let Some(title) = &req.title {
            validate_title(title)?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if let Some(Some(category_id)) = req.category_id {
            ensure_category_owned(&mut tx, user_id, category_id).await?;
        }

        let updated = sqlx::query(
            "UPDATE note SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                category_id = CASE WHEN $5::boolean THEN $6::uuid ELSE category_id END,
                updated_at = $7
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(req.title.as_deref())
        .bind(req.content.as_deref())
        .bind(req.category_id.is_some())
        .bind(req.category_id.flatten())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if updated == 0 {
            return Err(Error::NotFound(format!("note {id}")));
        }

        if let Some(tag_ids) = &req.tag_ids {
            let tag_ids = dedup_ids(tag_ids);
            ensure_tags_owned(&mut tx, user_id, &tag_ids).await?;
            sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            link_tags(&mut tx, id, &tag_ids).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        self.get(user_id, id).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "DELETE FROM note_tag WHERE note_id = $1
               AND EXISTS (SELECT 1 FROM note WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let deleted = sqlx::query("DELETE FROM note WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("note {id}")));
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            "Note deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ids_keeps_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_eq!(dedup_ids(&[b, a, b, a]), vec![b, a]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("").is_ok());
        assert!(validate_title(&"t".repeat(TITLE_MAX_LEN)).is_ok());
        assert!(validate_title(&"t".repeat(TITLE_MAX_LEN + 1)).is_err());
    }
}
