//! Category repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{new_v7, Category, CategoryRepository, Error, Result};

use crate::tags::validate_name;

fn category_from_row(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of CategoryRepository.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM category
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Category> {
        sqlx::query(
            "SELECT id, name, created_at, updated_at FROM category
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .as_ref()
        .map(category_from_row)
        .ok_or_else(|| Error::NotFound(format!("category {id}")))
    }

    async fn create(&self, user_id: Uuid, name: &str) -> Result<Category> {
        let name = validate_name("Category", name)?;

        let row = sqlx::query(
            "INSERT INTO category (id, user_id, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(&name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(category_from_row(&row))
    }

    async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Category> {
        let name = validate_name("Category", name)?;

        sqlx::query(
            "UPDATE category SET name = $3, updated_at = $4
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
        .map(category_from_row)
        .ok_or_else(|| Error::NotFound(format!("category {id}")))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Notes survive their category.
        let detached = sqlx::query(
            "UPDATE note SET category_id = NULL
             WHERE category_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM category WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound(format!("category {id}")));
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "categories",
            op = "delete",
            category_id = %id,
            detached,
            "Category deleted"
        );
        Ok(())
    }
}
