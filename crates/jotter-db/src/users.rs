//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use jotter_core::{new_v7, CreateUserRequest, Error, Result, User, UserRepository};

use crate::conflict_or_db;

const USER_COLUMNS: &str =
    "id, username, password_hash, phone, email, avatar, created_at, updated_at";

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        phone: row.get("phone"),
        email: row.get("email"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, req: CreateUserRequest) -> Result<User> {
        let id = new_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO app_user (id, username, password_hash, phone, email, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.username)
        .bind(&req.password_hash)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "phone or email already registered"))?;

        info!(
            subsystem = "db",
            component = "users",
            op = "create",
            user_id = %id,
            "User registered"
        );
        Ok(user_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn exists(&self, phone: &str, email: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM app_user WHERE phone = $1 OR email = $2) AS taken",
        )
        .bind(phone)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("taken"))
    }
}
