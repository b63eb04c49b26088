//! User (credential store) repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use keepmark_core::{Error, NewUser, Result, User, UserRepository};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

/// PostgreSQL implementation of UserRepository.
///
/// Uniqueness of username and email is enforced by the `users_username_key`
/// and `users_email_key` constraints; a violation surfaces as
/// [`Error::Conflict`].
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::now_v7())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Error::Conflict("User already exists!".to_string())
                } else {
                    err
                }
            })?;

        info!(
            subsystem = "db",
            component = "users",
            op = "insert",
            user_id = %created.id,
            "User created"
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }
}
