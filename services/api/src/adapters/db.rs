//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `IdentityStore` and `DreamStore` ports from the `core` crate. It handles
//! all interactions with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use somnova_core::domain::{Dream, DreamId, User, UserId};
use somnova_core::ports::{DreamStore, IdentityStore, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports on top of SQLite.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct DreamRecord {
    id: i64,
    user_id: i64,
    content: String,
    completed_text: String,
    created_at: DateTime<Utc>,
}
impl DreamRecord {
    fn to_domain(self) -> Dream {
        Dream {
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            completed_text: self.completed_text,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for DbAdapter {
    async fn find_or_create_by_email(&self, email: &str) -> PortResult<User> {
        if email.trim().is_empty() {
            return Err(PortError::Validation("Email required".to_string()));
        }

        // The UNIQUE constraint on users.email makes the lazy-create path
        // safe under concurrent first logins: the insert is a no-op for the
        // loser and both requests read the same row back.
        sqlx::query("INSERT INTO users (email) VALUES (?1) ON CONFLICT(email) DO NOTHING")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record =
            sqlx::query_as::<_, UserRecord>("SELECT id, email FROM users WHERE email = ?1")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("User with email {} not found", email))
                    }
                    _ => PortError::Unexpected(e.to_string()),
                })?;

        Ok(record.to_domain())
    }

    async fn get_by_id(&self, user_id: UserId) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT id, email FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;

        Ok(record.to_domain())
    }
}

//=========================================================================================
// `DreamStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DreamStore for DbAdapter {
    async fn create(
        &self,
        owner_id: UserId,
        content: &str,
        completed_text: &str,
    ) -> PortResult<DreamId> {
        let result = sqlx::query(
            "INSERT INTO dreams (user_id, content, completed_text, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(owner_id)
        .bind(content)
        .bind(completed_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> PortResult<Vec<Dream>> {
        // Tie-break on id so same-instant inserts still list newest-first.
        let records = sqlx::query_as::<_, DreamRecord>(
            "SELECT id, user_id, content, completed_text, created_at FROM dreams \
             WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let dreams = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(dreams)
    }
}
