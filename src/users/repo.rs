use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, provider, provider_id, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Implementations must enforce email uniqueness
/// atomically: of two concurrent inserts with the same email, one fails with
/// [`StoreError::DuplicateEmail`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Sets provider fields only while the stored provider is still empty and
    /// returns the row as it is after the call.
    async fn link_provider(
        &self,
        id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, StoreError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<User, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, provider, provider_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.provider)
            .bind(&new.provider_id)
            .fetch_one(&self.db)
            .await
            .map_err(map_insert_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(users)
    }

    async fn link_provider(
        &self,
        id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET provider = $2, provider_id = $3, updated_at = now()
             WHERE id = $1 AND provider = ''
            RETURNING {USER_COLUMNS}
            "#
        );
        let linked = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(provider)
            .bind(provider_id)
            .fetch_optional(&self.db)
            .await?;

        match linked {
            Some(user) => Ok(user),
            // Linked concurrently or gone; report the current row.
            None => self.find_by_id(id).await?.ok_or(StoreError::NotFound),
        }
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET name = $2, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
