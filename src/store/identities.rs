use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::store::StoreError;

/// A registered user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    name: String,
    email: String,
    password: String,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

/// Identity lookup and password authentication
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create a new identity with an Argon2id password hash
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdentityExists` if the email is already registered
    async fn create(&self, name: &str, email: &str, password: &str)
        -> Result<Identity, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError>;

    /// Returns the identity when `password` matches the stored hash
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<Option<Identity>, StoreError>;
}

/// `SQLite`-backed identity store
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_email(&self, email: &str) -> Result<Option<IdentityRow>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, email, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        if self.fetch_by_email(email).await?.is_some() {
            return Err(StoreError::IdentityExists(email.to_string()));
        }

        let password_hash = hash_password(password)?;

        let result = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // Lost a race with a concurrent registration for the same email
                if StoreError::is_unique_violation(&e) {
                    StoreError::IdentityExists(email.to_string())
                } else {
                    StoreError::Sqlx(e)
                }
            })?;

        Ok(Identity {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.fetch_by_email(email).await?.map(Identity::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, email, password FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Identity::from))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(row) = self.fetch_by_email(email).await? else {
            return Ok(None);
        };

        if verify_password(password, &row.password) {
            Ok(Some(row.into()))
        } else {
            Ok(None)
        }
    }
}
