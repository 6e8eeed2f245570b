use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::store::StoreError;

/// Serialized public credential material as returned by the authenticator at
/// registration. Never contains private key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBlob {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub transports: Vec<String>,
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
}

/// A registered biometric credential owned by exactly one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Public credential identifier as issued by the authenticator
    pub id: String,
    pub user_id: i64,
    pub blob: CredentialBlob,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    user_id: i64,
    credential_data: String,
}

impl TryFrom<CredentialRow> for CredentialRecord {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self, StoreError> {
        let blob = serde_json::from_str(&row.credential_data).map_err(|source| {
            StoreError::CorruptRecord {
                id: row.id.clone(),
                source,
            }
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            blob,
        })
    }
}

/// Persistent mapping from identities to their registered credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new record
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateCredential` if the identifier already exists
    async fn put(&self, record: &CredentialRecord) -> Result<(), StoreError>;

    /// All records owned by an identity; empty when there are none
    async fn list_by_identity(&self, identity_id: i64)
        -> Result<Vec<CredentialRecord>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this identifier
    async fn find_by_id(&self, credential_id: &str) -> Result<CredentialRecord, StoreError>;

    /// Remove a record. Deleting an absent record is not an error.
    async fn delete(&self, credential_id: &str) -> Result<(), StoreError>;
}

/// `SQLite`-backed credential store
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn put(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let credential_data = serde_json::to_string(&record.blob).map_err(|source| {
            StoreError::CorruptRecord {
                id: record.id.clone(),
                source,
            }
        })?;

        sqlx::query(
            "INSERT INTO biometric_credentials (id, user_id, credential_data) VALUES (?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(&credential_data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if StoreError::is_unique_violation(&e) {
                StoreError::DuplicateCredential(record.id.clone())
            } else {
                StoreError::Sqlx(e)
            }
        })?;

        Ok(())
    }

    async fn list_by_identity(
        &self,
        identity_id: i64,
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, user_id, credential_data FROM biometric_credentials WHERE user_id = ?",
        )
        .bind(identity_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_by_id(&self, credential_id: &str) -> Result<CredentialRecord, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, user_id, credential_data FROM biometric_credentials WHERE id = ?",
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(credential_id.to_string()))?
            .try_into()
    }

    async fn delete(&self, credential_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM biometric_credentials WHERE id = ?")
            .bind(credential_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
