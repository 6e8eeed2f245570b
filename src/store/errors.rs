/// Persistence-layer failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential already registered: {0}")]
    DuplicateCredential(String),

    #[error("identity already exists: {0}")]
    IdentityExists(String),

    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("corrupt credential record {id}: {source}")]
    CorruptRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether a sqlx error is a unique/primary-key constraint violation
    pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
        matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}
