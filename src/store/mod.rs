//! Relational persistence for identities and biometric credentials
//!
//! The [`Database`] handle owns the `SQLite` pool and is opened once at startup
//! and closed on shutdown. Stores borrow a clone of the pool and are handed
//! to the flows as trait objects.

mod credentials;
mod database;
mod errors;
mod identities;

pub use credentials::{CredentialBlob, CredentialRecord, CredentialStore, SqliteCredentialStore};
pub use database::Database;
pub use errors::StoreError;
pub use identities::{Identity, IdentityStore, SqliteIdentityStore};
