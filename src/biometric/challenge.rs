//! Challenge issuance and single-use verification
//!
//! A challenge is 32 random bytes, carried as unpadded base64url. The binding
//! that ties it to an identity and an operation is sealed with AES-256-GCM and
//! handed to the client to hold; only this server can open or forge it.
//! Single use is enforced by a ledger of spent binding ids that only needs to
//! remember a binding for as long as it could still pass the expiry check.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::biometric::errors::ChallengeError;
use crate::biometric::types::Operation;
use crate::utils::crypto::{self, canonical_base64url, ENCRYPTION_KEY_SIZE};

/// Challenge size in bytes (256 bits of entropy)
pub const CHALLENGE_SIZE: usize = 32;

/// Default validity window: 5 minutes
pub const DEFAULT_CHALLENGE_TTL_SECONDS: i64 = 300;

/// State sealed inside a binding token
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChallengeBinding {
    pub binding_id: Uuid,
    pub challenge: String, // Canonical base64url, no padding
    pub identity_id: i64,
    pub operation: Operation,
    pub issued_at: DateTime<Utc>,
}

impl ChallengeBinding {
    /// Check the binding against what the client presented.
    ///
    /// Checks run in a fixed order: expiry, identity, challenge, operation.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a `ChallengeError`
    pub fn verify(
        &self,
        identity_id: i64,
        presented_challenge: &str,
        operation: Operation,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), ChallengeError> {
        if now >= self.issued_at + ttl {
            return Err(ChallengeError::Expired);
        }
        if self.identity_id != identity_id {
            return Err(ChallengeError::IdentityMismatch);
        }
        if canonical_base64url(presented_challenge) != self.challenge {
            return Err(ChallengeError::ChallengeMismatch);
        }
        if self.operation != operation {
            return Err(ChallengeError::OperationMismatch);
        }
        Ok(())
    }
}

/// A freshly issued challenge and its sealed binding
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    /// Goes into the options bundle sent to the browser
    pub challenge: String,
    /// Opaque token for the client-held transport
    pub binding: String,
}

/// Issues and consumes one-time challenges
pub struct ChallengeManager {
    key: [u8; ENCRYPTION_KEY_SIZE],
    ttl: Duration,
    spent: DashMap<Uuid, DateTime<Utc>>,
}

impl ChallengeManager {
    /// Create a manager with the default 5 minute validity window
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_CHALLENGE_TTL_SECONDS))
    }

    #[must_use]
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: crypto::derive_encryption_key(secret),
            ttl,
            spent: DashMap::new(),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new challenge bound to `identity_id` for `operation`
    ///
    /// # Errors
    ///
    /// Returns an error if the binding cannot be sealed
    pub fn issue(&self, identity_id: i64, operation: Operation) -> anyhow::Result<IssuedChallenge> {
        self.issue_at(identity_id, operation, Utc::now())
    }

    /// # Errors
    ///
    /// Returns an error if the binding cannot be sealed
    pub fn issue_at(
        &self,
        identity_id: i64,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> anyhow::Result<IssuedChallenge> {
        let challenge = crypto::generate_nonce(CHALLENGE_SIZE);
        let binding = ChallengeBinding {
            binding_id: Uuid::new_v4(),
            challenge: challenge.clone(),
            identity_id,
            operation,
            issued_at: now,
        };
        let binding = crypto::encrypt_data(&binding, &self.key)?;
        Ok(IssuedChallenge { challenge, binding })
    }

    /// Open a binding and mark it spent.
    ///
    /// This is the point of no return: once a binding opens it can never be
    /// opened again, whether or not the subsequent checks pass.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the token was not sealed by this manager
    /// - `Replayed` if the binding has already been consumed
    pub fn consume(&self, binding: &str) -> Result<ChallengeBinding, ChallengeError> {
        self.consume_at(binding, Utc::now())
    }

    /// # Errors
    ///
    /// See [`ChallengeManager::consume`]
    pub fn consume_at(
        &self,
        binding: &str,
        now: DateTime<Utc>,
    ) -> Result<ChallengeBinding, ChallengeError> {
        let opened: ChallengeBinding =
            crypto::decrypt_data(binding, &self.key).map_err(|_| ChallengeError::Malformed)?;

        self.prune_spent(now);

        if self
            .spent
            .insert(opened.binding_id, opened.issued_at)
            .is_some()
        {
            return Err(ChallengeError::Replayed);
        }

        Ok(opened)
    }

    /// Consume a binding and verify it in one step
    ///
    /// # Errors
    ///
    /// Returns the `ChallengeError` for the first failing check; the binding
    /// is spent regardless
    pub fn verify_and_consume(
        &self,
        binding: &str,
        identity_id: i64,
        presented_challenge: &str,
        operation: Operation,
    ) -> Result<(), ChallengeError> {
        self.verify_and_consume_at(binding, identity_id, presented_challenge, operation, Utc::now())
    }

    /// # Errors
    ///
    /// See [`ChallengeManager::verify_and_consume`]
    pub fn verify_and_consume_at(
        &self,
        binding: &str,
        identity_id: i64,
        presented_challenge: &str,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        self.consume_at(binding, now)?
            .verify(identity_id, presented_challenge, operation, now, self.ttl)
    }

    /// Number of spent bindings still remembered
    #[must_use]
    pub fn spent_count(&self) -> usize {
        self.spent.len()
    }

    // An expired binding fails verification on its own, so its ledger entry
    // can go once the window has passed.
    fn prune_spent(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.spent.retain(|_, issued_at| *issued_at + ttl > now);
    }
}
