//! Error types for biometric registration and assertion
//!
//! Every verification failure is reported here with its precise cause so it
//! can be logged; the HTTP layer collapses the authentication failures into a
//! single generic rejection.

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Reasons a challenge binding is refused. Collectively `ChallengeInvalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("challenge binding is missing or unreadable")]
    Malformed,

    #[error("challenge binding has already been used")]
    Replayed,

    #[error("challenge has expired")]
    Expired,

    #[error("challenge is bound to a different identity")]
    IdentityMismatch,

    #[error("presented challenge does not match the issued challenge")]
    ChallengeMismatch,

    #[error("challenge was issued for a different operation")]
    OperationMismatch,

    #[error("client data origin is not allowed")]
    OriginMismatch,
}

/// Errors surfaced by the registration and assertion flows.
/// `Storage` and `Internal` are server faults; the rest are caller-caused.
#[derive(Debug, thiserror::Error)]
pub enum BiometricError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("identity not found")]
    IdentityNotFound,

    #[error("no biometric credentials registered for this identity")]
    NoCredentials,

    #[error("challenge invalid: {0}")]
    ChallengeInvalid(#[from] ChallengeError),

    #[error("wrong operation type: expected {expected}, got {actual}")]
    WrongOperation {
        expected: &'static str,
        actual: String,
    },

    #[error("credential is not registered for this identity")]
    CredentialNotFound,

    #[error("credential already registered")]
    DuplicateCredential,

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for BiometricError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateCredential(_) => Self::DuplicateCredential,
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationError> for BiometricError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.0)
    }
}

impl BiometricError {
    /// Failures that must be reported to clients as a generic authentication
    /// failure, without revealing which check failed
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::ChallengeInvalid(_) | Self::WrongOperation { .. } | Self::CredentialNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_store_error_maps_to_duplicate_credential() {
        let err: BiometricError = StoreError::DuplicateCredential("cred-1".into()).into();
        assert!(matches!(err, BiometricError::DuplicateCredential));

        let err: BiometricError = StoreError::NotFound("cred-1".into()).into();
        assert!(matches!(err, BiometricError::Storage(_)));
    }

    #[test]
    fn test_authentication_failures_are_classified() {
        assert!(BiometricError::from(ChallengeError::Expired).is_authentication_failure());
        assert!(BiometricError::CredentialNotFound.is_authentication_failure());
        assert!(!BiometricError::NoCredentials.is_authentication_failure());
        assert!(!BiometricError::DuplicateCredential.is_authentication_failure());
    }
}
