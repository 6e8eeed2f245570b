//! Steps shared by the registration and assertion completions

use chrono::{DateTime, Utc};

use crate::biometric::challenge::{ChallengeBinding, ChallengeManager};
use crate::biometric::client_data::ClientData;
use crate::biometric::errors::{BiometricError, ChallengeError};
use crate::biometric::types::Operation;
use crate::store::{Identity, IdentityStore};

/// Open and spend the binding the client presented.
/// A missing binding is treated like an unreadable one.
pub(crate) fn spend_binding(
    challenges: &ChallengeManager,
    binding: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ChallengeBinding, BiometricError> {
    let binding = binding.ok_or(ChallengeError::Malformed)?;
    Ok(challenges.consume_at(binding, now)?)
}

pub(crate) async fn require_identity(
    identities: &dyn IdentityStore,
    email: &str,
) -> Result<Identity, BiometricError> {
    identities
        .find_by_email(email)
        .await?
        .ok_or(BiometricError::IdentityNotFound)
}

/// Decode the client data and check it against the spent binding.
///
/// Order: binding checks, then origin, then the declared ceremony type.
pub(crate) fn verify_client_data(
    binding: &ChallengeBinding,
    identity_id: i64,
    client_data_json: &str,
    operation: Operation,
    challenges: &ChallengeManager,
    allowed_origins: &[String],
    now: DateTime<Utc>,
) -> Result<ClientData, BiometricError> {
    let client_data = ClientData::decode(client_data_json)?;

    binding.verify(
        identity_id,
        &client_data.challenge,
        operation,
        now,
        challenges.ttl(),
    )?;
    client_data.verify_origin(allowed_origins)?;

    let expected = operation.client_data_type();
    if client_data.operation_type != expected {
        return Err(BiometricError::WrongOperation {
            expected,
            actual: client_data.operation_type,
        });
    }

    Ok(client_data)
}
