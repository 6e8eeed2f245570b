//! Biometric login (assertion)
//!
//! No signature over `authenticatorData` is checked: a match on the
//! credential identifier plus a fresh, correctly bound challenge is what
//! proves the identity here.

use std::sync::Arc;

use chrono::Utc;

use crate::biometric::ceremony::{require_identity, spend_binding, verify_client_data};
use crate::biometric::challenge::ChallengeManager;
use crate::biometric::errors::BiometricError;
use crate::biometric::types::{
    AssertionCredential, Operation, PublicKeyCredentialDescriptor, RequestOptions,
    VerifiedIdentity,
};
use crate::settings::WebAuthnSettings;
use crate::store::{CredentialStore, IdentityStore};
use crate::utils::logging::LoggingHelper;

/// Advertised when a stored credential recorded no transports
const DEFAULT_TRANSPORT: &str = "internal";

/// Output of [`AssertionFlow::begin`]
#[derive(Debug, Clone)]
pub struct AssertionStart {
    pub options: RequestOptions,
    pub binding: String,
    pub identity_id: i64,
}

pub struct AssertionFlow {
    identities: Arc<dyn IdentityStore>,
    credentials: Arc<dyn CredentialStore>,
    challenges: Arc<ChallengeManager>,
    settings: WebAuthnSettings,
}

impl AssertionFlow {
    #[must_use]
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        credentials: Arc<dyn CredentialStore>,
        challenges: Arc<ChallengeManager>,
        settings: WebAuthnSettings,
    ) -> Self {
        Self {
            identities,
            credentials,
            challenges,
            settings,
        }
    }

    /// Build credential request options for `email`.
    ///
    /// # Errors
    ///
    /// - `IdentityNotFound` if no identity has this email
    /// - `NoCredentials` if the identity has nothing registered; no challenge is issued
    pub async fn begin(
        &self,
        email: &str,
        rp_host: Option<&str>,
    ) -> Result<AssertionStart, BiometricError> {
        let identity = require_identity(self.identities.as_ref(), email).await?;

        let records = self.credentials.list_by_identity(identity.id).await?;
        if records.is_empty() {
            return Err(BiometricError::NoCredentials);
        }

        let allow_credentials = records
            .iter()
            .map(|record| {
                let mut descriptor = PublicKeyCredentialDescriptor::from(&record.blob);
                if descriptor.transports.is_empty() {
                    descriptor.transports = vec![DEFAULT_TRANSPORT.to_string()];
                }
                descriptor
            })
            .collect();

        let issued = self
            .challenges
            .issue(identity.id, Operation::Get)
            .map_err(|e| BiometricError::Internal(e.to_string()))?;

        let rp_id = rp_host.unwrap_or(self.settings.rp_id.as_str()).to_string();
        LoggingHelper::log_challenge_issued(Operation::Get, identity.id, &rp_id);

        Ok(AssertionStart {
            options: RequestOptions {
                challenge: issued.challenge,
                rp_id,
                user_verification: self.settings.user_verification.clone(),
                timeout: self.settings.timeout_ms,
                allow_credentials,
            },
            binding: issued.binding,
            identity_id: identity.id,
        })
    }

    /// Verify an assertion response.
    ///
    /// # Errors
    ///
    /// - `ChallengeInvalid` if the binding is missing, spent, expired or does not match
    /// - `IdentityNotFound` if no identity has this email
    /// - `Validation` if the client data is malformed
    /// - `WrongOperation` if the client data is not `webauthn.get`
    /// - `CredentialNotFound` if the credential is not one of the identity's
    pub async fn complete(
        &self,
        binding: Option<&str>,
        email: &str,
        credential: &AssertionCredential,
    ) -> Result<VerifiedIdentity, BiometricError> {
        let now = Utc::now();
        let binding = spend_binding(&self.challenges, binding, now)?;
        let identity = require_identity(self.identities.as_ref(), email).await?;

        verify_client_data(
            &binding,
            identity.id,
            &credential.response.client_data_json,
            Operation::Get,
            &self.challenges,
            &self.settings.allowed_origins,
            now,
        )?;

        let presented_raw_id = credential.raw_id.as_deref().unwrap_or(credential.id.as_str());
        let matched = self
            .credentials
            .list_by_identity(identity.id)
            .await?
            .into_iter()
            .find(|record| record.id == credential.id || record.blob.raw_id == presented_raw_id)
            .ok_or(BiometricError::CredentialNotFound)?;

        LoggingHelper::log_assertion_verified(identity.id, &matched.id);
        Ok(identity.into())
    }
}
