//! Biometric credential registration
//!
//! `begin` issues a creation options bundle and a `Create`-scoped challenge;
//! `complete` spends the challenge, checks the returned client data and
//! stores the credential.

use std::sync::Arc;

use chrono::Utc;

use crate::biometric::ceremony::{require_identity, spend_binding, verify_client_data};
use crate::biometric::challenge::ChallengeManager;
use crate::biometric::errors::BiometricError;
use crate::biometric::types::{
    AuthenticatorSelectionCriteria, CreationOptions, Operation, PublicKeyCredentialDescriptor,
    PublicKeyCredentialParameters, RegistrationCredential, RelyingParty, UserEntity,
    PUBLIC_KEY_TYPE,
};
use crate::settings::WebAuthnSettings;
use crate::store::{CredentialRecord, CredentialStore, IdentityStore};
use crate::utils::logging::LoggingHelper;

/// Attestation conveyance requested from authenticators
const ATTESTATION_NONE: &str = "none";

/// Output of [`RegistrationFlow::begin`]
#[derive(Debug, Clone)]
pub struct RegistrationStart {
    pub options: CreationOptions,
    /// Sealed challenge binding for the client-held transport
    pub binding: String,
    pub identity_id: i64,
}

pub struct RegistrationFlow {
    identities: Arc<dyn IdentityStore>,
    credentials: Arc<dyn CredentialStore>,
    challenges: Arc<ChallengeManager>,
    settings: WebAuthnSettings,
}

impl RegistrationFlow {
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

    /// Build credential creation options for `email`.
    ///
    /// `rp_host` is the host the browser is talking to; the configured
    /// relying-party id is used when it is absent.
    ///
    /// # Errors
    ///
    /// - `IdentityNotFound` if no identity has this email
    /// - `Storage` if the stores fail
    /// - `Internal` if the challenge cannot be sealed
    pub async fn begin(
        &self,
        email: &str,
        rp_host: Option<&str>,
    ) -> Result<RegistrationStart, BiometricError> {
        let identity = require_identity(self.identities.as_ref(), email).await?;

        let exclude_credentials = self
            .credentials
            .list_by_identity(identity.id)
            .await?
            .iter()
            .map(|record| PublicKeyCredentialDescriptor::from(&record.blob))
            .collect();

        let issued = self
            .challenges
            .issue(identity.id, Operation::Create)
            .map_err(|e| BiometricError::Internal(e.to_string()))?;

        let rp_id = rp_host.unwrap_or(self.settings.rp_id.as_str()).to_string();
        LoggingHelper::log_challenge_issued(Operation::Create, identity.id, &rp_id);

        let options = CreationOptions {
            challenge: issued.challenge,
            rp: RelyingParty {
                name: self.settings.rp_name.clone(),
                id: rp_id,
            },
            user: UserEntity::for_identity(&identity),
            pub_key_cred_params: PublicKeyCredentialParameters::defaults(),
            authenticator_selection: AuthenticatorSelectionCriteria {
                authenticator_attachment: self.settings.authenticator_attachment.clone(),
                user_verification: self.settings.user_verification.clone(),
                require_resident_key: false,
            },
            timeout: self.settings.timeout_ms,
            attestation: ATTESTATION_NONE.to_string(),
            exclude_credentials,
        };

        Ok(RegistrationStart {
            options,
            binding: issued.binding,
            identity_id: identity.id,
        })
    }

    /// Verify a creation response and store the credential.
    ///
    /// The binding is spent before anything else is checked, so a failed
    /// attempt can never be retried with the same challenge.
    ///
    /// # Errors
    ///
    /// - `ChallengeInvalid` if the binding is missing, spent, expired or does not match
    /// - `IdentityNotFound` if no identity has this email
    /// - `Validation` if the credential or its client data is malformed
    /// - `WrongOperation` if the client data is not `webauthn.create`
    /// - `DuplicateCredential` if the credential id is already registered
    pub async fn complete(
        &self,
        binding: Option<&str>,
        email: &str,
        credential: &RegistrationCredential,
    ) -> Result<String, BiometricError> {
        let now = Utc::now();
        let binding = spend_binding(&self.challenges, binding, now)?;
        let identity = require_identity(self.identities.as_ref(), email).await?;

        if credential.id.trim().is_empty() {
            return Err(BiometricError::Validation("Missing credential id".into()));
        }
        if credential.credential_type != PUBLIC_KEY_TYPE {
            return Err(BiometricError::Validation(format!(
                "Unsupported credential type: {}",
                credential.credential_type
            )));
        }

        verify_client_data(
            &binding,
            identity.id,
            &credential.response.client_data_json,
            Operation::Create,
            &self.challenges,
            &self.settings.allowed_origins,
            now,
        )?;

        let record = CredentialRecord {
            id: credential.id.clone(),
            user_id: identity.id,
            blob: credential.to_blob(),
        };
        self.credentials.put(&record).await?;

        LoggingHelper::log_credential_registered(identity.id, &record.id);
        Ok(record.id)
    }
}
