use std::sync::Arc;

use serde::Serialize;

use crate::biometric::assertion::AssertionFlow;
use crate::biometric::challenge::ChallengeManager;
use crate::biometric::errors::BiometricError;
use crate::biometric::registration::RegistrationFlow;
use crate::settings::WebAuthnSettings;
use crate::store::{CredentialStore, IdentityStore};

/// Whether an identity can log in biometrically
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BiometricStatus {
    pub has_biometrics: bool,
    pub user_id: i64,
}

/// Entry point for the biometric flows. Cheap to share behind `web::Data`.
pub struct BiometricService {
    identities: Arc<dyn IdentityStore>,
    credentials: Arc<dyn CredentialStore>,
    challenges: Arc<ChallengeManager>,
    registration: RegistrationFlow,
    assertion: AssertionFlow,
}

impl BiometricService {
    #[must_use]
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        credentials: Arc<dyn CredentialStore>,
        challenges: Arc<ChallengeManager>,
        settings: &WebAuthnSettings,
    ) -> Self {
        let registration = RegistrationFlow::new(
            Arc::clone(&identities),
            Arc::clone(&credentials),
            Arc::clone(&challenges),
            settings.clone(),
        );
        let assertion = AssertionFlow::new(
            Arc::clone(&identities),
            Arc::clone(&credentials),
            Arc::clone(&challenges),
            settings.clone(),
        );
        Self {
            identities,
            credentials,
            challenges,
            registration,
            assertion,
        }
    }

    #[must_use]
    pub fn registration(&self) -> &RegistrationFlow {
        &self.registration
    }

    #[must_use]
    pub fn assertion(&self) -> &AssertionFlow {
        &self.assertion
    }

    #[must_use]
    pub fn challenges(&self) -> &ChallengeManager {
        &self.challenges
    }

    /// # Errors
    ///
    /// Returns `IdentityNotFound` for an unknown email, `Storage` on store faults
    pub async fn check(&self, email: &str) -> Result<BiometricStatus, BiometricError> {
        let identity = self
            .identities
            .find_by_email(email)
            .await?
            .ok_or(BiometricError::IdentityNotFound)?;
        let records = self.credentials.list_by_identity(identity.id).await?;

        Ok(BiometricStatus {
            has_biometrics: !records.is_empty(),
            user_id: identity.id,
        })
    }
}
