//! Test fixtures providing pre-built test objects
//!
//! Everything runs against an in-memory `SQLite` database, so each fixture
//! is isolated from every other.

use std::sync::Arc;

use super::constants::{TEST_EMAIL, TEST_PASSWORD, TEST_SESSION_SECRET, TEST_USER_NAME};
use crate::app::AppContext;
use crate::biometric::{BiometricService, ChallengeManager};
use crate::settings::{BioauthSettings, CookieSettings, DatabaseSettings, SessionSettings};
use crate::store::{
    CredentialBlob, CredentialRecord, CredentialStore, Database, Identity, IdentityStore,
    SqliteCredentialStore, SqliteIdentityStore,
};

/// Central fixture provider for test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings with a fixed secret, insecure cookies and an in-memory database
    #[must_use]
    pub fn settings() -> BioauthSettings {
        BioauthSettings {
            database: DatabaseSettings {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            session: SessionSettings {
                session_secret: TEST_SESSION_SECRET.to_string(),
                session_duration_hours: 24,
            },
            cookies: CookieSettings { secure: false },
            ..BioauthSettings::default()
        }
    }

    /// # Panics
    ///
    /// Panics if the in-memory database cannot be opened
    pub async fn database() -> Database {
        Database::in_memory()
            .await
            .expect("in-memory database opens")
    }

    /// A full application context over a fresh in-memory database
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be opened
    pub async fn app_context() -> (Database, AppContext) {
        let database = Self::database().await;
        let context = AppContext::new(&database, &Self::settings());
        (database, context)
    }

    /// A stored credential record with plausible blob contents
    #[must_use]
    pub fn credential_record(id: &str, user_id: i64) -> CredentialRecord {
        CredentialRecord {
            id: id.to_string(),
            user_id,
            blob: CredentialBlob {
                id: id.to_string(),
                raw_id: id.to_string(),
                credential_type: "public-key".to_string(),
                transports: Vec::new(),
                attestation_object: "oWNmbXRkbm9uZQ".to_string(),
                client_data_json: "e30".to_string(),
            },
        }
    }
}

/// Stores, flows and one seeded identity over a private in-memory database
pub struct TestEnvironment {
    pub database: Database,
    pub settings: BioauthSettings,
    pub identities: Arc<SqliteIdentityStore>,
    pub credentials: Arc<SqliteCredentialStore>,
    pub challenges: Arc<ChallengeManager>,
    pub service: BiometricService,
    /// Seeded with [`TEST_EMAIL`] / [`TEST_PASSWORD`]
    pub identity: Identity,
}

impl TestEnvironment {
    /// # Panics
    ///
    /// Panics if the database cannot be opened or seeded
    pub async fn new() -> Self {
        let database = TestFixtures::database().await;
        let settings = TestFixtures::settings();

        let identities = Arc::new(SqliteIdentityStore::new(database.pool().clone()));
        let credentials = Arc::new(SqliteCredentialStore::new(database.pool().clone()));
        let challenges = Arc::new(ChallengeManager::with_ttl(
            settings.session.session_secret.as_bytes(),
            settings.webauthn.challenge_ttl(),
        ));

        let identity = identities
            .create(TEST_USER_NAME, TEST_EMAIL, TEST_PASSWORD)
            .await
            .expect("seed identity is created");

        let service = Self::build_service(&identities, &credentials, &challenges, &settings);

        Self {
            database,
            settings,
            identities,
            credentials,
            challenges,
            service,
            identity,
        }
    }

    fn build_service(
        identities: &Arc<SqliteIdentityStore>,
        credentials: &Arc<SqliteCredentialStore>,
        challenges: &Arc<ChallengeManager>,
        settings: &BioauthSettings,
    ) -> BiometricService {
        let identities: Arc<dyn IdentityStore> = identities.clone();
        let credentials: Arc<dyn CredentialStore> = credentials.clone();
        BiometricService::new(
            identities,
            credentials,
            Arc::clone(challenges),
            &settings.webauthn,
        )
    }

    /// Require client data origins to be one of `origins`
    pub fn pin_origins(&mut self, origins: &[&str]) {
        self.settings.webauthn.allowed_origins =
            origins.iter().map(ToString::to_string).collect();
        self.service = Self::build_service(
            &self.identities,
            &self.credentials,
            &self.challenges,
            &self.settings,
        );
    }

    /// # Panics
    ///
    /// Panics if the identity cannot be created
    pub async fn create_identity(&self, name: &str, email: &str) -> Identity {
        self.identities
            .create(name, email, TEST_PASSWORD)
            .await
            .expect("identity is created")
    }

    /// Store a credential for the seeded identity without running a ceremony
    ///
    /// # Panics
    ///
    /// Panics if the credential cannot be stored
    pub async fn register_credential(&self, credential_id: &str) -> CredentialRecord {
        self.register_credential_for(self.identity.id, credential_id)
            .await
    }

    /// # Panics
    ///
    /// Panics if the credential cannot be stored
    pub async fn register_credential_for(
        &self,
        identity_id: i64,
        credential_id: &str,
    ) -> CredentialRecord {
        let record = TestFixtures::credential_record(credential_id, identity_id);
        self.credentials
            .put(&record)
            .await
            .expect("credential is stored");
        record
    }

    /// # Panics
    ///
    /// Panics if the store cannot be read
    pub async fn credentials_for_identity(&self) -> Vec<CredentialRecord> {
        self.credentials
            .list_by_identity(self.identity.id)
            .await
            .expect("credentials are listed")
    }
}
