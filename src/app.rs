//! Application wiring
//!
//! [`AppContext`] is built once at startup from an open [`Database`] and the
//! loaded settings, then shared with every worker through `web::Data`.

use std::sync::Arc;

use actix_web::web;

use crate::biometric::{BiometricService, ChallengeManager};
use crate::handlers::configure_services;
use crate::session::{CookieFactory, CookieSessionIssuer, SessionIssuer};
use crate::settings::BioauthSettings;
use crate::store::{
    CredentialStore, Database, IdentityStore, SqliteCredentialStore, SqliteIdentityStore,
};
use crate::utils::crypto::derive_encryption_key;

#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<BioauthSettings>,
    pub identities: Arc<dyn IdentityStore>,
    pub biometrics: Arc<BiometricService>,
    pub cookies: CookieFactory,
    pub sessions: Arc<dyn SessionIssuer>,
}

impl AppContext {
    /// Build the stores, the challenge manager and the session issuer.
    ///
    /// Challenge bindings and session cookies are both sealed with a key
    /// derived from `session.session_secret`.
    #[must_use]
    pub fn new(database: &Database, settings: &BioauthSettings) -> Self {
        let secret = settings.session.session_secret.as_bytes();
        let ttl = settings.webauthn.challenge_ttl();

        let identities: Arc<dyn IdentityStore> =
            Arc::new(SqliteIdentityStore::new(database.pool().clone()));
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(SqliteCredentialStore::new(database.pool().clone()));
        let challenges = Arc::new(ChallengeManager::with_ttl(secret, ttl));

        let biometrics = Arc::new(BiometricService::new(
            Arc::clone(&identities),
            credentials,
            challenges,
            &settings.webauthn,
        ));

        let cookies = CookieFactory::new(
            derive_encryption_key(secret),
            settings.cookies.secure,
            settings.session.session_duration_hours,
            ttl.num_seconds(),
        );
        let sessions: Arc<dyn SessionIssuer> = Arc::new(CookieSessionIssuer::new(
            cookies.clone(),
            settings.session.session_duration_hours,
        ));

        Self {
            settings: Arc::new(settings.clone()),
            identities,
            biometrics,
            cookies,
            sessions,
        }
    }

    /// Register the shared state and every route on an `App`
    pub fn configure(self) -> impl Fn(&mut web::ServiceConfig) + Clone {
        let data = web::Data::new(self);
        move |cfg: &mut web::ServiceConfig| {
            cfg.app_data(data.clone());
            configure_services(cfg);
        }
    }
}
