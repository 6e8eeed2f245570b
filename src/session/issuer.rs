//! Session issuance for verified identities
//!
//! The biometric and password flows only produce a [`VerifiedIdentity`];
//! turning that into a session is the job of a [`SessionIssuer`].

use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::biometric::VerifiedIdentity;
use crate::session::cookie::{CookieFactory, SESSION_COOKIE_NAME};

/// How the session holder proved their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Password,
    Biometric,
}

impl AuthMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Biometric => "biometric",
        }
    }
}

/// Contents of the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub method: AuthMethod,
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Turns a verified identity into a client session
pub trait SessionIssuer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the session token cannot be produced
    fn issue(&self, identity: &VerifiedIdentity, method: AuthMethod) -> Result<Cookie<'static>>;

    /// The live session carried by `req`, if any
    fn current(&self, req: &HttpRequest) -> Option<SessionClaims>;

    /// A cookie that ends the session
    fn revoke(&self) -> Cookie<'static>;
}

/// Stateless sessions held in an encrypted cookie
#[derive(Clone)]
pub struct CookieSessionIssuer {
    cookies: CookieFactory,
    duration: Duration,
}

impl CookieSessionIssuer {
    #[must_use]
    pub fn new(cookies: CookieFactory, session_duration_hours: u64) -> Self {
        let hours = i64::try_from(session_duration_hours).unwrap_or(24);
        Self {
            cookies,
            duration: Duration::hours(hours),
        }
    }
}

impl SessionIssuer for CookieSessionIssuer {
    fn issue(&self, identity: &VerifiedIdentity, method: AuthMethod) -> Result<Cookie<'static>> {
        let now = Utc::now();
        let claims = SessionClaims {
            user_id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            method,
            authenticated_at: now,
            expires_at: now + self.duration,
        };
        self.cookies.create_session_cookie(&claims)
    }

    fn current(&self, req: &HttpRequest) -> Option<SessionClaims> {
        self.cookies
            .read_cookie::<SessionClaims>(req, SESSION_COOKIE_NAME)
            .filter(|claims| {
                if claims.is_expired() {
                    log::debug!("Session for user {} has expired", claims.user_id);
                    false
                } else {
                    true
                }
            })
    }

    fn revoke(&self) -> Cookie<'static> {
        self.cookies.create_expired_cookie()
    }
}
