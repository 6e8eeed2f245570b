use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::utils::crypto::{decrypt_data, encrypt_data, ENCRYPTION_KEY_SIZE};

/// Cookie names used across the application
pub const SESSION_COOKIE_NAME: &str = "bioauth_session";
pub const CHALLENGE_COOKIE_NAME: &str = "bioauth_challenge";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: CookieDuration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: CookieDuration::hours(24),
        }
    }
}

/// Cookie factory for the session cookie and the challenge binding transport
///
/// The `Secure` attribute is only set when both the factory and the cookie
/// options ask for it, so development over plain HTTP can turn it off globally.
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; ENCRYPTION_KEY_SIZE],
    cookie_secure: bool,
    session_duration_hours: u64,
    challenge_ttl_seconds: i64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(
        encryption_key: [u8; ENCRYPTION_KEY_SIZE],
        cookie_secure: bool,
        session_duration_hours: u64,
        challenge_ttl_seconds: i64,
    ) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            session_duration_hours,
            challenge_ttl_seconds,
        }
    }

    fn build_cookie(&self, name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Create a cookie carrying `data` encrypted under the factory key
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;
        Ok(self.build_cookie(name, value, options))
    }

    /// Read and decrypt a cookie. Unreadable cookies are logged and treated
    /// as absent.
    #[must_use]
    pub fn read_cookie<T: DeserializeOwned>(&self, req: &HttpRequest, name: &str) -> Option<T> {
        let cookie = req.cookie(name)?;
        match decrypt_data::<T>(cookie.value(), &self.encryption_key) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Failed to decrypt {name} cookie: {e}");
                None
            }
        }
    }

    /// Create the session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie<T: Serialize>(&self, session: &T) -> Result<Cookie<'static>> {
        self.create_cookie(
            SESSION_COOKIE_NAME,
            session,
            CookieOptions {
                same_site: SameSite::Lax,
                max_age: CookieDuration::hours(
                    i64::try_from(self.session_duration_hours).unwrap_or(24),
                ),
                ..Default::default()
            },
        )
    }

    /// Carry a sealed challenge binding. The binding is already encrypted by
    /// the challenge manager, so it is stored as is.
    #[must_use]
    pub fn create_challenge_cookie(&self, binding: &str) -> Cookie<'static> {
        self.build_cookie(
            CHALLENGE_COOKIE_NAME,
            binding.to_string(),
            CookieOptions {
                max_age: CookieDuration::seconds(self.challenge_ttl_seconds),
                ..Default::default()
            },
        )
    }

    #[must_use]
    pub fn read_challenge_cookie(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(CHALLENGE_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Expired cookie that removes the challenge binding from the browser
    #[must_use]
    pub fn clear_challenge_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(CHALLENGE_COOKIE_NAME, self.cookie_secure, SameSite::Strict)
    }

    /// Expired cookie that ends the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, self.cookie_secure, SameSite::Lax)
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool, same_site: SameSite) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .path("/")
        .max_age(CookieDuration::seconds(-1))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Payload {
        value: String,
    }

    fn factory(secure: bool) -> CookieFactory {
        CookieFactory::new([7u8; ENCRYPTION_KEY_SIZE], secure, 24, 300)
    }

    #[test]
    fn test_challenge_cookie_attributes() {
        let cookie = factory(true).create_challenge_cookie("sealed-binding");
        assert_eq!(cookie.name(), CHALLENGE_COOKIE_NAME);
        assert_eq!(cookie.value(), "sealed-binding");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(CookieDuration::minutes(5)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_insecure_factory_never_sets_secure() {
        let factory = factory(false);
        assert_eq!(factory.create_challenge_cookie("x").secure(), Some(false));
        assert_eq!(factory.clear_challenge_cookie().secure(), Some(false));
    }

    #[test]
    fn test_clear_challenge_cookie_expires() {
        let cookie = factory(true).clear_challenge_cookie();
        assert_eq!(cookie.name(), CHALLENGE_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().is_negative());
    }

    #[test]
    fn test_encrypted_cookie_round_trip() {
        let factory = factory(true);
        let payload = Payload {
            value: "hello".to_string(),
        };
        let cookie = factory.create_session_cookie(&payload).unwrap();
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.value(), "hello");

        let req = TestRequest::default().cookie(cookie).to_http_request();
        let read: Option<Payload> = factory.read_cookie(&req, SESSION_COOKIE_NAME);
        assert_eq!(read, Some(payload));
    }

    #[test]
    fn test_foreign_cookie_reads_as_none() {
        let other = CookieFactory::new([9u8; ENCRYPTION_KEY_SIZE], true, 24, 300);
        let cookie = other
            .create_session_cookie(&Payload {
                value: "x".to_string(),
            })
            .unwrap();

        let req = TestRequest::default().cookie(cookie).to_http_request();
        let read: Option<Payload> = factory(true).read_cookie(&req, SESSION_COOKIE_NAME);
        assert!(read.is_none());
    }

    #[test]
    fn test_read_challenge_cookie() {
        let factory = factory(true);
        let req = TestRequest::default()
            .cookie(factory.create_challenge_cookie("sealed"))
            .to_http_request();
        assert_eq!(factory.read_challenge_cookie(&req).as_deref(), Some("sealed"));

        let empty = TestRequest::default().to_http_request();
        assert!(factory.read_challenge_cookie(&empty).is_none());
    }
}
