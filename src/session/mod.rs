//! Session Management Module
//!
//! - [`cookie`] - Cookie creation and reading, including the challenge binding transport
//! - [`issuer`] - Session issuance for verified identities

pub mod cookie;
pub mod issuer;

// Re-export commonly used items for convenience
pub use cookie::{CookieFactory, CookieOptions, CHALLENGE_COOKIE_NAME, SESSION_COOKIE_NAME};
pub use issuer::{AuthMethod, CookieSessionIssuer, SessionClaims, SessionIssuer};
