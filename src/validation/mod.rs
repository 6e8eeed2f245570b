//! Validation Module
//!
//! Input checks for the JSON API, split by concern:
//!
//! - [`core`] - Field extraction from JSON bodies with ready-made error responses
//! - [`fields`] - Email, name and password rules
//! - [`requests`] - Whole-request validators for the account and biometric endpoints
//!
//! Validators that run inside the flows return [`ValidationError`]; the
//! extraction helpers used by handlers return an `HttpResponse` directly.

pub mod core;
pub mod fields;
pub mod requests;

/// Rejected caller input. The message is safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// Core validation utilities
pub use core::{extract_required_field, extract_required_string};

pub use fields::{normalize_email, validate_email, validate_name, validate_password};

pub use requests::{
    AccountRequestValidator, BiometricRequestValidator, LoginRequest, RegisterRequest,
    StoreCredentialRequest, VerifyAssertionRequest,
};
