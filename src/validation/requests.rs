//! Request validators for the JSON API
//!
//! Each validator turns a raw JSON body into a typed request, or into the
//! 400 response the handler should return.

use actix_web::HttpResponse;
use serde_json::Value;

use crate::biometric::{AssertionCredential, RegistrationCredential};
use crate::utils::responses::ResponseBuilder;
use crate::validation::core::{extract_required_field, extract_required_string};
use crate::validation::fields::{normalize_email, validate_email, validate_name, validate_password};
use crate::validation::ValidationError;

/// Validated `POST /api/register` body
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated `POST /api/login` body
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Validated `POST /api/biometrics/store` body
#[derive(Debug)]
pub struct StoreCredentialRequest {
    pub email: String,
    pub credential: RegistrationCredential,
}

/// Validated `POST /api/biometrics/verify` body
#[derive(Debug)]
pub struct VerifyAssertionRequest {
    pub email: String,
    pub credential: AssertionCredential,
}

fn rejected(field_name: &str, error: &ValidationError) -> HttpResponse {
    log::debug!("Rejected {field_name}: {error}");
    ResponseBuilder::bad_request()
        .with_error_code("invalid_field")
        .with_message(&error.0)
        .build()
}

/// Validators for password account endpoints
pub struct AccountRequestValidator;

impl AccountRequestValidator {
    /// # Errors
    ///
    /// Returns a 400 response if a field is missing or fails its rule
    pub fn validate_register(data: &Value) -> Result<RegisterRequest, HttpResponse> {
        let name = extract_required_string(data, "name")?;
        let email = normalize_email(&extract_required_string(data, "email")?);
        let password = data
            .get("password")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| ResponseBuilder::missing_field("password"))?;

        validate_name(&name).map_err(|e| rejected("name", &e))?;
        validate_email(&email).map_err(|e| rejected("email", &e))?;
        validate_password(&password).map_err(|e| rejected("password", &e))?;

        Ok(RegisterRequest {
            name,
            email,
            password,
        })
    }

    /// Login only checks presence; the rules are not revealed on failure
    ///
    /// # Errors
    ///
    /// Returns a 400 response if email or password is missing
    pub fn validate_login(data: &Value) -> Result<LoginRequest, HttpResponse> {
        let email = normalize_email(&extract_required_string(data, "email")?);
        let password = data
            .get("password")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| ResponseBuilder::missing_field("password"))?;

        Ok(LoginRequest { email, password })
    }
}

/// Validators for the biometric endpoints
pub struct BiometricRequestValidator;

impl BiometricRequestValidator {
    /// Extract the email that every biometric endpoint is keyed on
    ///
    /// # Errors
    ///
    /// Returns a 400 response if the email is missing
    pub fn validate_email_request(data: &Value) -> Result<String, HttpResponse> {
        extract_required_string(data, "email").map(|email| normalize_email(&email))
    }

    /// # Errors
    ///
    /// Returns a 400 response if the email or the credential is missing, or the
    /// credential does not have the shape `navigator.credentials.create()` returns
    pub fn validate_store_request(data: &Value) -> Result<StoreCredentialRequest, HttpResponse> {
        let email = Self::validate_email_request(data)?;
        let credential: RegistrationCredential = extract_required_field(data, "credential")?;
        Ok(StoreCredentialRequest { email, credential })
    }

    /// # Errors
    ///
    /// Returns a 400 response if the email or the credential is missing, or the
    /// credential does not have the shape `navigator.credentials.get()` returns
    pub fn validate_verify_request(data: &Value) -> Result<VerifyAssertionRequest, HttpResponse> {
        let email = Self::validate_email_request(data)?;
        let credential: AssertionCredential = extract_required_field(data, "credential")?;
        Ok(VerifyAssertionRequest { email, credential })
    }
}
