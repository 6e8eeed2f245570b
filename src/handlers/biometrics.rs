//! Biometric request handlers
//!
//! Thin adapters between the JSON API and [`BiometricService`]. The challenge
//! binding travels in the `bioauth_challenge` cookie: set when options are
//! issued, spent by every completion attempt, and cleared on every completion
//! response, success or not.
//!
//! [`BiometricService`]: crate::biometric::BiometricService

use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde_json::{json, Value};

use crate::app::AppContext;
use crate::biometric::Operation;
use crate::handlers::helpers::{
    biometric_error_response, request_host, spend_presented_binding,
};
use crate::session::AuthMethod;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use crate::validation::BiometricRequestValidator;

/// Report whether a user has biometrics registered
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn check_biometrics(
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let email = match BiometricRequestValidator::validate_email_request(&data) {
        Ok(email) => email,
        Err(response) => return Ok(response),
    };

    match context.biometrics.check(&email).await {
        Ok(status) => Ok(ResponseBuilder::ok().json(&json!(status))),
        Err(e) => Ok(biometric_error_response(&e, None)),
    }
}

/// Issue credential creation options and set the challenge cookie
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn start_registration(
    req: HttpRequest,
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let email = match BiometricRequestValidator::validate_email_request(&data) {
        Ok(email) => email,
        Err(response) => return Ok(response),
    };

    let host = request_host(&req);
    match context
        .biometrics
        .registration()
        .begin(&email, host.as_deref())
        .await
    {
        Ok(start) => Ok(ResponseBuilder::ok()
            .with_cookie(context.cookies.create_challenge_cookie(&start.binding))
            .json(&json!({
                "options": start.options,
                "userId": start.identity_id,
            }))),
        Err(e) => {
            LoggingHelper::log_flow_rejected(Operation::Create, &email, &e);
            Ok(biometric_error_response(&e, None))
        }
    }
}

/// Verify a creation response and store the credential
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn complete_registration(
    req: HttpRequest,
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let clear = context.cookies.clear_challenge_cookie();

    let request = match BiometricRequestValidator::validate_store_request(&data) {
        Ok(request) => request,
        Err(mut response) => {
            spend_presented_binding(&req, &context);
            if let Err(e) = response.add_cookie(&clear) {
                log::warn!("Failed to clear challenge cookie: {e}");
            }
            return Ok(response);
        }
    };

    let binding = context.cookies.read_challenge_cookie(&req);
    match context
        .biometrics
        .registration()
        .complete(binding.as_deref(), &request.email, &request.credential)
        .await
    {
        Ok(credential_id) => Ok(ResponseBuilder::ok().with_cookie(clear).json(&json!({
            "success": true,
            "message": "Biometric credential registered",
            "credentialId": credential_id,
        }))),
        Err(e) => {
            LoggingHelper::log_flow_rejected(Operation::Create, &request.email, &e);
            Ok(biometric_error_response(&e, Some(clear)))
        }
    }
}

/// Issue credential request options and set the challenge cookie
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn start_assertion(
    req: HttpRequest,
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let email = match BiometricRequestValidator::validate_email_request(&data) {
        Ok(email) => email,
        Err(response) => return Ok(response),
    };

    let host = request_host(&req);
    match context
        .biometrics
        .assertion()
        .begin(&email, host.as_deref())
        .await
    {
        Ok(start) => Ok(ResponseBuilder::ok()
            .with_cookie(context.cookies.create_challenge_cookie(&start.binding))
            .json(&json!({ "options": start.options }))),
        Err(e) => {
            LoggingHelper::log_flow_rejected(Operation::Get, &email, &e);
            Ok(biometric_error_response(&e, None))
        }
    }
}

/// Verify an assertion and issue a session
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn complete_assertion(
    req: HttpRequest,
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let clear = context.cookies.clear_challenge_cookie();

    let request = match BiometricRequestValidator::validate_verify_request(&data) {
        Ok(request) => request,
        Err(mut response) => {
            spend_presented_binding(&req, &context);
            if let Err(e) = response.add_cookie(&clear) {
                log::warn!("Failed to clear challenge cookie: {e}");
            }
            return Ok(response);
        }
    };

    let binding = context.cookies.read_challenge_cookie(&req);
    let verified = match context
        .biometrics
        .assertion()
        .complete(binding.as_deref(), &request.email, &request.credential)
        .await
    {
        Ok(verified) => verified,
        Err(e) => {
            LoggingHelper::log_flow_rejected(Operation::Get, &request.email, &e);
            return Ok(biometric_error_response(&e, Some(clear)));
        }
    };

    let session_cookie = match context.sessions.issue(&verified, AuthMethod::Biometric) {
        Ok(cookie) => cookie,
        Err(e) => {
            log::error!("Failed to issue session for user {}: {e}", verified.id);
            return Ok(ResponseBuilder::internal_server_error()
                .with_error_code("session_creation_failed")
                .with_message("Failed to create session")
                .with_cookie(clear)
                .build());
        }
    };
    LoggingHelper::log_session_created(&verified.email, AuthMethod::Biometric.as_str());

    Ok(ResponseBuilder::ok()
        .with_cookie(clear)
        .with_cookie(session_cookie)
        .json(&json!({
            "success": true,
            "message": "Biometric authentication successful",
            "userId": verified.id,
            "name": verified.name,
            "email": verified.email,
        })))
}
