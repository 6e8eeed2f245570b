//! Password account handlers: sign-up, login, session lookup and logout

use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde_json::{json, Value};

use crate::app::AppContext;
use crate::biometric::VerifiedIdentity;
use crate::session::AuthMethod;
use crate::store::StoreError;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use crate::validation::AccountRequestValidator;

/// Create a password account
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn register(
    data: web::Json<Value>,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    let request = match AccountRequestValidator::validate_register(&data) {
        Ok(request) => request,
        Err(response) => return Ok(response),
    };

    match context
        .identities
        .create(&request.name, &request.email, &request.password)
        .await
    {
        Ok(identity) => {
            log::info!("Created account {} for {}", identity.id, identity.email);
            Ok(ResponseBuilder::ok().json(&json!({
                "user": identity,
                "message": "User created successfully",
            })))
        }
        Err(StoreError::IdentityExists(_)) => Ok(ResponseBuilder::conflict()
            .with_error_code("user_exists")
            .with_message("User already exists")
            .build()),
        Err(e) => {
            log::error!("Failed to create account for {}: {e}", request.email);
            Ok(ResponseBuilder::internal_server_error().build())
        }
    }
}

/// Log in with email and password
///
/// # Errors
///
/// Never fails at the actix level; failures are JSON error responses
pub async fn login(data: web::Json<Value>, context: web::Data<AppContext>) -> Result<HttpResponse> {
    let request = match AccountRequestValidator::validate_login(&data) {
        Ok(request) => request,
        Err(response) => return Ok(response),
    };

    let identity = match context
        .identities
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            LoggingHelper::log_password_login(&request.email, false);
            return Ok(ResponseBuilder::unauthorized()
                .with_error_code("invalid_credentials")
                .with_message("Invalid email or password")
                .build());
        }
        Err(e) => {
            log::error!("Password login for {} failed: {e}", request.email);
            return Ok(ResponseBuilder::internal_server_error().build());
        }
    };
    LoggingHelper::log_password_login(&request.email, true);

    let verified = VerifiedIdentity::from(identity);
    match context.sessions.issue(&verified, AuthMethod::Password) {
        Ok(cookie) => {
            LoggingHelper::log_session_created(&verified.email, AuthMethod::Password.as_str());
            Ok(ResponseBuilder::ok().with_cookie(cookie).json(&json!({
                "success": true,
                "user": verified,
            })))
        }
        Err(e) => {
            log::error!("Failed to issue session for user {}: {e}", verified.id);
            Ok(ResponseBuilder::internal_server_error()
                .with_error_code("session_creation_failed")
                .with_message("Failed to create session")
                .build())
        }
    }
}

/// Return the claims of the current session
///
/// # Errors
///
/// Never fails at the actix level; a missing session is a 401 response
pub async fn current_session(
    req: HttpRequest,
    context: web::Data<AppContext>,
) -> Result<HttpResponse> {
    match context.sessions.current(&req) {
        Some(claims) => Ok(ResponseBuilder::ok().json(&json!(claims))),
        None => Ok(ResponseBuilder::unauthorized().build()),
    }
}

/// End the current session
///
/// # Errors
///
/// Never fails
pub async fn logout(context: web::Data<AppContext>) -> Result<HttpResponse> {
    Ok(ResponseBuilder::ok()
        .with_cookie(context.sessions.revoke())
        .json(&json!({ "success": true })))
}
