//! HTTP response helpers
//!
//! Every error leaves the service as a JSON body of the form
//! `{"error": <code>, "message": <text>}` so clients can branch on the code
//! and show the message.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde_json::{json, Value};

/// Generic message for every rejected biometric completion
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Unified response builder for the JSON API
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// `BadRequest` (400)
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    /// `Unauthorized` (401)
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// `NotFound` (404)
    #[must_use]
    pub fn not_found() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::NotFound)
    }

    /// `Conflict` (409)
    #[must_use]
    pub fn conflict() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Conflict)
    }

    /// `InternalServerError` (500)
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// OK (200) with JSON content
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }

    // ===============================
    // CONVENIENCE METHODS
    // ===============================

    /// Common validation error: missing field
    #[must_use]
    pub fn missing_field(field_name: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("missing_field")
            .with_message(&format!("Missing required field: {field_name}"))
            .build()
    }

    /// Common validation error: invalid field
    #[must_use]
    pub fn invalid_field(field_name: &str, reason: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("invalid_field")
            .with_message(&format!("Invalid {field_name}: {reason}"))
            .build()
    }

    /// The single rejection every failed biometric check collapses into
    #[must_use]
    pub fn authentication_failed() -> ErrorResponseBuilder {
        Self::unauthorized()
            .with_error_code("authentication_failed")
            .with_message(AUTHENTICATION_FAILED)
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
    cookies: Vec<Cookie<'static>>,
}

/// Builder for JSON success responses
pub struct JsonResponseBuilder {
    status_code: StatusCode,
    cookies: Vec<Cookie<'static>>,
}

#[derive(Clone, Copy)]
enum ErrorType {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    InternalServerError,
}

impl ErrorType {
    fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn default_code(self) -> &'static str {
        match self {
            Self::BadRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InternalServerError => "server_error",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request is malformed or invalid",
            Self::Unauthorized => "Authentication is required to access this resource",
            Self::NotFound => "The requested resource was not found",
            Self::Conflict => "The resource already exists",
            Self::InternalServerError => "An internal server error occurred",
        }
    }
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
            cookies: Vec::new(),
        }
    }

    /// Set a custom error code (e.g. "`missing_field`", "`user_exists`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Attach a cookie, typically a removal cookie for spent state
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let body = json!({
            "error": self.error_code.as_deref().unwrap_or(self.error_type.default_code()),
            "message": self.message.as_deref().unwrap_or(self.error_type.default_message()),
        });

        let mut response = HttpResponse::build(self.error_type.status());
        for cookie in self.cookies {
            response.cookie(cookie);
        }
        response
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(body)
    }
}

impl JsonResponseBuilder {
    fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json(self, data: &Value) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code);
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.json(data)
    }
}
