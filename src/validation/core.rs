//! Validation utilities for extracting data from JSON requests
//!
//! Handlers accept `web::Json<Value>` and pull fields out with these helpers
//! so that a missing or malformed field always produces the same 400 body.

use actix_web::HttpResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::utils::responses::ResponseBuilder;

// ===============================
// COMMON FIELD EXTRACTION PATTERNS
// ===============================

/// Extract a required field from JSON data with automatic type conversion
///
/// # Errors
///
/// Returns a 400 response if the field is missing, null, or cannot be
/// parsed into `T`.
///
/// # Example
///
/// ```rust,no_run
/// use serde_json::{json, Value};
/// use bioauth::validation::extract_required_field;
///
/// let data = json!({"credential": {"id": "cred-1"}});
/// let credential: Value = extract_required_field(&data, "credential").unwrap();
/// ```
pub fn extract_required_field<T: DeserializeOwned>(
    data: &Value,
    field_name: &str,
) -> Result<T, HttpResponse> {
    let field = data
        .get(field_name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ResponseBuilder::missing_field(field_name))?;

    serde_json::from_value(field.clone()).map_err(|e| {
        log::error!("Failed to parse {field_name}: {e}");
        ResponseBuilder::invalid_field(field_name, "Invalid format")
    })
}

/// Extract a required, non-blank string field. The value is trimmed.
///
/// # Errors
///
/// Returns a 400 response if the field is missing, not a string, or blank.
///
/// # Example
///
/// ```rust,no_run
/// use serde_json::json;
/// use bioauth::validation::extract_required_string;
///
/// let email = extract_required_string(&json!({"email": "a@x.com"}), "email").unwrap();
/// assert_eq!(email, "a@x.com");
/// ```
pub fn extract_required_string(data: &Value, field_name: &str) -> Result<String, HttpResponse> {
    data.get(field_name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ResponseBuilder::missing_field(field_name))
}
