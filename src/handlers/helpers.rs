// Helper functions shared by the API handlers
use actix_web::{
    cookie::Cookie,
    error::{InternalError, JsonPayloadError},
    http::header, web, HttpRequest, HttpResponse,
};

use crate::app::AppContext;
use crate::biometric::BiometricError;
use crate::utils::responses::{ErrorResponseBuilder, ResponseBuilder};

/// Host the browser addressed, without the port. This becomes the
/// relying-party id; `None` falls back to the configured one.
#[must_use]
pub fn request_host(req: &HttpRequest) -> Option<String> {
    let host = req.headers().get(header::HOST)?.to_str().ok()?.trim();
    let host = match host.strip_prefix('[') {
        // IPv6 literal, e.g. [::1]:8080
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => host.split(':').next().unwrap_or(host),
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Spend the challenge binding a request carries, if any.
///
/// Completions rejected before they reach a flow go through here, so a
/// binding can never outlive a failed attempt.
pub fn spend_presented_binding(req: &HttpRequest, context: &AppContext) {
    let Some(binding) = context.cookies.read_challenge_cookie(req) else {
        return;
    };
    match context.biometrics.challenges().consume(&binding) {
        Ok(spent) => log::debug!(
            "Spent {} challenge for user {} on a rejected request",
            spent.operation,
            spent.identity_id
        ),
        Err(e) => log::debug!("Presented challenge binding not spendable: {e}"),
    }
}

fn invalid_json_response(error: &JsonPayloadError) -> ErrorResponseBuilder {
    log::debug!("Rejected request body: {error}");
    ResponseBuilder::bad_request()
        .with_error_code("invalid_json")
        .with_message("Request body is not valid JSON")
}

/// JSON extractor settings for every endpoint: unparseable bodies get the
/// usual `{error, message}` shape
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = invalid_json_response(&err).build();
        InternalError::from_response(err, response).into()
    })
}

/// JSON extractor settings for the completion endpoints. An unparseable body
/// also spends the challenge binding and clears its cookie.
#[must_use]
pub fn completion_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        let mut response = invalid_json_response(&err);
        if let Some(context) = req.app_data::<web::Data<AppContext>>() {
            spend_presented_binding(req, context);
            response = response.with_cookie(context.cookies.clear_challenge_cookie());
        }
        InternalError::from_response(err, response.build()).into()
    })
}

/// Convert a `BiometricError` into the response the client sees.
///
/// Every authentication failure gets the same 401 body so the client cannot
/// tell which check failed. `clear` is attached to every response, so a
/// spent challenge binding is always removed from the browser.
#[must_use]
pub fn biometric_error_response(error: &BiometricError, clear: Option<Cookie<'static>>) -> HttpResponse {
    if error.is_authentication_failure() {
        let mut response = ResponseBuilder::authentication_failed();
        if let Some(cookie) = clear {
            response = response.with_cookie(cookie);
        }
        return response.build();
    }

    let mut response = match error {
        BiometricError::Validation(message) => ResponseBuilder::bad_request()
            .with_error_code("invalid_request")
            .with_message(message),
        BiometricError::IdentityNotFound => ResponseBuilder::not_found()
            .with_error_code("user_not_found")
            .with_message("User not found"),
        BiometricError::NoCredentials => ResponseBuilder::bad_request()
            .with_error_code("no_credentials")
            .with_message("No biometric credentials registered for this user"),
        BiometricError::DuplicateCredential => ResponseBuilder::conflict()
            .with_error_code("credential_exists")
            .with_message("This biometric credential is already registered"),
        _ => ResponseBuilder::internal_server_error()
            .with_error_code("internal_error")
            .with_message("An internal error occurred"),
    };
    if let Some(cookie) = clear {
        response = response.with_cookie(cookie);
    }
    response.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometric::ChallengeError;
    use crate::store::StoreError;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    #[test]
    fn test_request_host_strips_port() {
        let req = TestRequest::default()
            .insert_header((header::HOST, "App.Example:8443"))
            .to_http_request();
        assert_eq!(request_host(&req).as_deref(), Some("app.example"));

        let req = TestRequest::default()
            .insert_header((header::HOST, "[::1]:8080"))
            .to_http_request();
        assert_eq!(request_host(&req).as_deref(), Some("::1"));

        let req = TestRequest::default().to_http_request();
        assert_eq!(request_host(&req), None);
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (BiometricError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (BiometricError::IdentityNotFound, StatusCode::NOT_FOUND),
            (BiometricError::NoCredentials, StatusCode::BAD_REQUEST),
            (BiometricError::DuplicateCredential, StatusCode::CONFLICT),
            (BiometricError::CredentialNotFound, StatusCode::UNAUTHORIZED),
            (
                BiometricError::ChallengeInvalid(ChallengeError::Replayed),
                StatusCode::UNAUTHORIZED,
            ),
            (
                BiometricError::WrongOperation {
                    expected: "webauthn.get",
                    actual: "webauthn.create".into(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                BiometricError::Storage(StoreError::NotFound("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(biometric_error_response(&error, None).status(), status, "{error}");
        }
    }

    #[actix_web::test]
    async fn test_spend_presented_binding_consumes_cookie_binding() {
        let (_database, context) = crate::testing::TestFixtures::app_context().await;
        let issued = context
            .biometrics
            .challenges()
            .issue(1, crate::biometric::Operation::Create)
            .unwrap();

        let req = TestRequest::default()
            .cookie(context.cookies.create_challenge_cookie(&issued.binding))
            .to_http_request();
        spend_presented_binding(&req, &context);

        assert_eq!(
            context.biometrics.challenges().consume(&issued.binding),
            Err(ChallengeError::Replayed)
        );
    }

    #[test]
    fn test_clear_cookie_is_attached() {
        let response = biometric_error_response(
            &BiometricError::ChallengeInvalid(ChallengeError::Expired),
            Some(Cookie::new("bioauth_challenge", "")),
        );
        assert_eq!(response.cookies().count(), 1);
    }
}
