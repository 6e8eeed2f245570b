//! Builders for browser-side credential responses
//!
//! These produce what `navigator.credentials.create()` and `.get()` hand
//! back to the page, with a `clientDataJSON` the flows will accept unless a
//! builder method deliberately changes it.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};

use super::constants::TEST_ORIGIN;
use crate::biometric::{
    AssertionCredential, AssertionResponse, AttestationResponse, RegistrationCredential,
};

/// Encode a `clientDataJSON` blob as a browser would
#[must_use]
pub fn client_data_json(operation_type: &str, challenge: &str, origin: &str) -> String {
    let client_data = json!({
        "type": operation_type,
        "challenge": challenge,
        "origin": origin,
        "crossOrigin": false,
    });
    general_purpose::URL_SAFE_NO_PAD.encode(client_data.to_string())
}

/// Builder for a registration (attestation) response
#[derive(Debug, Clone)]
pub struct RegistrationCredentialBuilder {
    id: String,
    raw_id: Option<String>,
    operation_type: String,
    challenge: String,
    origin: String,
    transports: Vec<String>,
}

impl RegistrationCredentialBuilder {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            raw_id: Some(id.to_string()),
            operation_type: "webauthn.create".to_string(),
            challenge: String::new(),
            origin: TEST_ORIGIN.to_string(),
            transports: vec!["internal".to_string()],
        }
    }

    #[must_use]
    pub fn challenge(mut self, challenge: &str) -> Self {
        self.challenge = challenge.to_string();
        self
    }

    /// Override the `type` the client declares
    #[must_use]
    pub fn client_data_type(mut self, operation_type: &str) -> Self {
        self.operation_type = operation_type.to_string();
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    #[must_use]
    pub fn raw_id(mut self, raw_id: &str) -> Self {
        self.raw_id = Some(raw_id.to_string());
        self
    }

    #[must_use]
    pub fn transports(mut self, transports: &[&str]) -> Self {
        self.transports = transports.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn build(self) -> RegistrationCredential {
        RegistrationCredential {
            id: self.id,
            raw_id: self.raw_id,
            credential_type: "public-key".to_string(),
            response: AttestationResponse {
                client_data_json: client_data_json(
                    &self.operation_type,
                    &self.challenge,
                    &self.origin,
                ),
                // CBOR map {"fmt": "none"}; never parsed server side
                attestation_object: "oWNmbXRkbm9uZQ".to_string(),
                transports: self.transports,
            },
        }
    }

    /// The credential as the page would post it
    ///
    /// # Panics
    ///
    /// Never in practice; the credential types always serialize
    #[must_use]
    pub fn to_json(self) -> Value {
        serde_json::to_value(self.build()).expect("credential serializes")
    }
}

/// Builder for an assertion response
#[derive(Debug, Clone)]
pub struct AssertionCredentialBuilder {
    id: String,
    raw_id: Option<String>,
    operation_type: String,
    challenge: String,
    origin: String,
}

impl AssertionCredentialBuilder {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            raw_id: None,
            operation_type: "webauthn.get".to_string(),
            challenge: String::new(),
            origin: TEST_ORIGIN.to_string(),
        }
    }

    #[must_use]
    pub fn challenge(mut self, challenge: &str) -> Self {
        self.challenge = challenge.to_string();
        self
    }

    #[must_use]
    pub fn client_data_type(mut self, operation_type: &str) -> Self {
        self.operation_type = operation_type.to_string();
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    #[must_use]
    pub fn raw_id(mut self, raw_id: &str) -> Self {
        self.raw_id = Some(raw_id.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> AssertionCredential {
        AssertionCredential {
            id: self.id,
            raw_id: self.raw_id,
            credential_type: "public-key".to_string(),
            response: AssertionResponse {
                client_data_json: client_data_json(
                    &self.operation_type,
                    &self.challenge,
                    &self.origin,
                ),
                authenticator_data: "SZYN5YgOjGh0NBcPZHZgW4_krrmihjLHmVzzuoMdl2MFAAAAAQ"
                    .to_string(),
                signature: "MEUCIQDx4Jk2c9bWQ3nT0HzV".to_string(),
                user_handle: None,
            },
        }
    }

    /// # Panics
    ///
    /// Never in practice; the credential types always serialize
    #[must_use]
    pub fn to_json(self) -> Value {
        serde_json::to_value(self.build()).expect("credential serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometric::ClientData;

    #[test]
    fn test_client_data_decodes() {
        let credential = RegistrationCredentialBuilder::new("cred-1")
            .challenge("abc")
            .build();
        let client_data = ClientData::decode(&credential.response.client_data_json).unwrap();
        assert_eq!(client_data.operation_type, "webauthn.create");
        assert_eq!(client_data.challenge, "abc");
        assert_eq!(client_data.origin.as_deref(), Some(TEST_ORIGIN));
    }

    #[test]
    fn test_json_uses_browser_field_names() {
        let value = AssertionCredentialBuilder::new("cred-1")
            .challenge("abc")
            .to_json();
        assert_eq!(value["type"], "public-key");
        assert!(value["response"]["clientDataJSON"].is_string());
        assert!(value["response"]["authenticatorData"].is_string());
    }
}
