use serde::Deserialize;

use crate::biometric::errors::{BiometricError, ChallengeError};
use crate::utils::crypto::decode_base64_any;

/// The members of `clientDataJSON` this service checks
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientData {
    /// `webauthn.create` or `webauthn.get`, as declared by the client
    #[serde(rename = "type")]
    pub operation_type: String,
    pub challenge: String,
    #[serde(default)]
    pub origin: Option<String>,
}

impl ClientData {
    /// Decode and parse a base64-encoded `clientDataJSON`
    ///
    /// # Errors
    ///
    /// Returns `BiometricError::Validation` if the payload is not base64 or
    /// not a JSON object with `type` and `challenge`
    pub fn decode(encoded: &str) -> Result<Self, BiometricError> {
        let bytes = decode_base64_any(encoded)
            .map_err(|_| BiometricError::Validation("Invalid client data encoding".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| BiometricError::Validation("Invalid client data format".into()))
    }

    /// Check the declared origin against the configured allow-list.
    /// An empty allow-list accepts any origin.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeError::OriginMismatch` when pinning is configured
    /// and the origin is absent, unparsable, or not listed
    pub fn verify_origin(&self, allowed_origins: &[String]) -> Result<(), ChallengeError> {
        if allowed_origins.is_empty() {
            return Ok(());
        }

        let origin = self
            .origin
            .as_deref()
            .and_then(|o| url::Url::parse(o).ok())
            .map(|u| u.origin())
            .ok_or(ChallengeError::OriginMismatch)?;

        let allowed = allowed_origins
            .iter()
            .filter_map(|o| url::Url::parse(o).ok())
            .any(|u| u.origin() == origin);

        if allowed {
            Ok(())
        } else {
            Err(ChallengeError::OriginMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    fn encode(json: &str) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_decode_url_safe_and_standard() {
        let json = r#"{"type":"webauthn.get","challenge":"abc","origin":"https://app.example"}"#;
        let url_safe = ClientData::decode(&encode(json)).unwrap();
        let standard = ClientData::decode(&general_purpose::STANDARD.encode(json)).unwrap();

        assert_eq!(url_safe, standard);
        assert_eq!(url_safe.operation_type, "webauthn.get");
        assert_eq!(url_safe.challenge, "abc");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ClientData::decode("%%%"),
            Err(BiometricError::Validation(_))
        ));
        assert!(matches!(
            ClientData::decode(&encode(r#"{"challenge":"abc"}"#)),
            Err(BiometricError::Validation(_))
        ));
    }

    #[test]
    fn test_origin_pinning() {
        let data = ClientData::decode(&encode(
            r#"{"type":"webauthn.get","challenge":"abc","origin":"https://app.example:8443"}"#,
        ))
        .unwrap();

        assert!(data.verify_origin(&[]).is_ok());
        assert!(data
            .verify_origin(&["https://app.example:8443/".to_string()])
            .is_ok());
        assert_eq!(
            data.verify_origin(&["https://app.example".to_string()]),
            Err(ChallengeError::OriginMismatch)
        );

        let no_origin =
            ClientData::decode(&encode(r#"{"type":"webauthn.get","challenge":"abc"}"#)).unwrap();
        assert_eq!(
            no_origin.verify_origin(&["https://app.example".to_string()]),
            Err(ChallengeError::OriginMismatch)
        );
    }
}
