//! `WebAuthn` data types exchanged with the browser
//!
//! Option bundles serialize with the camelCase names the
//! `navigator.credentials` API expects. Client responses are parsed into
//! one type per ceremony at the HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::store::{CredentialBlob, Identity};

/// Public key credential type; the only one `WebAuthn` defines
pub const PUBLIC_KEY_TYPE: &str = "public-key";

/// Ceremony a challenge is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Get,
}

impl Operation {
    /// The `type` member browsers write into `clientDataJSON`
    #[must_use]
    pub fn client_data_type(self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Get => f.write_str("get"),
        }
    }
}

/// `PublicKeyCredentialCreationOptions`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    pub challenge: String, // Base64URL-encoded 32-byte challenge
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    pub authenticator_selection: AuthenticatorSelectionCriteria,
    pub timeout: u32,        // Milliseconds
    pub attestation: String, // "none"
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,
}

/// `PublicKeyCredentialRequestOptions`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: String, // Base64URL-encoded 32-byte challenge
    pub rp_id: String,
    pub user_verification: String,
    pub timeout: u32,
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RelyingParty {
    pub name: String,
    pub id: String, // Host name, no port
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

impl UserEntity {
    /// Authenticators may truncate or compare short user handles
    /// inconsistently, so the numeric id is zero-padded to 64 characters.
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        let display_name = if identity.name.trim().is_empty() {
            identity.email.clone()
        } else {
            identity.name.clone()
        };
        Self {
            id: format!("{:0>64}", identity.id),
            name: identity.email.clone(),
            display_name,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyCredentialParameters {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub alg: i32, // COSE algorithm identifier
}

impl PublicKeyCredentialParameters {
    /// ES256 then RS256
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [-7, -257]
            .into_iter()
            .map(|alg| Self {
                credential_type: PUBLIC_KEY_TYPE.to_string(),
                alg,
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>, // "platform", "cross-platform"
    pub user_verification: String,
    pub require_resident_key: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyCredentialDescriptor {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

/// Credential returned by `navigator.credentials.create()`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredential {
    pub id: String,
    #[serde(default)]
    pub raw_id: Option<String>,
    #[serde(rename = "type", default = "default_credential_type")]
    pub credential_type: String,
    pub response: AttestationResponse,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Vec<String>,
}

/// Credential returned by `navigator.credentials.get()`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssertionCredential {
    pub id: String,
    #[serde(default)]
    pub raw_id: Option<String>,
    #[serde(rename = "type", default = "default_credential_type")]
    pub credential_type: String,
    pub response: AssertionResponse,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default)]
    pub user_handle: Option<String>,
}

fn default_credential_type() -> String {
    PUBLIC_KEY_TYPE.to_string()
}

impl RegistrationCredential {
    /// The material persisted for this credential
    #[must_use]
    pub fn to_blob(&self) -> CredentialBlob {
        CredentialBlob {
            id: self.id.clone(),
            raw_id: self.raw_id.clone().unwrap_or_else(|| self.id.clone()),
            credential_type: self.credential_type.clone(),
            transports: self.response.transports.clone(),
            attestation_object: self.response.attestation_object.clone(),
            client_data_json: self.response.client_data_json.clone(),
        }
    }
}

impl From<&CredentialBlob> for PublicKeyCredentialDescriptor {
    fn from(blob: &CredentialBlob) -> Self {
        Self {
            credential_type: PUBLIC_KEY_TYPE.to_string(),
            id: blob.raw_id.clone(),
            transports: blob.transports.clone(),
        }
    }
}

/// Identity proven by a successful assertion, handed to session issuance
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<Identity> for VerifiedIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
        }
    }
}
