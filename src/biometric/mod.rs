//! Biometric (`WebAuthn`) registration and login
//!
//! This module implements the challenge/response half of `WebAuthn`:
//! issuing random challenges bound to an identity and a ceremony, handing
//! the browser its options bundle, and checking the returned client data
//! against the binding before storing or accepting a credential.
//!
//! Signature and attestation verification are not performed.
//!
//! # Usage
//!
//! ```rust,no_run
//! use bioauth::biometric::BiometricService;
//!
//! async fn login(service: &BiometricService, binding: &str, credential: &bioauth::biometric::AssertionCredential) {
//!     let _start = service.assertion().begin("a@x.com", None).await;
//!     let _verified = service
//!         .assertion()
//!         .complete(Some(binding), "a@x.com", credential)
//!         .await;
//! }
//! ```

pub mod assertion;
mod ceremony;
pub mod challenge;
pub mod client_data;
pub mod errors;
pub mod registration;
pub mod service;
pub mod types;

pub use assertion::{AssertionFlow, AssertionStart};
pub use challenge::{ChallengeBinding, ChallengeManager, IssuedChallenge, CHALLENGE_SIZE};
pub use client_data::ClientData;
pub use errors::{BiometricError, ChallengeError};
pub use registration::{RegistrationFlow, RegistrationStart};
pub use service::{BiometricService, BiometricStatus};
pub use types::{
    AssertionCredential, AssertionResponse, AttestationResponse, CreationOptions, Operation,
    PublicKeyCredentialDescriptor, RegistrationCredential, RequestOptions, VerifiedIdentity,
};
