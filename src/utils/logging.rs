// Centralized logging for the authentication flows
use log::{error, info, warn};

use crate::biometric::{BiometricError, Operation};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a challenge being handed out
    pub fn log_challenge_issued(operation: Operation, identity_id: i64, rp_id: &str) {
        info!("🔐 Issued {operation} challenge for user {identity_id} (rp: {rp_id})");
    }

    /// Log a completed registration
    pub fn log_credential_registered(identity_id: i64, credential_id: &str) {
        info!("✅ Registered biometric credential {credential_id} for user {identity_id}");
    }

    /// Log a successful assertion
    pub fn log_assertion_verified(identity_id: i64, credential_id: &str) {
        info!("✅ Biometric login for user {identity_id} with credential {credential_id}");
    }

    /// Log a rejected completion with its precise cause. The cause stays in
    /// the log; callers only ever see a generic failure.
    pub fn log_flow_rejected(operation: Operation, email: &str, err: &BiometricError) {
        match err {
            BiometricError::Storage(source) => {
                error!("❌ {operation} flow for {email} failed in storage: {source}");
            }
            other => warn!("❌ {operation} flow for {email} rejected: {other}"),
        }
    }

    /// Log a password login attempt outcome
    pub fn log_password_login(email: &str, success: bool) {
        if success {
            info!("✅ Password login for {email}");
        } else {
            warn!("❌ Password login failed for {email}");
        }
    }

    /// Log session issuance
    pub fn log_session_created(user_email: &str, method: &str) {
        info!("Successfully built session for user: {user_email} (method: {method})");
    }
}
