#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the bioauth application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod biometric;
pub mod handlers;
pub mod session;
pub mod settings;
pub mod store;
pub mod utils;
pub mod validation;

// Testing utilities - available for unit tests and integration tests (with the testing feature)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use app::AppContext;
pub use biometric::{BiometricError, BiometricService, ChallengeManager};
pub use settings::BioauthSettings;
pub use store::Database;
