//! Testing utilities for bioauth
//!
//! Available to unit tests and, with the `testing` feature, to the
//! integration tests under `tests/`.
//!
//! - [`fixtures`] - Settings, in-memory databases and a ready-to-use [`TestEnvironment`]
//! - [`builders`] - Builders for the credentials a browser would return
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bioauth::testing::{RegistrationCredentialBuilder, TestEnvironment};
//!
//! let env = TestEnvironment::new().await;
//! let start = env.service.registration().begin(&env.identity.email, None).await?;
//! let credential = RegistrationCredentialBuilder::new("cred-1")
//!     .challenge(&start.options.challenge)
//!     .build();
//! ```

pub mod builders;
pub mod fixtures;

// Re-export commonly used items for convenience
pub use builders::{client_data_json, AssertionCredentialBuilder, RegistrationCredentialBuilder};
pub use fixtures::{TestEnvironment, TestFixtures};

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "a@x.com";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "Alice";

    /// Default test password
    pub const TEST_PASSWORD: &str = "correct-horse-battery";

    /// Fixed secret so sealed bindings and cookies are reproducible across a test
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-for-bioauth-32b";

    /// Origin the test browser claims in its client data
    pub const TEST_ORIGIN: &str = "http://localhost:8080";
}
