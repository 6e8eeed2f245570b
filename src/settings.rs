use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BioauthSettings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub webauthn: WebAuthnSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite://db/auth.db?mode=rwc`
    pub url: String,
    pub max_connections: u32,
}

/// Relying-party and ceremony settings for biometric (`WebAuthn`) flows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebAuthnSettings {
    /// Fallback relying-party id when the request carries no usable `Host`
    pub rp_id: String,
    pub rp_name: String,
    /// Ceremony timeout advertised to the browser, in milliseconds
    pub timeout_ms: u32,
    /// Validity window of an issued challenge
    pub challenge_ttl_seconds: i64,
    pub user_verification: String,
    pub authenticator_attachment: Option<String>,
    /// When non-empty, client data origins must match one of these
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Secret used to seal challenge bindings and session cookies
    pub session_secret: String,
    pub session_duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://db/auth.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for WebAuthnSettings {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Biometric Auth App".to_string(),
            timeout_ms: 60_000,
            challenge_ttl_seconds: 300,
            user_verification: "required".to_string(),
            authenticator_attachment: Some("platform".to_string()),
            allowed_origins: Vec::new(),
        }
    }
}

impl WebAuthnSettings {
    /// Longest challenge validity window accepted from configuration
    pub const MAX_CHALLENGE_TTL_SECONDS: i64 = 3600;

    /// Challenge validity window, clamped to `1..=MAX_CHALLENGE_TTL_SECONDS`
    #[must_use]
    pub fn challenge_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            self.challenge_ttl_seconds
                .clamp(1, Self::MAX_CHALLENGE_TTL_SECONDS),
        )
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty
            session_duration_hours: 24,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BioauthSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;

        Ok(settings)
    }

    /// Reject values that would make the service unusable
    ///
    /// # Errors
    ///
    /// Returns an error if `webauthn.challenge_ttl_seconds` is not positive or
    /// exceeds [`WebAuthnSettings::MAX_CHALLENGE_TTL_SECONDS`]
    pub fn validate(&self) -> Result<(), String> {
        let ttl = self.webauthn.challenge_ttl_seconds;
        if !(1..=WebAuthnSettings::MAX_CHALLENGE_TTL_SECONDS).contains(&ttl) {
            return Err(format!(
                "webauthn.challenge_ttl_seconds must be between 1 and {}, got {ttl}",
                WebAuthnSettings::MAX_CHALLENGE_TTL_SECONDS
            ));
        }
        Ok(())
    }

    /// Load the `.env` file and initialize logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `BIOAUTH_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(&default_config_path)?;
            log::info!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("BIOAUTH_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                log::info!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ℹ BIOAUTH_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file; sections and keys it omits keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_database_env_overrides(&mut settings.database);
        Self::apply_webauthn_env_overrides(&mut settings.webauthn);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    fn apply_database_env_overrides(database_settings: &mut DatabaseSettings) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            database_settings.url = url;
        }
    }

    fn apply_webauthn_env_overrides(webauthn_settings: &mut WebAuthnSettings) {
        if let Ok(rp_id) = std::env::var("RP_ID") {
            webauthn_settings.rp_id = rp_id;
        }
        if let Ok(rp_name) = std::env::var("RP_NAME") {
            webauthn_settings.rp_name = rp_name;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value_str) = std::env::var("SESSION_DURATION_HOURS") {
            if let Ok(value) = value_str.parse::<u64>() {
                session_settings.session_duration_hours = value;
            }
        }

        Self::handle_session_secret_override(session_settings);
    }

    /// Apply `SESSION_SECRET`, generating a random secret when none is configured
    fn handle_session_secret_override(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// Generate 32 bytes (256 bits) of entropy for AES-256 compatibility
    fn generate_random_session_secret() -> String {
        let secret = crate::utils::crypto::random_bytes::<32>();
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        log::warn!("⚠️  Using auto-generated session secret");
        log::warn!("🔒 For production use, set the SESSION_SECRET environment variable");
        log::warn!("   or configure session_secret in Settings.toml");
        log::warn!("💡 Sessions and pending challenges are invalidated on each restart");
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        for var in [
            "SESSION_SECRET",
            "SESSION_DURATION_HOURS",
            "BIOAUTH_SECRETS_DIR",
            "DATABASE_URL",
            "RP_ID",
            "RP_NAME",
            "COOKIE_SECURE",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = BioauthSettings::default();
        assert_eq!(settings.webauthn.challenge_ttl_seconds, 300);
        assert_eq!(settings.webauthn.timeout_ms, 60_000);
        assert_eq!(settings.webauthn.user_verification, "required");
        assert_eq!(settings.session.session_secret, "");
        assert!(settings.cookies.secure);
    }

    #[test]
    #[serial]
    fn test_session_secret_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_secret: "default-secret".to_string(),
            session_duration_hours: 24,
        };

        std::env::set_var("SESSION_SECRET", "env-override-secret");
        BioauthSettings::apply_session_env_overrides(&mut session_settings);
        assert_eq!(session_settings.session_secret, "env-override-secret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_session_secret_is_generated() {
        clean_env_vars();

        let mut session_settings = SessionSettings::default();
        BioauthSettings::apply_session_env_overrides(&mut session_settings);

        let decoded = general_purpose::STANDARD
            .decode(&session_settings.session_secret)
            .expect("generated secret should be base64");
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    #[serial]
    fn test_webauthn_and_database_env_overrides() {
        clean_env_vars();

        std::env::set_var("RP_ID", "auth.example.com");
        std::env::set_var("DATABASE_URL", "sqlite::memory:");
        std::env::set_var("COOKIE_SECURE", "false");

        let mut settings = BioauthSettings::default();
        BioauthSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.webauthn.rp_id, "auth.example.com");
        assert_eq!(settings.database.url, "sqlite::memory:");
        assert!(!settings.cookies.secure);

        clean_env_vars();
    }

    #[test]
    fn test_challenge_ttl_out_of_range_is_rejected() {
        let mut settings = BioauthSettings::default();
        assert!(settings.validate().is_ok());

        for ttl in [0, -5, i64::MAX] {
            settings.webauthn.challenge_ttl_seconds = ttl;
            assert!(settings.validate().is_err(), "ttl {ttl}");
        }
    }

    #[test]
    fn test_challenge_ttl_is_clamped() {
        let mut webauthn = WebAuthnSettings::default();
        assert_eq!(webauthn.challenge_ttl().num_seconds(), 300);

        webauthn.challenge_ttl_seconds = -1;
        assert_eq!(webauthn.challenge_ttl().num_seconds(), 1);

        webauthn.challenge_ttl_seconds = i64::MAX;
        assert_eq!(
            webauthn.challenge_ttl().num_seconds(),
            WebAuthnSettings::MAX_CHALLENGE_TTL_SECONDS
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[webauthn]\nrp_id = \"example.org\"\n\n[cookies]\nsecure = false").unwrap();

        let settings = BioauthSettings::from_toml_file(&path).unwrap();
        assert_eq!(settings.webauthn.rp_id, "example.org");
        assert_eq!(settings.webauthn.rp_name, "Biometric Auth App");
        assert!(!settings.cookies.secure);
        assert_eq!(settings.application.port, 8080);
    }

    #[test]
    fn test_cors_origins_parsing() {
        let mut settings = BioauthSettings::default();
        settings.application.cors_origins = "https://a.example, https://b.example,".to_string();
        assert_eq!(
            settings.get_cors_origins(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
