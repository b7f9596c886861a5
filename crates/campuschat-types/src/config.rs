//! Application configuration types for campuschat.
//!
//! `AppConfig` mirrors `campuschat.toml`. Every field has a default so a
//! partial (or absent) file still yields a runnable configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// When absent, verification codes are written to the log instead of mailed.
    pub smtp: Option<SmtpConfig>,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Adds `Secure` to the session cookie.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://campuschat.db".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret; at least 32 bytes.
    pub session_secret: Option<String>,
    pub session_ttl_days: i64,
    pub challenge_ttl_minutes: i64,
    pub otp_length: usize,
    /// When set, signup is limited to addresses at this domain.
    pub allowed_email_domain: Option<String>,
    pub purge_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_days: 28,
            challenge_ttl_minutes: 10,
            otp_length: 6,
            allowed_email_domain: None,
            purge_interval_secs: 300,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &self.session_secret.as_ref().map(|_| "[REDACTED]"))
            .field("session_ttl_days", &self.session_ttl_days)
            .field("challenge_ttl_minutes", &self.challenge_ttl_minutes)
            .field("otp_length", &self.otp_length)
            .field("allowed_email_domain", &self.allowed_email_domain)
            .field("purge_interval_secs", &self.purge_interval_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: "campuschat".to_string(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    /// Closed allow-list of model names a turn may request.
    pub allowed_models: Vec<String>,
    /// Model used for the one-shot title request.
    pub title_model: String,
    /// IANA zone name for the time stated in the system instruction.
    pub timezone: String,
    pub max_output_tokens: u32,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            default_model: "gemini-1.5-flash".to_string(),
            allowed_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-8b".to_string(),
                "gemini-2.0-flash-exp".to_string(),
            ],
            title_model: "gemini-1.5-flash-8b".to_string(),
            timezone: "UTC".to_string(),
            max_output_tokens: 8192,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("allowed_models", &self.allowed_models)
            .field("title_model", &self.title_model)
            .field("timezone", &self.timezone)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.session_ttl_days, 28);
        assert_eq!(config.auth.challenge_ttl_minutes, 10);
        assert_eq!(config.auth.otp_length, 6);
        assert!(config.smtp.is_none());
        assert_eq!(config.generation.default_model, "gemini-1.5-flash");
        assert!(
            config
                .generation
                .allowed_models
                .contains(&config.generation.default_model)
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[server]
port = 8080

[auth]
allowed_email_domain = "inst.edu"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.allowed_email_domain.as_deref(), Some("inst.edu"));
        assert_eq!(config.auth.session_ttl_days, 28);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.auth.session_secret = Some("super-secret-signing-key".to_string());
        config.generation.api_key = Some("AIza-key".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(!rendered.contains("AIza-key"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
