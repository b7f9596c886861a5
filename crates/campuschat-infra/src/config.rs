//! Configuration loader for campuschat.
//!
//! Reads a TOML file into [`AppConfig`], then layers environment overrides
//! on top. A missing file yields defaults; a malformed one is an error so a
//! typo never silently disables SMTP or the domain restriction.

use std::path::Path;

use anyhow::{Context, bail};
use campuschat_core::auth::code::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use campuschat_types::config::AppConfig;
use chrono_tz::Tz;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "campuschat.toml";

/// Environment variables that override file values.
pub const ENV_SESSION_SECRET: &str = "CAMPUSCHAT_SESSION_SECRET";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_DATABASE_URL: &str = "CAMPUSCHAT_DATABASE_URL";
pub const ENV_SMTP_PASSWORD: &str = "CAMPUSCHAT_SMTP_PASSWORD";
pub const ENV_EMAIL_DOMAIN: &str = "CAMPUSCHAT_EMAIL_DOMAIN";
pub const ENV_TIMEZONE: &str = "CAMPUSCHAT_TIMEZONE";

/// Upper bounds for the configurable lifetimes.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;
pub const MAX_CHALLENGE_TTL_MINUTES: i64 = 24 * 60;

/// Load configuration from `path` and apply process environment overrides.
pub async fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let mut config = read_config_file(path).await?;
    apply_env_overrides_from(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Reject values that would weaken verification or overflow date arithmetic.
pub fn validate_config(config: &AppConfig) -> anyhow::Result<()> {
    let auth = &config.auth;
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&auth.otp_length) {
        bail!(
            "auth.otp_length must be between {MIN_CODE_LENGTH} and {MAX_CODE_LENGTH}, got {}",
            auth.otp_length
        );
    }
    if !(1..=MAX_SESSION_TTL_DAYS).contains(&auth.session_ttl_days) {
        bail!(
            "auth.session_ttl_days must be between 1 and {MAX_SESSION_TTL_DAYS}, got {}",
            auth.session_ttl_days
        );
    }
    if !(1..=MAX_CHALLENGE_TTL_MINUTES).contains(&auth.challenge_ttl_minutes) {
        bail!(
            "auth.challenge_ttl_minutes must be between 1 and {MAX_CHALLENGE_TTL_MINUTES}, got {}",
            auth.challenge_ttl_minutes
        );
    }
    if auth.purge_interval_secs == 0 {
        bail!("auth.purge_interval_secs must be positive");
    }
    Ok(())
}

async fn read_config_file(path: &Path) -> anyhow::Result<AppConfig> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    toml::from_str::<AppConfig>(&content)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Apply overrides from `lookup`. Empty values are ignored.
pub fn apply_env_overrides_from(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(secret) = get(ENV_SESSION_SECRET) {
        config.auth.session_secret = Some(secret);
    }
    if let Some(key) = get(ENV_GEMINI_API_KEY) {
        config.generation.api_key = Some(key);
    }
    if let Some(url) = get(ENV_DATABASE_URL) {
        config.database.url = url;
    }
    if let Some(domain) = get(ENV_EMAIL_DOMAIN) {
        config.auth.allowed_email_domain = Some(domain);
    }
    if let Some(tz) = get(ENV_TIMEZONE) {
        config.generation.timezone = tz;
    }
    if let Some(password) = get(ENV_SMTP_PASSWORD) {
        match config.smtp.as_mut() {
            Some(smtp) => smtp.password = password,
            None => tracing::warn!("{ENV_SMTP_PASSWORD} is set but no [smtp] section is configured"),
        }
    }
}

/// Parse the configured IANA timezone name.
pub fn resolve_timezone(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("invalid timezone '{name}': {e}"))
}
