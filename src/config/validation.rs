//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port and intervals > 0, mode bits in range)
//! - Reject values that would make a startup step meaningless
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EntrypointConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is turned into an `Environment`

use thiserror::Error;

use crate::config::schema::EntrypointConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("app.key_field {0:?} is not a valid environment-file key")]
    InvalidKeyField(String),

    #[error("permissions.mode {0:?} is not an octal mode between 0 and 7777")]
    InvalidMode(String),
}

/// Parse an octal permission string such as "775" or "0o2775".
pub fn parse_mode_bits(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|bits| *bits <= 0o7777)
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &EntrypointConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("app.root", &config.app.root),
        ("app.env_file", &config.app.env_file),
        ("app.env_template", &config.app.env_template),
        ("app.public_storage_link", &config.app.public_storage_link),
        ("dependency.host", &config.dependency.host),
        ("logging.level", &config.logging.level),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        }
    }

    let key = &config.app.key_field;
    if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidKeyField(key.clone()));
    }

    if config.dependency.port == 0 {
        errors.push(ValidationError::Zero { field: "dependency.port" });
    }
    if config.dependency.interval_ms == 0 {
        errors.push(ValidationError::Zero { field: "dependency.interval_ms" });
    }
    if config.dependency.connect_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "dependency.connect_timeout_ms" });
    }

    match config.framework.artisan.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => errors.push(ValidationError::Empty { field: "framework.artisan" }),
    }

    if parse_mode_bits(&config.permissions.mode).is_none() {
        errors.push(ValidationError::InvalidMode(config.permissions.mode.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
