//! API credential handling
//!
//! The completion and embedding services authenticate with one bearer key.
//! It is resolved in this order:
//!
//! 1. The `OPENAI_API_KEY` environment variable (a `.env` file counts)
//! 2. The OS keychain, service `librarian`, entry `openai_api_key`
//!
//! Keys are carried in [`SecretString`] so they never appear in `Debug` or
//! `Display` output, and error text from remote services is passed through
//! [`scrub_secrets`] before it is shown.

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::OnceLock;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Keychain service name
pub const KEYRING_SERVICE: &str = "librarian";

/// Keychain entry name for the API key
pub const KEYRING_API_KEY: &str = "openai_api_key";

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// To access the actual secret value, use the `unsecure()` method.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn unsecure(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Thin wrapper over the OS keychain.
///
/// Unlike an interactive secret store this never prompts: a missing entry is
/// reported as `Ok(None)` so the caller can explain which variable to set.
pub struct SecretManager {
    service_name: String,
}

impl SecretManager {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Read a secret from the keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if the keychain itself is unusable.
    pub fn get_secret(&self, key: &str) -> Result<Option<SecretString>, EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(Some(SecretString::new(secret)))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Store a secret in the keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if keychain access fails.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }
}

/// Resolve the API key from the environment, falling back to the keychain.
///
/// `env_value` is the value of [`API_KEY_ENV`], passed in so callers (and
/// tests) control where it comes from.
///
/// # Errors
/// Returns `EngineError::Config` when neither source has a non-empty key.
pub fn resolve_api_key(
    env_value: Option<String>,
    manager: &SecretManager,
) -> Result<SecretString, EngineError> {
    if let Some(value) = env_value.map(SecretString::from) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    match manager.get_secret(KEYRING_API_KEY) {
        Ok(Some(value)) if !value.is_empty() => Ok(value),
        Ok(_) => Err(EngineError::Config(format!(
            "No API key found. Set {} or store '{}' in the '{}' keychain service",
            API_KEY_ENV, KEYRING_API_KEY, KEYRING_SERVICE
        ))),
        Err(e) => {
            tracing::warn!("Keychain lookup failed: {}", e);
            Err(EngineError::Config(format!(
                "No API key found. Set {}",
                API_KEY_ENV
            )))
        }
    }
}

/// Regex patterns for detecting bearer credentials in text.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // OpenAI keys, including sk-proj- style variants
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace API keys and bearer tokens in `text` with `[REDACTED]`.
///
/// # Examples
/// ```
/// use librarian_engine::secrets::scrub_secrets;
///
/// let scrubbed = scrub_secrets("Incorrect API key provided: sk-1234567890abcdefghij");
/// assert_eq!(scrubbed, "Incorrect API key provided: [REDACTED]");
/// ```
pub fn scrub_secrets(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}
