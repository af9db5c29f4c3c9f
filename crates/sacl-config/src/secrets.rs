//! Credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `/remote/keys_env`.
//! - Callers invoke [`resolve_credentials`] once at startup and pass the
//!   result into the remote client constructor.
//! - `Debug` redacts values. Error messages name the env var, never its value.
//!
//! # Backend-aware enforcement
//! - `http`:  access_key_id + access_key_secret are **required**.
//! - `paper`: both optional.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::Backend;

pub const DEFAULT_ACCESS_KEY_ID_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const DEFAULT_ACCESS_KEY_SECRET_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";

/// Credentials resolved from the environment. **Redacted in `Debug`.**
#[derive(Clone, Default)]
pub struct ResolvedCredentials {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field(
                "access_key_id",
                &self.access_key_id.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "access_key_secret",
                &self.access_key_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Env var names read from config, falling back to the SDK-standard names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEnvNames {
    pub access_key_id_var: String,
    pub access_key_secret_var: String,
}

impl CredentialEnvNames {
    pub fn from_config_json(config_json: &Value) -> Self {
        Self {
            access_key_id_var: read_str_at(config_json, "/remote/keys_env/access_key_id")
                .unwrap_or_else(|| DEFAULT_ACCESS_KEY_ID_ENV.to_string()),
            access_key_secret_var: read_str_at(config_json, "/remote/keys_env/access_key_secret")
                .unwrap_or_else(|| DEFAULT_ACCESS_KEY_SECRET_ENV.to_string()),
        }
    }
}

/// Non-empty trimmed string at `pointer`, or `None`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unset and blank both resolve to `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve remote credentials for `backend`.
///
/// # Errors
/// `SECRETS_MISSING` naming the first required env var that is unset or blank.
pub fn resolve_credentials(config_json: &Value, backend: Backend) -> Result<ResolvedCredentials> {
    let names = CredentialEnvNames::from_config_json(config_json);

    let creds = ResolvedCredentials {
        access_key_id: resolve_env(&names.access_key_id_var),
        access_key_secret: resolve_env(&names.access_key_secret_var),
    };

    if backend == Backend::Http {
        if creds.access_key_id.is_none() {
            bail!(
                "SECRETS_MISSING backend=http: required env var '{}' \
                 (access_key_id) is not set or empty",
                names.access_key_id_var,
            );
        }
        if creds.access_key_secret.is_none() {
            bail!(
                "SECRETS_MISSING backend=http: required env var '{}' \
                 (access_key_secret) is not set or empty",
                names.access_key_secret_var,
            );
        }
    }

    Ok(creds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_names_fall_back_to_defaults() {
        let names = CredentialEnvNames::from_config_json(&serde_json::json!({
            "remote": { "keys_env": { "access_key_id": "  " } }
        }));
        assert_eq!(names.access_key_id_var, DEFAULT_ACCESS_KEY_ID_ENV);
        assert_eq!(names.access_key_secret_var, DEFAULT_ACCESS_KEY_SECRET_ENV);
    }
}
