//! Credential bundles and resolution
//!
//! Token bundles arrive in either of two field-naming conventions
//! (`access_token` vs `accessToken`). This module resolves a bundle from
//! the supplied value, the environment, or a token file, and normalizes
//! it into a single canonical shape before it reaches the client.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::{self, env_vars, AuthConfig};
use crate::error::CredentialError;

/// Default token type when a bundle leaves it unset
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// A token bundle as supplied by the caller, the environment, or a file.
///
/// Each logical field may be spelled with underscores or camel-cased;
/// both spellings may even appear in one bundle. Unknown fields are
/// ignored, and no field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTokenBundle {
    /// Access token, underscore spelling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Access token, camel spelling
    #[serde(default, rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token_camel: Option<String>,

    /// Refresh token, underscore spelling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Refresh token, camel spelling
    #[serde(default, rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token_camel: Option<String>,

    /// Expiry timestamp in epoch milliseconds, underscore spelling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,

    /// Expiry timestamp in epoch milliseconds, camel spelling
    #[serde(default, rename = "expiryDate", skip_serializing_if = "Option::is_none")]
    pub expiry_date_camel: Option<i64>,

    /// Token type, underscore spelling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Token type, camel spelling
    #[serde(default, rename = "tokenType", skip_serializing_if = "Option::is_none")]
    pub token_type_camel: Option<String>,
}

impl RawTokenBundle {
    /// Collapse the two spellings into the canonical bundle.
    ///
    /// Per field: the underscore spelling wins, then the camel spelling,
    /// else the field stays unset. Fields normalize independently, so a
    /// bundle may mix conventions. Never fails.
    pub fn normalize(self) -> TokenBundle {
        TokenBundle {
            access_token: self.access_token.or(self.access_token_camel),
            refresh_token: self.refresh_token.or(self.refresh_token_camel),
            expiry_date: self.expiry_date.or(self.expiry_date_camel),
            token_type: self.token_type.or(self.token_type_camel),
        }
    }
}

/// The canonical token bundle used past the resolver.
///
/// Values are carried as resolved, not validated; an expired or absent
/// access token is the remote service's problem to report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// OAuth access token
    pub access_token: Option<String>,

    /// OAuth refresh token
    pub refresh_token: Option<String>,

    /// Expiry timestamp in epoch milliseconds
    pub expiry_date: Option<i64>,

    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
}

/// The three places a token bundle may come from, captured explicitly.
///
/// `from_env` snapshots the environment fresh on every call; holding the
/// sources as plain data keeps resolution deterministic and testable.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Bundle passed directly by the caller
    pub supplied: Option<RawTokenBundle>,

    /// Raw JSON from the token environment variable
    pub env_json: Option<String>,

    /// Path to the token file
    pub token_path: PathBuf,
}

impl CredentialSources {
    /// Capture the current environment plus an optionally supplied bundle.
    pub fn from_env(supplied: Option<RawTokenBundle>) -> Self {
        Self {
            supplied,
            env_json: std::env::var(env_vars::TOKEN_JSON).ok(),
            token_path: config::token_file_path(),
        }
    }

    /// Resolve a raw bundle by strict priority: supplied value, then
    /// environment JSON, then token file. First match wins; a malformed
    /// source is a fatal error, never a fallthrough.
    pub fn resolve(&self) -> Result<RawTokenBundle, CredentialError> {
        if let Some(bundle) = &self.supplied {
            // Returned as-is, even if every field is empty.
            return Ok(bundle.clone());
        }

        if let Some(raw) = &self.env_json {
            return serde_json::from_str(raw).map_err(|e| CredentialError::EnvInvalidJson {
                message: e.to_string(),
            });
        }

        if self.token_path.exists() {
            let path = self.token_path.display().to_string();
            let content = std::fs::read_to_string(&self.token_path).map_err(|e| {
                CredentialError::FileUnreadable {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            return serde_json::from_str(&content).map_err(|e| {
                CredentialError::FileInvalidJson {
                    path,
                    message: e.to_string(),
                }
            });
        }

        Err(CredentialError::NotFound)
    }
}

/// Resolve and normalize in one step, reading sources from the environment.
pub fn resolve_tokens(
    supplied: Option<RawTokenBundle>,
) -> Result<TokenBundle, CredentialError> {
    CredentialSources::from_env(supplied)
        .resolve()
        .map(RawTokenBundle::normalize)
}

/// OAuth application settings paired with a resolved token bundle.
pub struct Authenticator {
    app: AuthConfig,
    tokens: TokenBundle,
}

impl Authenticator {
    /// Pair application settings with a canonical token bundle.
    pub fn new(app: AuthConfig, tokens: TokenBundle) -> Self {
        Self { app, tokens }
    }

    /// Resolve credentials and read application settings from the
    /// environment, both fresh for this call.
    pub fn from_env(supplied: Option<RawTokenBundle>) -> Result<Self, CredentialError> {
        Ok(Self::new(AuthConfig::from_env(), resolve_tokens(supplied)?))
    }

    /// OAuth application settings this authenticator was built with.
    pub fn app(&self) -> &AuthConfig {
        &self.app
    }

    /// The resolved token bundle.
    pub fn tokens(&self) -> &TokenBundle {
        &self.tokens
    }

    /// Render the `Authorization` header value.
    ///
    /// An expired or missing access token is still sent; refresh belongs
    /// to the caller, and the remote service reports the failure.
    pub fn authorization(&self) -> String {
        if let Some(expiry_ms) = self.tokens.expiry_date {
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);
            if expiry_ms <= now_ms {
                tracing::debug!("access token expiry {} is in the past", expiry_ms);
            }
        }

        format!(
            "{} {}",
            self.tokens.token_type.as_deref().unwrap_or(DEFAULT_TOKEN_TYPE),
            self.tokens.access_token.as_deref().unwrap_or_default()
        )
    }
}
