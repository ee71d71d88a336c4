//! Error types for gmail-bridge
//!
//! This module defines the error hierarchy for credential resolution,
//! Gmail API calls, and the tool protocol layer.

use thiserror::Error;

/// Main error type for gmail-bridge
#[derive(Error, Debug)]
pub enum GmailBridgeError {
    /// Credential resolution errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Api(#[from] ApiError),

    /// Tool protocol errors
    #[error("Protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Credential resolution errors
///
/// One variant per way resolution can fail; the resolver never falls back
/// past a malformed source.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("GMAIL_TOKEN contains invalid JSON: {message}")]
    EnvInvalidJson { message: String },

    #[error("Credential file {path} contains invalid JSON: {message}")]
    FileInvalidJson { path: String, message: String },

    #[error("Credential file {path} could not be read: {message}")]
    FileUnreadable { path: String, message: String },

    #[error(
        "No credentials found: pass a token bundle directly, set the GMAIL_TOKEN \
         environment variable to a JSON token bundle, or point GMAIL_TOKEN_PATH \
         at a JSON token file (default: token.json)"
    )]
    NotFound,
}

/// Gmail API call errors
///
/// Every remote failure is terminal for the single invoking call; there is
/// no retry and no transient/permanent classification at this layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote response carried a descriptive error message
    #[error("{message}")]
    Remote { message: String },

    /// The remote failure had no recognizable error shape
    #[error("An unknown error occurred")]
    Unknown,
}

/// Tool protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Result type alias for gmail-bridge operations
pub type Result<T> = std::result::Result<T, GmailBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_vars;

    #[test]
    fn test_not_found_lists_all_sources() {
        let msg = CredentialError::NotFound.to_string();
        assert!(msg.contains("directly"));
        assert!(msg.contains(env_vars::TOKEN_JSON));
        assert!(msg.contains(env_vars::TOKEN_PATH));
    }

    #[test]
    fn test_env_and_file_json_errors_distinguishable() {
        let env_err = CredentialError::EnvInvalidJson {
            message: "expected value at line 1".to_string(),
        };
        let file_err = CredentialError::FileInvalidJson {
            path: "token.json".to_string(),
            message: "expected value at line 1".to_string(),
        };
        assert!(env_err.to_string().contains(env_vars::TOKEN_JSON));
        assert!(file_err.to_string().contains("Credential file token.json"));
        assert_ne!(env_err.to_string(), file_err.to_string());
    }

    #[test]
    fn test_remote_error_propagates_message_unchanged() {
        let err = ApiError::Remote {
            message: "Requested entity was not found.".to_string(),
        };
        assert_eq!(err.to_string(), "Requested entity was not found.");
    }

    #[test]
    fn test_unknown_error_is_generic() {
        let msg = ApiError::Unknown.to_string().to_lowercase();
        assert!(msg.contains("unknown error"));
    }

    #[test]
    fn test_error_conversion() {
        let cred_err = CredentialError::NotFound;
        let err: GmailBridgeError = cred_err.into();
        assert!(matches!(err, GmailBridgeError::Credential(_)));

        let mcp_err = McpError::UnknownTool {
            name: "bogus".to_string(),
        };
        let err: GmailBridgeError = mcp_err.into();
        assert!(err.to_string().contains("bogus"));
    }
}
