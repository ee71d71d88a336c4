//! Configuration for gmail-bridge
//!
//! Environment variable names, defaults, and the OAuth application
//! settings consumed at client construction time.

use std::env;
use std::path::PathBuf;

/// Environment variables read by this crate
pub mod env_vars {
    /// OAuth application client ID
    pub const CLIENT_ID: &str = "GMAIL_CLIENT_ID";

    /// OAuth application client secret
    pub const CLIENT_SECRET: &str = "GMAIL_CLIENT_SECRET";

    /// OAuth redirect URL
    pub const REDIRECT_URL: &str = "GMAIL_REDIRECT_URL";

    /// JSON token bundle supplied directly through the environment
    pub const TOKEN_JSON: &str = "GMAIL_TOKEN";

    /// Path to a JSON token file
    pub const TOKEN_PATH: &str = "GMAIL_TOKEN_PATH";
}

/// Default OAuth redirect URL when the environment does not set one
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost";

/// Default token file path, relative to the working directory
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Gmail API constants
pub mod gmail {
    /// Base URL for the Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// Mailbox ID meaning the authenticated user
    pub const USER_ID: &str = "me";
}

/// OAuth application settings
///
/// The client ID and secret are optional on purpose: this layer never
/// exchanges or refreshes tokens, so their absence is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// OAuth client ID
    pub client_id: Option<String>,

    /// OAuth client secret
    pub client_secret: Option<String>,

    /// OAuth redirect URL
    pub redirect_url: String,
}

impl AuthConfig {
    /// Read the OAuth application settings from the environment.
    ///
    /// The environment is read fresh on every call; nothing is cached.
    pub fn from_env() -> Self {
        Self {
            client_id: env::var(env_vars::CLIENT_ID).ok(),
            client_secret: env::var(env_vars::CLIENT_SECRET).ok(),
            redirect_url: env::var(env_vars::REDIRECT_URL)
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URL.to_string()),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
        }
    }
}

/// Path of the token file: `GMAIL_TOKEN_PATH` if set, else the default
/// relative filename.
pub fn token_file_path() -> PathBuf {
    env::var(env_vars::TOKEN_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE))
}
