//! gmail-bridge
//!
//! A thin adapter over the Gmail REST API, usable as a library or as a
//! stdio tool-protocol server. Credentials are resolved per call from a
//! supplied bundle, the environment, or a token file; each operation is
//! a single pass-through request against the remote API.

pub mod config;
pub mod error;
pub mod gmail;
pub mod mcp;

pub use config::AuthConfig;
pub use error::{ApiError, CredentialError, GmailBridgeError, Result};
pub use gmail::client::GmailClient;
pub use gmail::credentials::{Authenticator, CredentialSources, RawTokenBundle, TokenBundle};
