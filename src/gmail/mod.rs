//! Gmail API module
//!
//! Credential resolution, the API façade, and standalone one-shot
//! functions that resolve credentials and build a throwaway client for a
//! single call.

pub mod client;
pub mod credentials;
pub mod message;
pub mod types;

use crate::error::Result;
use client::GmailClient;
use types::*;

/// List messages, resolving credentials from the environment for this call.
pub async fn list_messages(
    user_id: Option<&str>,
    opts: &ListMessagesOptions,
) -> Result<MessageList> {
    GmailClient::connect(None)?.list_messages(user_id, opts).await
}

/// Search messages, resolving credentials from the environment for this call.
pub async fn search_messages(
    user_id: Option<&str>,
    query: &str,
    opts: &ListMessagesOptions,
) -> Result<MessageList> {
    GmailClient::connect(None)?
        .search_messages(user_id, query, opts)
        .await
}

/// Get a message, resolving credentials from the environment for this call.
pub async fn get_message(
    user_id: Option<&str>,
    message_id: &str,
    format: Option<MessageFormat>,
) -> Result<Message> {
    GmailClient::connect(None)?
        .get_message(user_id, message_id, format)
        .await
}

/// Send an email, resolving credentials from the environment for this call.
pub async fn send_message(user_id: Option<&str>, email: &OutgoingEmail) -> Result<Message> {
    GmailClient::connect(None)?.send_message(user_id, email).await
}

/// Create a draft, resolving credentials from the environment for this call.
pub async fn create_draft(user_id: Option<&str>, email: &OutgoingEmail) -> Result<Draft> {
    GmailClient::connect(None)?.create_draft(user_id, email).await
}

/// List labels, resolving credentials from the environment for this call.
pub async fn list_labels(user_id: Option<&str>) -> Result<Vec<Label>> {
    GmailClient::connect(None)?.list_labels(user_id).await
}

/// Modify message labels, resolving credentials from the environment for
/// this call.
pub async fn modify_message(
    user_id: Option<&str>,
    message_id: &str,
    changes: &ModifyMessageRequest,
) -> Result<Message> {
    GmailClient::connect(None)?
        .modify_message(user_id, message_id, changes)
        .await
}

/// Trash a message, resolving credentials from the environment for this call.
pub async fn trash_message(user_id: Option<&str>, message_id: &str) -> Result<Message> {
    GmailClient::connect(None)?.trash_message(user_id, message_id).await
}

/// Untrash a message, resolving credentials from the environment for this
/// call.
pub async fn untrash_message(user_id: Option<&str>, message_id: &str) -> Result<Message> {
    GmailClient::connect(None)?
        .untrash_message(user_id, message_id)
        .await
}

/// List threads, resolving credentials from the environment for this call.
pub async fn list_threads(
    user_id: Option<&str>,
    opts: &ListThreadsOptions,
) -> Result<ThreadList> {
    GmailClient::connect(None)?.list_threads(user_id, opts).await
}

/// Get a thread, resolving credentials from the environment for this call.
pub async fn get_thread(
    user_id: Option<&str>,
    thread_id: &str,
    format: Option<MessageFormat>,
) -> Result<Thread> {
    GmailClient::connect(None)?
        .get_thread(user_id, thread_id, format)
        .await
}
