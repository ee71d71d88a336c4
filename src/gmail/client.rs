//! Gmail API client
//!
//! The façade over the Gmail REST API: one authenticated client per
//! instance, one method per supported operation, each a single
//! request/response round trip with no retries and no shared state.

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::gmail::{API_BASE_URL, USER_ID};
use crate::error::{ApiError, GmailBridgeError, Result};
use crate::gmail::credentials::{Authenticator, RawTokenBundle};
use crate::gmail::message::{build_envelope, encode_envelope};
use crate::gmail::types::*;

/// Error envelope the Gmail API wraps failures in
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    error: Option<RemoteErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Gmail API façade
pub struct GmailClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// OAuth app settings plus resolved tokens
    authenticator: Authenticator,

    /// API base URL; injectable for tests
    base_url: String,
}

impl GmailClient {
    /// Create a client from an already-built authenticator.
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            authenticator,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Resolve credentials (supplied bundle, environment, token file) and
    /// construct a client. Resolution failure aborts construction; no
    /// partial client is ever produced.
    pub fn connect(supplied: Option<RawTokenBundle>) -> Result<Self> {
        Ok(Self::new(Authenticator::from_env(supplied)?))
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The authenticator this client sends requests with.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    fn mailbox_url(&self, user_id: Option<&str>, resource: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.base_url,
            user_id.unwrap_or(USER_ID),
            resource
        )
    }

    // ==================== Request plumbing ====================

    async fn get_json<T: DeserializeOwned>(&self, op: &'static str, url: String) -> Result<T> {
        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, self.authenticator.authorization())
            .send()
            .await?;
        Self::read_response(op, response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        op: &'static str,
        url: String,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.authenticator.authorization())
            .json(body)
            .send()
            .await?;
        Self::read_response(op, response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, op: &'static str, url: String) -> Result<T> {
        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, self.authenticator.authorization())
            .header(CONTENT_LENGTH, "0")
            .send()
            .await?;
        Self::read_response(op, response).await
    }

    async fn read_response<T: DeserializeOwned>(
        op: &'static str,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::normalize_failure(op, response).await)
        }
    }

    /// Turn a non-success response into the error the caller sees: the
    /// remote message verbatim when one is present, else a generic
    /// unknown-error. Either way the failure is logged to stderr.
    async fn normalize_failure(op: &'static str, response: reqwest::Response) -> GmailBridgeError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<RemoteErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message);

        match message {
            Some(message) => {
                tracing::error!("{} failed ({}): {}", op, status, message);
                GmailBridgeError::Api(ApiError::Remote { message })
            }
            None => {
                tracing::error!("{} failed ({}): unrecognized error shape", op, status);
                GmailBridgeError::Api(ApiError::Unknown)
            }
        }
    }

    // ==================== Message Operations ====================

    /// List messages in a mailbox.
    pub async fn list_messages(
        &self,
        user_id: Option<&str>,
        opts: &ListMessagesOptions,
    ) -> Result<MessageList> {
        let url = format!(
            "{}{}",
            self.mailbox_url(user_id, "messages"),
            message_list_query(opts)
        );
        self.get_json("list_messages", url).await
    }

    /// Search messages with a Gmail query string.
    pub async fn search_messages(
        &self,
        user_id: Option<&str>,
        query: &str,
        opts: &ListMessagesOptions,
    ) -> Result<MessageList> {
        let mut opts = opts.clone();
        opts.q = Some(query.to_string());
        let url = format!(
            "{}{}",
            self.mailbox_url(user_id, "messages"),
            message_list_query(&opts)
        );
        self.get_json("search_messages", url).await
    }

    /// Get a single message at the requested detail level.
    pub async fn get_message(
        &self,
        user_id: Option<&str>,
        message_id: &str,
        format: Option<MessageFormat>,
    ) -> Result<Message> {
        let url = format!(
            "{}/{}?format={}",
            self.mailbox_url(user_id, "messages"),
            message_id,
            format.unwrap_or_default().as_str()
        );
        self.get_json("get_message", url).await
    }

    /// Send an email built from the outgoing envelope.
    pub async fn send_message(
        &self,
        user_id: Option<&str>,
        email: &OutgoingEmail,
    ) -> Result<Message> {
        let request = SendMessageRequest {
            raw: encode_envelope(&build_envelope(email)),
            thread_id: email.thread_id.clone(),
        };
        let url = format!("{}/send", self.mailbox_url(user_id, "messages"));
        self.post_json("send_message", url, &request).await
    }

    /// Store an email as a draft instead of sending it.
    pub async fn create_draft(
        &self,
        user_id: Option<&str>,
        email: &OutgoingEmail,
    ) -> Result<Draft> {
        let request = CreateDraftRequest {
            message: SendMessageRequest {
                raw: encode_envelope(&build_envelope(email)),
                thread_id: email.thread_id.clone(),
            },
        };
        let url = self.mailbox_url(user_id, "drafts");
        self.post_json("create_draft", url, &request).await
    }

    /// Add and/or remove labels on a message.
    pub async fn modify_message(
        &self,
        user_id: Option<&str>,
        message_id: &str,
        changes: &ModifyMessageRequest,
    ) -> Result<Message> {
        let url = format!("{}/{}/modify", self.mailbox_url(user_id, "messages"), message_id);
        self.post_json("modify_message", url, changes).await
    }

    /// Move a message to the trash.
    pub async fn trash_message(&self, user_id: Option<&str>, message_id: &str) -> Result<Message> {
        let url = format!("{}/{}/trash", self.mailbox_url(user_id, "messages"), message_id);
        self.post_empty("trash_message", url).await
    }

    /// Restore a message from the trash.
    pub async fn untrash_message(
        &self,
        user_id: Option<&str>,
        message_id: &str,
    ) -> Result<Message> {
        let url = format!(
            "{}/{}/untrash",
            self.mailbox_url(user_id, "messages"),
            message_id
        );
        self.post_empty("untrash_message", url).await
    }

    // ==================== Label Operations ====================

    /// List all labels in a mailbox.
    pub async fn list_labels(&self, user_id: Option<&str>) -> Result<Vec<Label>> {
        let url = self.mailbox_url(user_id, "labels");
        let list: LabelList = self.get_json("list_labels", url).await?;
        Ok(list.labels)
    }

    // ==================== Thread Operations ====================

    /// List threads in a mailbox.
    pub async fn list_threads(
        &self,
        user_id: Option<&str>,
        opts: &ListThreadsOptions,
    ) -> Result<ThreadList> {
        let url = format!(
            "{}{}",
            self.mailbox_url(user_id, "threads"),
            thread_list_query(opts)
        );
        self.get_json("list_threads", url).await
    }

    /// Get a single thread at the requested detail level.
    pub async fn get_thread(
        &self,
        user_id: Option<&str>,
        thread_id: &str,
        format: Option<MessageFormat>,
    ) -> Result<Thread> {
        let url = format!(
            "{}/{}?format={}",
            self.mailbox_url(user_id, "threads"),
            thread_id,
            format.unwrap_or_default().as_str()
        );
        self.get_json("get_thread", url).await
    }
}

/// Query string for the message list endpoint; only recognized options
/// are forwarded.
fn message_list_query(opts: &ListMessagesOptions) -> String {
    let mut params = Vec::new();

    if let Some(max) = opts.max_results {
        params.push(format!("maxResults={}", max));
    }
    if let Some(token) = &opts.page_token {
        params.push(format!("pageToken={}", urlencoding::encode(token)));
    }
    if let Some(q) = &opts.q {
        params.push(format!("q={}", urlencoding::encode(q)));
    }
    if let Some(labels) = &opts.label_ids {
        for label in labels {
            params.push(format!("labelIds={}", urlencoding::encode(label)));
        }
    }
    if opts.include_spam_trash == Some(true) {
        params.push("includeSpamTrash=true".to_string());
    }

    render_query(params)
}

/// Query string for the thread list endpoint.
fn thread_list_query(opts: &ListThreadsOptions) -> String {
    let mut params = Vec::new();

    if let Some(max) = opts.max_results {
        params.push(format!("maxResults={}", max));
    }
    if let Some(token) = &opts.page_token {
        params.push(format!("pageToken={}", urlencoding::encode(token)));
    }
    if let Some(q) = &opts.q {
        params.push(format!("q={}", urlencoding::encode(q)));
    }
    if let Some(labels) = &opts.label_ids {
        for label in labels {
            params.push(format!("labelIds={}", urlencoding::encode(label)));
        }
    }

    render_query(params)
}

fn render_query(params: Vec<String>) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_build_no_query() {
        assert_eq!(message_list_query(&ListMessagesOptions::default()), "");
        assert_eq!(thread_list_query(&ListThreadsOptions::default()), "");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let opts = ListMessagesOptions {
            q: Some("from:a@example.com is:unread".to_string()),
            ..Default::default()
        };
        let query = message_list_query(&opts);
        assert_eq!(query, "?q=from%3Aa%40example.com%20is%3Aunread");
    }

    #[test]
    fn test_label_ids_repeat() {
        let opts = ListMessagesOptions {
            label_ids: Some(vec!["INBOX".to_string(), "UNREAD".to_string()]),
            ..Default::default()
        };
        let query = message_list_query(&opts);
        assert_eq!(query, "?labelIds=INBOX&labelIds=UNREAD");
    }

    #[test]
    fn test_spam_trash_flag_only_when_true() {
        let opts = ListMessagesOptions {
            include_spam_trash: Some(false),
            ..Default::default()
        };
        assert_eq!(message_list_query(&opts), "");
    }

    #[test]
    fn test_remote_error_body_parses_gmail_envelope() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        let parsed: RemoteErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.error.unwrap().message.as_deref(),
            Some("Requested entity was not found.")
        );
    }
}
