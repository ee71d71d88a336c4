//! Gmail API type definitions
//!
//! These types mirror the Gmail API payloads and are relayed unchanged
//! apart from defaulting missing list collections to empty vectors.

use serde::{Deserialize, Serialize};

/// A Gmail message part (MIME part)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// Part ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,

    /// MIME type of this part
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Filename for attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Headers for this part
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,

    /// Body of this part
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<MessagePartBody>,

    /// Nested parts (for multipart messages)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

/// Header in a message part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Header name
    pub name: String,

    /// Header value
    pub value: String,
}

/// Body of a message part
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    /// Attachment ID (if this part is an attachment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,

    /// Size in bytes
    #[serde(default)]
    pub size: i64,

    /// Base64url-encoded data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A Gmail message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID
    pub id: String,

    /// Thread ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Label IDs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,

    /// Snippet (preview text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Message payload (MIME structure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePart>,

    /// Size estimate in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_estimate: Option<i64>,

    /// Raw RFC 822 message (only with format=raw)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    /// Internal date (epoch millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
}

/// Reference to a message (id and thread id only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message ID
    pub id: String,

    /// Thread ID
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// List-messages response page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Messages in this page; empty when the remote omits the field
    #[serde(default)]
    pub messages: Vec<MessageRef>,

    /// Next page token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    /// Result size estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u32>,
}

/// A Gmail thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread ID
    pub id: String,

    /// Snippet of the latest message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// History ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,

    /// Messages in the thread; empty unless fetched with a detail format
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// List-threads response page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ThreadList {
    /// Threads in this page; empty when the remote omits the field
    #[serde(default)]
    pub threads: Vec<Thread>,

    /// Next page token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    /// Result size estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u32>,
}

/// A Gmail label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Label ID
    pub id: String,

    /// Label name
    pub name: String,

    /// Label type (system or user)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,

    /// Message list visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<String>,

    /// Label list visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<String>,

    /// Total message count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<i32>,

    /// Unread message count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_unread: Option<i32>,
}

/// List-labels response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LabelList {
    /// Labels; empty when the remote omits the field
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// A Gmail draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    /// Draft ID
    pub id: String,

    /// The wrapped message
    pub message: Message,
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Raw RFC 822 message, base64url-encoded
    pub raw: String,

    /// Thread ID (for replies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Request to create a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftRequest {
    /// The message to store as a draft
    pub message: SendMessageRequest,
}

/// Request to modify message labels
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModifyMessageRequest {
    /// Label IDs to add
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_label_ids: Option<Vec<String>>,

    /// Label IDs to remove
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_label_ids: Option<Vec<String>>,
}

/// Detail level for message and thread retrieval
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Minimal,
    #[default]
    Full,
    Raw,
    Metadata,
}

impl MessageFormat {
    /// Query-parameter value for this format
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Minimal => "minimal",
            MessageFormat::Full => "full",
            MessageFormat::Raw => "raw",
            MessageFormat::Metadata => "metadata",
        }
    }
}

/// Options for listing or searching messages
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListMessagesOptions {
    /// Maximum number of results per page
    pub max_results: Option<u32>,

    /// Page token from a previous response, forwarded as-is
    pub page_token: Option<String>,

    /// Gmail search query
    pub q: Option<String>,

    /// Restrict to messages carrying all of these labels
    pub label_ids: Option<Vec<String>>,

    /// Include messages from SPAM and TRASH
    pub include_spam_trash: Option<bool>,
}

/// Options for listing threads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListThreadsOptions {
    /// Maximum number of results per page
    pub max_results: Option<u32>,

    /// Page token from a previous response, forwarded as-is
    pub page_token: Option<String>,

    /// Gmail search query
    pub q: Option<String>,

    /// Restrict to threads carrying all of these labels
    pub label_ids: Option<Vec<String>>,
}

/// An outgoing email, before envelope construction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutgoingEmail {
    /// Recipients
    pub to: Vec<String>,

    /// Carbon-copy recipients
    pub cc: Option<Vec<String>>,

    /// Blind-carbon-copy recipients
    pub bcc: Option<Vec<String>>,

    /// Subject; a placeholder is used when absent
    pub subject: Option<String>,

    /// Body text
    pub body: String,

    /// Send the body as HTML instead of plain text
    pub html: Option<bool>,

    /// Message ID being replied to; adds threading headers
    pub in_reply_to: Option<String>,

    /// Thread to attach the message to
    pub thread_id: Option<String>,
}
