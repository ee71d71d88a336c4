//! Tool registry and dispatch
//!
//! Declares one tool per Gmail operation and maps tool calls onto the
//! façade. Dispatch is stateless: every invocation resolves credentials
//! fresh (the embedded bundle, the environment, or the token file) and
//! builds a short-lived client for that single call. All failures are
//! converted into error-flagged payloads; nothing escapes the dispatcher.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::McpError;
use crate::gmail::client::GmailClient;
use crate::gmail::credentials::RawTokenBundle;
use crate::gmail::types::{
    ListMessagesOptions, ListThreadsOptions, MessageFormat, ModifyMessageRequest, OutgoingEmail,
};
use crate::mcp::protocol::{CallToolResult, Tool};

/// All tools this server exposes.
pub fn registry() -> Vec<Tool> {
    vec![
        tool_def(
            "list_messages",
            "Lists messages in a mailbox, newest first",
            with_common_properties(
                json!({
                    "maxResults": {"type": "integer", "description": "Maximum results per page"},
                    "pageToken": {"type": "string", "description": "Page token from a previous response"},
                    "q": {"type": "string", "description": "Gmail search query"},
                    "labelIds": {"type": "array", "items": {"type": "string"}},
                    "includeSpamTrash": {"type": "boolean"}
                }),
                &[],
            ),
        ),
        tool_def(
            "search_messages",
            "Searches messages using Gmail search syntax",
            with_common_properties(
                json!({
                    "query": {"type": "string", "description": "Gmail search query"},
                    "maxResults": {"type": "integer"},
                    "pageToken": {"type": "string"},
                    "labelIds": {"type": "array", "items": {"type": "string"}},
                    "includeSpamTrash": {"type": "boolean"}
                }),
                &["query"],
            ),
        ),
        tool_def(
            "get_message",
            "Retrieves a single message",
            with_common_properties(
                json!({
                    "id": {"type": "string", "description": "Message ID"},
                    "format": format_schema()
                }),
                &["id"],
            ),
        ),
        tool_def(
            "send_message",
            "Sends an email",
            with_common_properties(outgoing_email_properties(), &["to", "body"]),
        ),
        tool_def(
            "create_draft",
            "Creates an email draft",
            with_common_properties(outgoing_email_properties(), &["to", "body"]),
        ),
        tool_def(
            "list_labels",
            "Lists all labels in a mailbox",
            with_common_properties(json!({}), &[]),
        ),
        tool_def(
            "modify_message",
            "Adds and/or removes labels on a message",
            with_common_properties(
                json!({
                    "id": {"type": "string", "description": "Message ID"},
                    "addLabelIds": {"type": "array", "items": {"type": "string"}},
                    "removeLabelIds": {"type": "array", "items": {"type": "string"}}
                }),
                &["id"],
            ),
        ),
        tool_def(
            "trash_message",
            "Moves a message to the trash",
            with_common_properties(
                json!({"id": {"type": "string", "description": "Message ID"}}),
                &["id"],
            ),
        ),
        tool_def(
            "untrash_message",
            "Restores a message from the trash",
            with_common_properties(
                json!({"id": {"type": "string", "description": "Message ID"}}),
                &["id"],
            ),
        ),
        tool_def(
            "list_threads",
            "Lists threads in a mailbox",
            with_common_properties(
                json!({
                    "maxResults": {"type": "integer"},
                    "pageToken": {"type": "string"},
                    "q": {"type": "string"},
                    "labelIds": {"type": "array", "items": {"type": "string"}}
                }),
                &[],
            ),
        ),
        tool_def(
            "get_thread",
            "Retrieves a single thread",
            with_common_properties(
                json!({
                    "id": {"type": "string", "description": "Thread ID"},
                    "format": format_schema()
                }),
                &["id"],
            ),
        ),
    ]
}

/// Dispatch a tool call by name.
pub async fn dispatch(name: &str, args: Value) -> CallToolResult {
    match name {
        "list_messages" => list_messages_tool(args).await,
        "search_messages" => search_messages_tool(args).await,
        "get_message" => get_message_tool(args).await,
        "send_message" => outgoing_email_tool(args, false).await,
        "create_draft" => outgoing_email_tool(args, true).await,
        "list_labels" => list_labels_tool(args).await,
        "modify_message" => modify_message_tool(args).await,
        "trash_message" => trash_message_tool(args).await,
        "untrash_message" => untrash_message_tool(args).await,
        "list_threads" => list_threads_tool(args).await,
        "get_thread" => get_thread_tool(args).await,
        _ => CallToolResult::error(McpError::UnknownTool {
            name: name.to_string(),
        }),
    }
}

// ==================== Schema helpers ====================

fn tool_def(name: &'static str, description: &'static str, input_schema: Value) -> Tool {
    Tool {
        name,
        description,
        input_schema,
    }
}

/// Wrap tool-specific properties with the ones every tool accepts:
/// the mailbox ID and an optional embedded credential bundle.
fn with_common_properties(mut properties: Value, required: &[&str]) -> Value {
    let map = properties.as_object_mut().expect("schema properties");
    map.insert("userId".to_string(), user_id_schema());
    map.insert("credentials".to_string(), credentials_schema());

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn user_id_schema() -> Value {
    json!({
        "type": "string",
        "description": "Mailbox ID; defaults to the authenticated user (\"me\")"
    })
}

fn credentials_schema() -> Value {
    json!({
        "type": "object",
        "description": "OAuth token bundle; field names accepted in snake_case or camelCase",
        "properties": {
            "access_token": {"type": "string"},
            "accessToken": {"type": "string"},
            "refresh_token": {"type": "string"},
            "refreshToken": {"type": "string"},
            "expiry_date": {"type": "integer"},
            "expiryDate": {"type": "integer"},
            "token_type": {"type": "string"},
            "tokenType": {"type": "string"}
        }
    })
}

fn format_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["minimal", "full", "raw", "metadata"],
        "description": "Detail level for the returned payload"
    })
}

fn outgoing_email_properties() -> Value {
    json!({
        "to": {"type": "array", "items": {"type": "string"}, "description": "Recipients"},
        "cc": {"type": "array", "items": {"type": "string"}},
        "bcc": {"type": "array", "items": {"type": "string"}},
        "subject": {"type": "string"},
        "body": {"type": "string"},
        "html": {"type": "boolean", "description": "Send the body as HTML"},
        "inReplyTo": {"type": "string", "description": "Message ID being replied to"},
        "threadId": {"type": "string"}
    })
}

// ==================== Dispatch plumbing ====================

/// Parse tool arguments; a failure becomes an error-flagged payload.
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, CallToolResult> {
    serde_json::from_value(args).map_err(|e| {
        CallToolResult::error(McpError::InvalidArguments {
            message: e.to_string(),
        })
    })
}

/// Resolve credentials and build the single-call client.
fn connect(credentials: Option<RawTokenBundle>) -> Result<GmailClient, CallToolResult> {
    GmailClient::connect(credentials).map_err(CallToolResult::error)
}

/// JSON-serialize an operation result into the text payload.
fn json_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string(value) {
        Ok(text) => CallToolResult::text(text),
        Err(e) => CallToolResult::error(e),
    }
}

// ==================== Tool handlers ====================

async fn list_messages_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
        #[serde(flatten)]
        opts: ListMessagesOptions,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client.list_messages(args.user_id.as_deref(), &args.opts).await {
        Ok(list) => json_result(&list),
        Err(e) => CallToolResult::error(e),
    }
}

async fn search_messages_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        query: String,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
        #[serde(flatten)]
        opts: ListMessagesOptions,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client
        .search_messages(args.user_id.as_deref(), &args.query, &args.opts)
        .await
    {
        Ok(list) => json_result(&list),
        Err(e) => CallToolResult::error(e),
    }
}

async fn get_message_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        id: String,
        format: Option<MessageFormat>,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client
        .get_message(args.user_id.as_deref(), &args.id, args.format)
        .await
    {
        Ok(message) => json_result(&message),
        Err(e) => CallToolResult::error(e),
    }
}

async fn outgoing_email_tool(args: Value, draft: bool) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
        #[serde(flatten)]
        email: OutgoingEmail,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    if draft {
        match client.create_draft(args.user_id.as_deref(), &args.email).await {
            Ok(created) => json_result(&created),
            Err(e) => CallToolResult::error(e),
        }
    } else {
        match client.send_message(args.user_id.as_deref(), &args.email).await {
            Ok(message) => json_result(&message),
            Err(e) => CallToolResult::error(e),
        }
    }
}

async fn list_labels_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client.list_labels(args.user_id.as_deref()).await {
        Ok(labels) => json_result(&labels),
        Err(e) => CallToolResult::error(e),
    }
}

async fn modify_message_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        id: String,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let changes = ModifyMessageRequest {
        add_label_ids: args.add_label_ids,
        remove_label_ids: args.remove_label_ids,
    };

    match client
        .modify_message(args.user_id.as_deref(), &args.id, &changes)
        .await
    {
        Ok(message) => json_result(&message),
        Err(e) => CallToolResult::error(e),
    }
}

async fn trash_message_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        id: String,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client.trash_message(args.user_id.as_deref(), &args.id).await {
        Ok(message) => json_result(&message),
        Err(e) => CallToolResult::error(e),
    }
}

async fn untrash_message_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        id: String,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client.untrash_message(args.user_id.as_deref(), &args.id).await {
        Ok(message) => json_result(&message),
        Err(e) => CallToolResult::error(e),
    }
}

async fn list_threads_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
        #[serde(flatten)]
        opts: ListThreadsOptions,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client.list_threads(args.user_id.as_deref(), &args.opts).await {
        Ok(list) => json_result(&list),
        Err(e) => CallToolResult::error(e),
    }
}

async fn get_thread_tool(args: Value) -> CallToolResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        id: String,
        format: Option<MessageFormat>,
        user_id: Option<String>,
        credentials: Option<RawTokenBundle>,
    }

    let args: Args = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    let client = match connect(args.credentials) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match client
        .get_thread(args.user_id.as_deref(), &args.id, args.format)
        .await
    {
        Ok(thread) => json_result(&thread),
        Err(e) => CallToolResult::error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_every_operation() {
        let tools = registry();
        let names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "list_messages",
                "search_messages",
                "get_message",
                "send_message",
                "create_draft",
                "list_labels",
                "modify_message",
                "trash_message",
                "untrash_message",
                "list_threads",
                "get_thread",
            ]
        );
    }

    #[test]
    fn test_every_tool_accepts_embedded_credentials() {
        for tool in registry() {
            let props = &tool.input_schema["properties"];
            assert!(
                props.get("credentials").is_some(),
                "{} lacks credentials",
                tool.name
            );
            assert!(props.get("userId").is_some(), "{} lacks userId", tool.name);
        }
    }

    #[test]
    fn test_get_message_format_is_closed_enum() {
        let tools = registry();
        let get_message = tools.iter().find(|t| t.name == "get_message").unwrap();
        let formats = &get_message.input_schema["properties"]["format"]["enum"];
        assert_eq!(*formats, json!(["minimal", "full", "raw", "metadata"]));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_flagged() {
        let result = dispatch("archive_message", json!({})).await;
        assert!(result.is_error);
        assert!(result.first_text().contains("Unknown tool: archive_message"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_error_flagged() {
        // get_message requires an id
        let result = dispatch("get_message", json!({"format": "full"})).await;
        assert!(result.is_error);
        assert!(result.first_text().contains("Invalid tool arguments"));
    }
}
