//! Integration tests for gmail-bridge
//!
//! Protocol-shape tests for the tool server plus end-to-end runs of the
//! credential resolver and façade against a stubbed Gmail endpoint.

use serde_json::{json, Value};

use gmail_bridge::config::AuthConfig;
use gmail_bridge::gmail::client::GmailClient;
use gmail_bridge::gmail::credentials::{Authenticator, CredentialSources, RawTokenBundle};
use gmail_bridge::gmail::types::{Label, ListMessagesOptions, OutgoingEmail};
use gmail_bridge::{ApiError, GmailBridgeError};

/// Helper to create a JSON-RPC request
fn make_request(id: i64, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(p) = params {
        request["params"] = p;
    }
    request
}

/// Build a façade from a raw bundle, pointed at a stub endpoint
fn stub_client(bundle: RawTokenBundle, endpoint: &str) -> GmailClient {
    let authenticator = Authenticator::new(AuthConfig::default(), bundle.normalize());
    GmailClient::new(authenticator).with_base_url(endpoint)
}

mod protocol_shape {
    use super::*;

    #[test]
    fn test_call_tool_request_format() {
        let request = make_request(
            3,
            "tools/call",
            Some(json!({
                "name": "search_messages",
                "arguments": {
                    "query": "from:test@example.com",
                    "maxResults": 10
                }
            })),
        );

        assert_eq!(request["method"], "tools/call");
        assert_eq!(request["params"]["name"], "search_messages");
        assert_eq!(
            request["params"]["arguments"]["query"],
            "from:test@example.com"
        );
    }

    #[test]
    fn test_registry_schemas_are_objects() {
        for tool in gmail_bridge::mcp::tools::registry() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);
        }
    }

    #[test]
    fn test_required_fields_declared() {
        let tools = gmail_bridge::mcp::tools::registry();
        let required_of = |name: &str| -> Value {
            tools
                .iter()
                .find(|t| t.name == name)
                .unwrap()
                .input_schema["required"]
                .clone()
        };

        assert_eq!(required_of("get_message"), json!(["id"]));
        assert_eq!(required_of("search_messages"), json!(["query"]));
        assert_eq!(required_of("send_message"), json!(["to", "body"]));
        assert_eq!(required_of("list_labels"), Value::Null);
    }
}

mod credential_to_facade {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Token file in camel convention, resolved and normalized, drives an
    /// authenticated list-labels call against a stub mailbox.
    #[tokio::test]
    async fn test_file_credentials_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        std::fs::write(&token_path, r#"{"accessToken":"X","refreshToken":"Y"}"#).unwrap();

        let sources = CredentialSources {
            supplied: None,
            env_json: None,
            token_path,
        };
        let tokens = sources.resolve().unwrap().normalize();
        assert_eq!(tokens.access_token.as_deref(), Some("X"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("Y"));

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/labels"))
            .and(header("authorization", "Bearer X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "labels": [{"id": "INBOX", "name": "INBOX"}]
            })))
            .mount(&server)
            .await;

        let client = GmailClient::new(Authenticator::new(AuthConfig::default(), tokens))
            .with_base_url(server.uri());

        let labels = client.list_labels(None).await.unwrap();
        assert_eq!(
            labels,
            vec![Label {
                id: "INBOX".to_string(),
                name: "INBOX".to_string(),
                label_type: None,
                message_list_visibility: None,
                label_list_visibility: None,
                messages_total: None,
                messages_unread: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_list_collection_comes_back_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSizeEstimate": 0
            })))
            .mount(&server)
            .await;

        let client = stub_client(
            RawTokenBundle {
                access_token: Some("X".to_string()),
                ..Default::default()
            },
            &server.uri(),
        );

        let list = client
            .list_messages(None, &ListMessagesOptions::default())
            .await
            .unwrap();
        assert!(list.messages.is_empty());
    }

    #[tokio::test]
    async fn test_remote_error_message_propagates_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND"
                }
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let err = client.get_message(None, "missing", None).await.unwrap_err();

        match err {
            GmailBridgeError::Api(ApiError::Remote { message }) => {
                assert_eq!(message, "Requested entity was not found.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unrecognized_failure_shape_becomes_unknown_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/labels"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let err = client.list_labels(None).await.unwrap_err();

        assert!(matches!(err, GmailBridgeError::Api(ApiError::Unknown)));
        assert!(err.to_string().to_lowercase().contains("unknown error"));
    }
}

mod outgoing_mail {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn sent_envelope(server: &MockServer) -> (Value, String) {
        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let raw = body["raw"].as_str().unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap();
        (body, decoded)
    }

    fn stub_send_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"id": "sent-1", "threadId": "t-1"}))
    }

    #[tokio::test]
    async fn test_send_joins_recipients_and_sets_html_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(stub_send_response())
            .mount(&server)
            .await;

        let client = stub_client(
            RawTokenBundle {
                access_token: Some("X".to_string()),
                ..Default::default()
            },
            &server.uri(),
        );

        let email = OutgoingEmail {
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: Some("Greetings".to_string()),
            body: "<p>Hi</p>".to_string(),
            html: Some(true),
            ..Default::default()
        };

        let message = client.send_message(None, &email).await.unwrap();
        assert_eq!(message.id, "sent-1");

        let (_, envelope) = sent_envelope(&server).await;
        assert!(envelope.contains("To: a@example.com, b@example.com"));
        assert!(envelope.contains("Content-Type: text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_reply_headers_and_thread_id_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(stub_send_response())
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());

        let email = OutgoingEmail {
            to: vec!["a@example.com".to_string()],
            body: "Re: hello".to_string(),
            in_reply_to: Some("<orig-42@mail.example.com>".to_string()),
            thread_id: Some("t-42".to_string()),
            ..Default::default()
        };

        client.send_message(None, &email).await.unwrap();

        let (body, envelope) = sent_envelope(&server).await;
        assert_eq!(body["threadId"], "t-42");
        assert!(envelope.contains("In-Reply-To: <orig-42@mail.example.com>"));
        assert!(envelope.contains("References: <orig-42@mail.example.com>"));
    }

    #[tokio::test]
    async fn test_create_draft_wraps_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/drafts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "draft-1",
                "message": {"id": "m-1", "threadId": "t-1"}
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());

        let email = OutgoingEmail {
            to: vec!["a@example.com".to_string()],
            body: "Draft body".to_string(),
            ..Default::default()
        };

        let draft = client.create_draft(None, &email).await.unwrap();
        assert_eq!(draft.id, "draft-1");
        assert_eq!(draft.message.id, "m-1");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["message"]["raw"].is_string());
    }
}

mod mailbox_operations {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_message_forwards_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages/m-7"))
            .and(query_param("format", "metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-7",
                "threadId": "t-7",
                "snippet": "hello"
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let message = client
            .get_message(
                None,
                "m-7",
                Some(gmail_bridge::gmail::types::MessageFormat::Metadata),
            )
            .await
            .unwrap();
        assert_eq!(message.snippet.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_modify_forwards_label_changes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/m-1/modify"))
            .and(body_partial_json(json!({
                "addLabelIds": ["STARRED"],
                "removeLabelIds": ["INBOX"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-1",
                "labelIds": ["STARRED"]
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let changes = gmail_bridge::gmail::types::ModifyMessageRequest {
            add_label_ids: Some(vec!["STARRED".to_string()]),
            remove_label_ids: Some(vec!["INBOX".to_string()]),
        };
        let message = client.modify_message(None, "m-1", &changes).await.unwrap();
        assert_eq!(message.label_ids, vec!["STARRED"]);
    }

    #[tokio::test]
    async fn test_trash_and_untrash_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/m-2/trash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-2",
                "labelIds": ["TRASH"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/m-2/untrash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-2",
                "labelIds": ["INBOX"]
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());

        let trashed = client.trash_message(None, "m-2").await.unwrap();
        assert_eq!(trashed.label_ids, vec!["TRASH"]);

        let restored = client.untrash_message(None, "m-2").await.unwrap();
        assert_eq!(restored.label_ids, vec!["INBOX"]);
    }

    #[tokio::test]
    async fn test_search_sends_query_and_page_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/messages"))
            .and(query_param("q", "is:unread"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": "m-1", "threadId": "t-1"}],
                "nextPageToken": "page-3"
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let opts = ListMessagesOptions {
            page_token: Some("page-2".to_string()),
            ..Default::default()
        };
        let list = client.search_messages(None, "is:unread", &opts).await.unwrap();
        assert_eq!(list.messages.len(), 1);
        assert_eq!(list.next_page_token.as_deref(), Some("page-3"));
    }

    #[tokio::test]
    async fn test_threads_list_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "threads": [{"id": "t-1", "snippet": "hi"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/threads/t-1"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "t-1",
                "messages": [{"id": "m-1", "threadId": "t-1"}]
            })))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());

        let list = client
            .list_threads(None, &gmail_bridge::gmail::types::ListThreadsOptions::default())
            .await
            .unwrap();
        assert_eq!(list.threads[0].id, "t-1");

        let thread = client.get_thread(None, "t-1", None).await.unwrap();
        assert_eq!(thread.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_mailbox_id_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/user@example.com/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"labels": []})))
            .mount(&server)
            .await;

        let client = stub_client(RawTokenBundle::default(), &server.uri());
        let labels = client.list_labels(Some("user@example.com")).await.unwrap();
        assert!(labels.is_empty());
    }
}
