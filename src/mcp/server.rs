//! Stdio server loop
//!
//! Reads one JSON-RPC request per line from stdin and writes one
//! response per line to stdout. Logging stays on stderr; stdout carries
//! nothing but protocol frames.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::protocol::*;
use crate::mcp::tools;

const SERVER_NAME: &str = "gmail-bridge";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stdio tool server
#[derive(Default)]
pub struct McpServer {
    initialized: bool,
}

impl McpServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run until stdin closes.
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                stdout.write_all(frame.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one request line. Returns `None` for notifications.
    async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    RequestId::Number(0),
                    RpcError::parse_error(e.to_string()),
                ));
            }
        };

        match request.method.as_str() {
            methods::INITIALIZED => {
                self.initialized = true;
                None
            }
            method => {
                let id = request.id.unwrap_or(RequestId::Number(0));
                Some(match method {
                    methods::INITIALIZE => {
                        JsonRpcResponse::success(id, initialize_result())
                    }
                    methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
                    methods::LIST_TOOLS => {
                        let result = ListToolsResult {
                            tools: tools::registry(),
                        };
                        match serde_json::to_value(result) {
                            Ok(value) => JsonRpcResponse::success(id, value),
                            Err(e) => JsonRpcResponse::failure(
                                id,
                                RpcError::parse_error(e.to_string()),
                            ),
                        }
                    }
                    methods::CALL_TOOL => {
                        if !self.initialized {
                            tracing::debug!("tools/call received before initialized notification");
                        }
                        JsonRpcResponse::success(id, call_tool(request.params).await)
                    }
                    other => {
                        JsonRpcResponse::failure(id, RpcError::method_not_found(other))
                    }
                })
            }
        }
    }
}

fn initialize_result() -> Value {
    serde_json::to_value(InitializeResult {
        protocol_version: PROTOCOL_VERSION,
        server_info: ServerInfo {
            name: SERVER_NAME,
            version: SERVER_VERSION,
        },
        capabilities: ServerCapabilities {
            tools: ToolsCapability::default(),
        },
    })
    .unwrap_or(Value::Null)
}

/// Invoke a tool; every failure ends up as an error-flagged payload, so
/// a bad call never takes the server down.
async fn call_tool(params: Option<Value>) -> Value {
    let params: CallToolParams = match params {
        Some(p) => match serde_json::from_value(p) {
            Ok(params) => params,
            Err(e) => {
                return tool_result_value(CallToolResult::error(format!(
                    "Invalid tool parameters: {}",
                    e
                )));
            }
        },
        None => {
            return tool_result_value(CallToolResult::error("Missing tool parameters"));
        }
    };

    tracing::debug!("tool call: {}", params.name);
    tool_result_value(tools::dispatch(&params.name, params.arguments).await)
}

fn tool_result_value(result: CallToolResult) -> Value {
    serde_json::to_value(&result).unwrap_or_else(|e| {
        serde_json::json!({
            "content": [{"type": "text", "text": format!("Error: {}", e)}],
            "isError": true,
        })
    })
}
