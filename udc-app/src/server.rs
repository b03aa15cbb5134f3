//! Line-delimited JSON-RPC 2.0 front end over stdio.
//!
//! One request per input line, one response per output line. Notifications
//! (requests without an `id`) get no response.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use udc_tools::Dispatcher;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn rpc_result(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn rpc_error(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

pub struct Server {
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handles one raw input line. Returns `None` for notifications and
    /// blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                return Some(rpc_error(Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        let id = request.get("id").cloned();
        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return Some(rpc_error(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request: missing method",
            ));
        };
        let params = request.get("params").cloned().unwrap_or(Value::Null);

        let Some(id) = id else {
            debug!("Notification: {}", method);
            return None;
        };

        Some(self.handle_request(id, method, params).await)
    }

    async fn handle_request(&self, id: Value, method: &str, params: Value) -> Value {
        match method {
            "initialize" => rpc_result(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {
                        "name": "udc",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                    "capabilities": { "tools": {} },
                }),
            ),
            "ping" => rpc_result(id, json!({})),
            "tools/list" => rpc_result(
                id,
                json!({ "tools": self.dispatcher.registry().schemas() }),
            ),
            "tools/call" => {
                let Some(name) = params.get("name").and_then(Value::as_str) else {
                    return rpc_error(id, INVALID_PARAMS, "Invalid params: missing tool name");
                };
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
                let envelope = self.dispatcher.invoke(name, arguments).await;
                rpc_result(id, envelope.to_mcp_content())
            }
            other => {
                warn!("Unknown method: {}", other);
                rpc_error(id, METHOD_NOT_FOUND, &format!("Method not found: {other}"))
            }
        }
    }

    /// Serves requests until the reader reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Serving {} tools over stdio", self.dispatcher.registry().count());
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                let mut encoded = response.to_string();
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("Input closed, shutting down");
        Ok(())
    }
}
