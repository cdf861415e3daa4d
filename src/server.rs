//! MCP server over stdio. The `rmcp` runtime owns the JSON-RPC framing and the
//! handshake; this handler only lists the tools and runs them.

use crate::client::SmartSystem;
use crate::tools::{handle_tool_call, tool_definitions};
use log::{debug, info};
use rmcp::{
    Error as McpError, RoleServer, ServerHandler, ServiceExt, model::*, service::RequestContext,
    transport::stdio,
};
use serde_json::Value;
use std::sync::Arc;

pub const SERVER_NAME: &str = "gardena-smart-system";

#[derive(Clone)]
pub struct GardenaServer {
    api: Arc<dyn SmartSystem>,
}

impl GardenaServer {
    pub fn new(api: Arc<dyn SmartSystem>) -> Self {
        GardenaServer { api }
    }
}

impl ServerHandler for GardenaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Inspect and control GARDENA smart system devices: list locations, get devices, send commands."
                    .into(),
            ),
        }
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        info!(
            "Client {} {} initialised (protocol {:?})",
            request.client_info.name, request.client_info.version, request.protocol_version
        );
        // answer in the client's protocol version
        Ok(InitializeResult {
            protocol_version: request.protocol_version,
            ..self.get_info()
        })
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: tool_definitions(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        let args = Value::Object(request.arguments.unwrap_or_default());
        debug!("tools/call {}", name);

        // the upstream client blocks
        let api = Arc::clone(&self.api);
        let result = tokio::task::spawn_blocking(move || handle_tool_call(&name, &args, api.as_ref()))
            .await
            .map_err(|e| McpError::internal_error(format!("tool task failed: {}", e), None))?;
        Ok(result.into_call_result())
    }
}

/// Serve until the client closes stdin.
pub async fn serve_stdio(api: Arc<dyn SmartSystem>) -> Result<(), String> {
    info!("{} listening on stdio", SERVER_NAME);
    let running = GardenaServer::new(api)
        .serve(stdio())
        .await
        .map_err(|e| format!("MCP handshake failed: {}", e))?;
    let reason = running
        .waiting()
        .await
        .map_err(|e| format!("MCP service stopped unexpectedly: {}", e))?;
    info!("Input closed; shutting down ({:?})", reason);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::FakeSystem;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
    use tokio::io::{DuplexStream, duplex, split};

    struct Session {
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl Session {
        async fn start() -> Self {
            let (client, server) = duplex(64 * 1024);
            tokio::spawn(async move {
                let running = GardenaServer::new(Arc::new(FakeSystem::new()))
                    .serve(split(server))
                    .await
                    .expect("handshake");
                let _ = running.waiting().await;
            });
            let (reader, writer) = split(client);
            Session {
                lines: BufReader::new(reader).lines(),
                writer,
            }
        }

        async fn send(&mut self, message: Value) {
            let line = format!("{}\n", message);
            self.writer.write_all(line.as_bytes()).await.expect("write");
            self.writer.flush().await.expect("flush");
        }

        async fn recv(&mut self) -> Value {
            let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
                .await
                .expect("response in time")
                .expect("read")
                .expect("line");
            serde_json::from_str(&line).expect("json response")
        }

        async fn handshake(&mut self, protocol_version: &str) -> Value {
            self.send(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": protocol_version,
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "0.0.1" }
                }
            }))
            .await;
            let reply = self.recv().await;
            self.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await;
            reply
        }
    }

    #[tokio::test]
    async fn initialize_advertises_tools_in_client_version() {
        let mut session = Session::start().await;
        let reply = session.handshake("2025-03-26").await;
        assert_eq!(reply["id"], json!(1));
        assert_eq!(reply["result"]["protocolVersion"], json!("2025-03-26"));
        assert_eq!(reply["result"]["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn lists_the_three_tools() {
        let mut session = Session::start().await;
        session.handshake("2024-11-05").await;
        session.send(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;
        let reply = session.recv().await;
        let names = reply["result"]["tools"]
            .as_array()
            .expect("tool array")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert_eq!(names, ["list_locations", "get_devices", "send_command"]);
        assert_eq!(
            reply["result"]["tools"][1]["inputSchema"]["required"],
            json!(["locationId"])
        );
    }

    #[tokio::test]
    async fn tool_call_runs_the_handler() {
        let mut session = Session::start().await;
        session.handshake("2024-11-05").await;
        session
            .send(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "send_command",
                    "arguments": {
                        "locationId": "loc-1",
                        "deviceId": "e41b77d3-mower",
                        "command": "PARK_UNTIL_FURTHER_NOTICE"
                    }
                }
            }))
            .await;
        let reply = session.recv().await;
        assert_eq!(reply["id"], json!(3));
        assert_ne!(reply["result"]["isError"], json!(true));
        assert_eq!(
            reply["result"]["content"][0]["text"],
            json!("Sent command PARK_UNTIL_FURTHER_NOTICE to device e41b77d3-mower")
        );
    }

    #[tokio::test]
    async fn failing_tool_is_flagged_not_fatal() {
        let mut session = Session::start().await;
        session.handshake("2024-11-05").await;
        session
            .send(json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "get_devices", "arguments": {} }
            }))
            .await;
        let reply = session.recv().await;
        assert_eq!(reply["result"]["isError"], json!(true));
        assert_eq!(reply["result"]["content"][0]["text"], json!("Error: locationId is required"));
    }
}
