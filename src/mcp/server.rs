use crate::config::StkConfig;
use crate::core::session::ConnectionState;
use crate::mcp::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, JSONRPC_VERSION,
    MCP_PROTOCOL_VERSION, SERVER_INSTRUCTIONS, SERVER_NAME,
};
use crate::mcp::{resources, tools};
use crate::utils::monitor::SystemMonitor;
use serde_json::{json, Value};
use std::sync::Arc;

/// MCP 請求分派。狀態由 lifespan 建立後傳入，本身不持有 STK 連線。
#[derive(Clone)]
pub struct McpServer {
    state: Arc<ConnectionState>,
    config: Arc<StkConfig>,
    monitor: Arc<SystemMonitor>,
}

impl McpServer {
    pub fn new(state: Arc<ConnectionState>, config: Arc<StkConfig>) -> Self {
        Self {
            state,
            config,
            monitor: Arc::new(SystemMonitor::new(false)),
        }
    }

    pub fn with_monitor(mut self, monitor: SystemMonitor) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// 處理單一 JSON-RPC 訊息；通知回傳 None
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request.method);
            return None;
        };

        tracing::debug!("<- {} (id={})", request.method, id);
        let result = self.dispatch(&request.method, request.params).await;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => tracing::info!("MCP client initialized"),
            other => tracing::debug!("Ignoring notification '{}'", other),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.unwrap_or(Value::Null);
        match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?
                    .to_string();
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

                let output = tools::call_tool(&self.state, &self.config, &name, arguments).await?;
                self.monitor.log_stats(&name);

                let (text, is_error) = match output {
                    Ok(text) => (text, false),
                    Err(text) => (text, true),
                };
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": is_error,
                }))
            }
            "resources/list" => Ok(json!({ "resources": resources::resource_definitions() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": resources::resource_templates() }))
            }
            "resources/read" => {
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonRpcError::invalid_params("Missing resource uri"))?;
                let result = resources::read_resource(&self.state, &self.config, uri).await;
                self.monitor.log_stats(uri);
                result
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": SERVER_INSTRUCTIONS
        })
    }
}
