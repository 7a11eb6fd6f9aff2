use crate::mcp::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, PARSE_ERROR,
};
use crate::mcp::server::McpServer;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub const MCP_PATH: &str = "/mcp";

/// HTTP 路由：`POST /mcp` 接收單一 JSON-RPC 訊息，`GET /health` 給存活檢查
pub fn router(server: McpServer) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_mcp))
        .route("/health", get(liveness))
        .with_state(server)
}

async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// 本文自行解析：JSON 格式錯誤或缺少 Content-Type 也回 JSON-RPC 錯誤
async fn handle_mcp(State(server): State<McpServer>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            return rejected(JsonRpcError::new(
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    };
    let request: JsonRpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return rejected(JsonRpcError::new(
                INVALID_REQUEST,
                format!("Invalid JSON-RPC message: {}", e),
            ))
        }
    };

    match server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn rejected(error: JsonRpcError) -> Response {
    tracing::warn!("Rejected MCP request: {}", error.message);
    let response = JsonRpcResponse::error(Value::Null, error);
    (StatusCode::BAD_REQUEST, Json(response)).into_response()
}

/// 綁定位址並服務到收到 Ctrl-C 為止
pub async fn serve(server: McpServer, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "🚀 STK-MCP server listening on http://{}{}",
        listener.local_addr()?,
        MCP_PATH
    );
    serve_listener(server, listener, shutdown_signal()).await
}

/// 在已綁定的 listener 上服務，直到 `shutdown` 完成
pub async fn serve_listener<F>(
    server: McpServer,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
