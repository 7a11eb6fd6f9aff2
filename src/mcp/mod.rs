//! MCP（Model Context Protocol）伺服器
//!
//! ```text
//! HTTP POST /mcp ──▶ transport ──▶ server (JSON-RPC 分派) ──▶ tools / resources
//!                                                                 │
//!                                                   ConnectionState::lock()
//!                                                                 │
//!                                                            StkRoot (Connect)
//! ```
//!
//! 協定版本 2024-11-05。

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
