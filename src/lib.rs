pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod mcp;
pub mod utils;

pub use config::StkConfig;
pub use core::session::{ConnectionState, Lifecycle, StkLifespan};
pub use domain::model::StkMode;
pub use domain::ports::StkRoot;
pub use mcp::McpServer;
pub use utils::error::{Result, StkError};
