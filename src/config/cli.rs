use crate::config::StkConfig;
use crate::domain::model::StkMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stk-mcp")]
#[command(about = "A CLI for running and interacting with the STK-MCP server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the STK-MCP server
    Run(RunArgs),

    /// List all available MCP tools and their descriptions
    #[command(name = "list-tools")]
    ListTools,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// The host to bind the server to (default: STK_MCP_DEFAULT_HOST or 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// The port to run the server on (default: STK_MCP_DEFAULT_PORT or 8765)
    #[arg(long)]
    pub port: Option<u16>,

    /// STK execution mode. 'desktop' is only available on Windows
    #[arg(short, long, value_parser = parse_mode, default_value_t = StkMode::platform_default())]
    pub mode: StkMode,

    /// Log level: critical, error, warning, info, debug
    #[arg(long)]
    pub log_level: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log process CPU/memory after each STK request
    #[arg(long)]
    pub monitor: bool,
}

fn parse_mode(value: &str) -> Result<StkMode, String> {
    value.parse()
}

impl RunArgs {
    /// CLI 參數覆蓋設定檔與環境變數
    pub fn apply_to(&self, config: &mut StkConfig) {
        if let Some(host) = &self.host {
            config.default_host = host.clone();
        }
        if let Some(port) = self.port {
            config.default_port = port;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }

    pub fn bind_address(&self, config: &StkConfig) -> String {
        format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(&config.default_host),
            self.port.unwrap_or(config.default_port)
        )
    }
}
