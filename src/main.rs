use anyhow::{bail, Context};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use stk_mcp::config::cli::{Cli, Command, RunArgs};
use stk_mcp::mcp::tools::tool_definitions;
use stk_mcp::mcp::{transport, McpServer};
use stk_mcp::utils::logger::{self, LogFormat};
use stk_mcp::utils::monitor::SystemMonitor;
use stk_mcp::utils::validation::Validate;
use stk_mcp::{StkConfig, StkLifespan};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::ListTools => {
            list_tools();
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = StkConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);

    logger::init_logger(&config.log_level, LogFormat::parse(&config.log_format));

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if !args.mode.is_supported_on_this_platform() {
        bail!("STK Desktop mode is only available on Windows. Use '--mode engine'.");
    }

    let addr: SocketAddr = args
        .bind_address(&config)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.default_host, config.default_port))?;

    tracing::info!("Starting STK-MCP server in {} mode...", args.mode);
    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let lifespan = StkLifespan::start(args.mode, &config).await;
    let server = McpServer::new(lifespan.state(), Arc::new(config))
        .with_monitor(SystemMonitor::new(args.monitor));

    let served = transport::serve(server, addr).await;
    lifespan.shutdown().await;
    served.context("MCP server terminated with an error")?;

    Ok(())
}

fn list_tools() {
    let tools = tool_definitions();
    if tools.is_empty() {
        println!("No tools have been registered on the server.");
        return;
    }

    let width = tools
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0)
        .max("Tool Name".len());

    println!("STK-MCP Available Tools");
    println!("{:<width$}  Description", "Tool Name", width = width);
    println!("{:-<width$}  {:-<11}", "", "", width = width);
    for tool in tools {
        println!("{:<width$}  {}", tool.name, tool.description, width = width);
    }
}
