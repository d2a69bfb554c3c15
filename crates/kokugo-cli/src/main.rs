//! Kokugo CLI Application
//!
//! Command-line interface and MCP server for drafting Japanese-language
//! lesson plans.

mod args;
mod cli;
mod mcp;
mod renderer;

use std::time::Duration;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use kokugo_core::SessionBuilder;
use log::info;
use mcp::{run_stdio_server, KokugoMcpServer};
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        data_dir,
        user,
        endpoint,
        debounce_ms,
        no_color,
        command,
    } = Args::parse();

    let mut session = SessionBuilder::new()
        .with_data_dir(data_dir)
        .with_user_id(user)
        .with_endpoint(endpoint)
        .with_debounce(Duration::from_millis(debounce_ms))
        .build()
        .await
        .context("Failed to initialize session")?;

    let restored = session.restore().await;
    info!("Kokugo started ({restored:?} draft restored)");

    if let Some(Serve) = command {
        info!("Starting Kokugo MCP server");
        return run_stdio_server(KokugoMcpServer::new(session))
            .await
            .context("MCP server failed");
    }

    let mut cli = Cli::new(session, TerminalRenderer::new(!no_color));
    let result = match command {
        Some(Draft { command }) => cli.handle_draft_command(command).await,
        Some(Plan { command }) => cli.handle_plan_command(command).await,
        Some(Models { command }) => cli.handle_model_command(command).await,
        Some(Serve) | None => cli.show_draft(),
    };
    cli.finish().await;
    result
}
