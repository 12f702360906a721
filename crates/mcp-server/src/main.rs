//! Menu Agent MCP Server
//!
//! Publishes the menu agent as an MCP tool, over stdio (default) or SSE.
//!
//! ```text
//! menu-agent-server                                  # stdio
//! menu-agent-server --transport networked --port 8000 # SSE on 0.0.0.0:8000
//! ```

mod config;
mod handlers;
mod protocol;
mod session;
mod state;
mod transport;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::Agent;
use agent_runtime::AzureOpenAiProvider;
use menu_plugin::{MENU_AGENT_DESCRIPTION, MENU_AGENT_INSTRUCTIONS, MENU_AGENT_NAME, MenuPlugin};

use crate::config::{Cli, TransportConfig, model_config_from_env};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout belongs to the stdio transport
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let transport = TransportConfig::try_from(&cli)?;

    // Initialize LLM provider
    let model = model_config_from_env()?;
    tracing::info!(deployment = %model.deployment, "Using Azure OpenAI via gateway");
    let provider = Arc::new(AzureOpenAiProvider::new(model)?);

    // Initialize tools
    let tools = MenuPlugin::default().registry()?;
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = Agent::builder()
        .provider(provider)
        .tools(tools)
        .name(MENU_AGENT_NAME)
        .description(MENU_AGENT_DESCRIPTION)
        .instructions(MENU_AGENT_INSTRUCTIONS)
        .build()?;

    transport::serve(transport, Arc::new(agent)).await
}
