//! Startup configuration
//!
//! CLI flags come from clap; model settings come from the environment
//! (after `.env` is loaded). Both end up in plain structs handed downward.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Parser, ValueEnum};
use thiserror::Error;

use agent_runtime::AzureOpenAiConfig;

pub const ENV_GATEWAY_URL: &str = "APIM_RESOURCE_GATEWAY_URL";
pub const ENV_SUBSCRIPTION_KEY: &str = "APIM_SUBSCRIPTION_KEY";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--port is required for the networked transport")]
    MissingPort,

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// Menu agent MCP server
#[derive(Debug, Parser)]
#[command(name = "menu-agent-server", version, about)]
pub struct Cli {
    /// Transport to serve the agent over
    #[arg(long, value_enum, default_value_t = TransportKind::Stream)]
    pub transport: TransportKind,

    /// Port to listen on (networked transport only)
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind (networked transport only)
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Line-delimited JSON-RPC over stdin/stdout
    #[value(alias = "stdio")]
    Stream,
    /// Server-Sent Events over HTTP
    #[value(alias = "sse")]
    Networked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportConfig {
    Stream,
    Networked { addr: SocketAddr },
}

impl TransportConfig {
    pub fn from_args(
        kind: TransportKind,
        port: Option<u16>,
        host: IpAddr,
    ) -> Result<Self, ConfigError> {
        match (kind, port) {
            (TransportKind::Stream, _) => Ok(Self::Stream),
            (TransportKind::Networked, Some(port)) => Ok(Self::Networked {
                addr: SocketAddr::new(host, port),
            }),
            (TransportKind::Networked, None) => Err(ConfigError::MissingPort),
        }
    }
}

impl TryFrom<&Cli> for TransportConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        Self::from_args(cli.transport, cli.port, cli.host)
    }
}

/// Model settings from the process environment
pub fn model_config_from_env() -> Result<AzureOpenAiConfig, ConfigError> {
    model_config_from(|name| std::env::var(name).ok())
}

/// Model settings from any variable lookup
pub fn model_config_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AzureOpenAiConfig, ConfigError> {
    let require = |name: &'static str| -> Result<String, ConfigError> {
        let value = lookup(name).ok_or(ConfigError::MissingEnv(name))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ConfigError::InvalidEnv {
                name,
                reason: "empty value".into(),
            });
        }
        Ok(value)
    };

    let gateway = require(ENV_GATEWAY_URL)?;
    if !(gateway.starts_with("https://") || gateway.starts_with("http://")) {
        return Err(ConfigError::InvalidEnv {
            name: ENV_GATEWAY_URL,
            reason: "expected an http(s) URL".into(),
        });
    }

    Ok(AzureOpenAiConfig::new(
        gateway,
        require(ENV_SUBSCRIPTION_KEY)?,
        require(ENV_API_VERSION)?,
        require(ENV_DEPLOYMENT)?,
    ))
}
