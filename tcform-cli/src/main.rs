//! tcform CLI
//!
//! Command-line front-end for converging TeamCity build configurations and
//! project features from JSON descriptions.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tcform")]
#[command(about = "Declarative TeamCity configuration", long_about = None)]
struct Cli {
    /// TeamCity server URL
    #[arg(long, global = true, env = "TEAMCITY_ADDR")]
    address: Option<String>,

    /// Access token (wins over username and password)
    #[arg(long, global = true, env = "TEAMCITY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Username for HTTP basic auth
    #[arg(long, global = true, env = "TEAMCITY_USER")]
    username: Option<String>,

    /// Password for HTTP basic auth
    #[arg(long, global = true, env = "TEAMCITY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "TEAMCITY_TIMEOUT", default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcform=info,tcform_engine=info,tcform_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        address: cli.address,
        token: cli.token,
        username: cli.username,
        password: cli.password,
        timeout: cli.timeout,
    };

    handle_command(cli.command, &config).await
}
