//! ordertalk-agent CLI: gateway or stdio mode.
//!
//! Settings come from `packages/conf/settings.yaml` merged with the user config home.
//!
//! Logging: set `RUST_LOG=ordertalk_agent=debug` (or `warn`) to change verbosity on stderr.

mod cli;
mod nodes;
mod pipeline_builder;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ordertalk_agent::{load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::{run_gateway_mode, run_stdio_mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ordertalk_agent=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();

    match cli.command {
        Command::Gateway {
            bind,
            turn_timeout,
            max_concurrent,
        } => run_gateway_mode(bind, turn_timeout, max_concurrent, &runtime_settings).await,
        Command::Stdio {
            session_id,
            user_id,
        } => run_stdio_mode(user_id, session_id, &runtime_settings).await,
    }
}
