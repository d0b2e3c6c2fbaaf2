use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ordertalk_agent::{DEFAULT_STDIO_SESSION_ID, DEFAULT_USER_ID};

#[derive(Parser)]
#[command(name = "ordertalk-agent")]
#[command(about = "Shipment tracking dialog backend: HTTP gateway or stdio turns.")]
pub(crate) struct Cli {
    /// Override config home (user settings are read from `<conf>/ordertalk/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run HTTP server (POST /api/v1/logistics/order_talk). Default bind: 0.0.0.0:8000
    Gateway {
        /// Listen address (overrides `gateway.bind`)
        #[arg(long)]
        bind: Option<String>,

        /// Per-turn timeout in seconds (overrides `gateway.turn_timeout_secs`; default 120)
        #[arg(long)]
        turn_timeout: Option<u64>,

        /// Max concurrent turns (overrides `gateway.max_concurrent_turns`; omit for no limit)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
    /// Read lines from stdin, run one turn per line, print the reply. Exit on EOF or Ctrl+C.
    Stdio {
        /// Session ID for the conversation
        #[arg(long, default_value = DEFAULT_STDIO_SESSION_ID)]
        session_id: String,

        /// User ID owning the session
        #[arg(long, default_value = DEFAULT_USER_ID)]
        user_id: String,
    },
}
