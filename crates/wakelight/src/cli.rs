//! Clap derive structures for the `wakelight` CLI.
//!
//! Pulled into `build.rs` for man page generation, so this module may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wakelight -- remote Wake-on-LAN and LED control over a WebSocket
#[derive(Debug, Parser)]
#[command(
    name = "wakelight",
    version,
    about = "Wake-on-LAN and LED strip appliance driven over a WebSocket",
    long_about = "Connects to a control server over WebSocket, authenticates with an\n\
        HMAC-signed token, and serves wol, led, ping and config commands.\n\n\
        Reconnects with exponential backoff whenever the link drops.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path (defaults to the platform config directory)
    #[arg(long, env = "WAKELIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the server and serve commands until interrupted
    Run(RunArgs),

    /// Send a single Wake-on-LAN magic packet
    Wake(WakeArgs),

    /// Manage the config file and stored secret
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// WebSocket URL (overrides server.url)
    #[arg(long)]
    pub url: Option<String>,

    /// Shared secret (prefer the keyring or WAKELIGHT_SECRET)
    #[arg(long)]
    pub secret: Option<String>,
}

#[derive(Debug, Args)]
pub struct WakeArgs {
    /// Target MAC address (AA:BB:CC:DD:EE:FF, AA-BB-..., or AABBCCDDEEFF)
    pub mac: String,

    /// Broadcast address and port (overrides wol.broadcast)
    #[arg(long)]
    pub broadcast: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective config with secrets masked
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Store the shared secret in the system keyring
    SetSecret,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
