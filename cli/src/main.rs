//! PortWarden CLI - Inspect and toggle reachable ports on a remote host
//!
//! A command-line tool for listing listening sockets, ufw rules and
//! published container ports side by side, and for allowing or blocking
//! ports through ufw over SSH.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portwarden_core::{DefaultPortWarden, RuleProtocol};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "portwarden")]
#[command(author, version, about = "Inspect and toggle reachable ports on a remote host")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file (defaults to ~/.portwarden/settings.json)
    #[arg(long, global = true, env = "PORTWARDEN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sockets, container ports and firewall rules per port
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show ufw status with rule ids
    Status,

    /// Allow a port through ufw
    Allow {
        port: u16,

        /// tcp, udp or any
        #[arg(long, default_value = "any")]
        proto: RuleProtocol,
    },

    /// Delete a ufw rule by the id shown in `status`
    #[command(alias = "rm")]
    Delete { rule_id: u32 },

    /// Delete every ufw rule covering a port
    Block {
        port: u16,

        /// tcp, udp or any
        #[arg(long, default_value = "any")]
        proto: RuleProtocol,
    },

    /// Manage custom port labels
    Label {
        #[command(subcommand)]
        action: LabelAction,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum LabelAction {
    /// Set a label for a port
    Set {
        port: u16,
        name: String,
        #[arg(long, default_value = "any")]
        proto: RuleProtocol,
    },
    /// Remove a label
    #[command(alias = "rm")]
    Remove {
        port: u16,
        #[arg(long, default_value = "any")]
        proto: RuleProtocol,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings with secrets masked
    Show,
    /// Change one setting
    Set { key: String, value: String },
}

fn init_logging(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    tracing::debug!(config = ?cli.config, "Starting portwarden");

    let engine = match cli.config {
        Some(path) => DefaultPortWarden::with_config_path(path),
        None => DefaultPortWarden::open_default()?,
    };

    match cli.command {
        Some(Commands::List { port }) => commands::list::run(&engine, port, cli.json).await?,
        Some(Commands::Status) => commands::firewall::status(&engine, cli.json).await?,
        Some(Commands::Allow { port, proto }) => {
            commands::firewall::allow(&engine, port, proto).await?
        }
        Some(Commands::Delete { rule_id }) => commands::firewall::delete(&engine, rule_id).await?,
        Some(Commands::Block { port, proto }) => {
            commands::firewall::block(&engine, port, proto).await?
        }
        Some(Commands::Label { action }) => match action {
            LabelAction::Set { port, name, proto } => {
                commands::label::set(&engine, port, proto, &name).await?
            }
            LabelAction::Remove { port, proto } => {
                commands::label::remove(&engine, port, proto).await?
            }
        },
        Some(Commands::Config { action }) => match action {
            Some(ConfigAction::Set { key, value }) => {
                commands::config::set(&engine, &key, &value).await?
            }
            Some(ConfigAction::Show) | None => commands::config::show(&engine, cli.json).await?,
        },
        None => commands::list::run(&engine, None, cli.json).await?,
    }

    Ok(())
}
