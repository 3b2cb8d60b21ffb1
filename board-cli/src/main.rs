//! # board-cli
//!
//! Command-line front end for the kanban board sync engine.
//!
//! ## Commands
//!
//! - `init`: Write a default `board.toml`
//! - `show`: Print the board (creates the default lists on an empty store)
//! - `add`: Append a card to a list
//! - `edit`: Rename a card
//! - `rm`: Delete a card
//! - `mv`: Move a card to a position in a list
//!
//! ## Example
//!
//! ```bash
//! # Create a config using a local JSON store
//! board-cli init
//!
//! # Show the board
//! board-cli show
//!
//! # Add a card and move it
//! board-cli add "To Do" "Write tests"
//! board-cli mv card-4 "In Progress" 0
//! ```

use anyhow::{Context, Result};
use board_client::{BoardClient, HttpGateway, RemoteGateway};
use board_types::CardId;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod store;

use commands::{add, edit, init, mv, rm, show};
use config::{BoardConfig, ConfigError, GatewayKind};
use store::JsonFileGateway;

/// Command-line front end for the kanban board sync engine.
#[derive(Parser, Debug)]
#[command(name = "board-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "board.toml")]
    config: PathBuf,

    /// JSON data file (overrides [gateway] path and selects the file backend)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the board
    Show,

    /// Append a card to a list
    Add {
        /// List id or title
        list: String,
        /// Card title
        title: String,
    },

    /// Rename a card
    Edit {
        /// Card id
        card: String,
        /// New title
        title: String,
    },

    /// Delete a card
    Rm {
        /// Card id
        card: String,
    },

    /// Move a card to a position in a list
    Mv {
        /// Card id
        card: String,
        /// Destination list id or title
        list: String,
        /// Destination index (clamped to the list length)
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Commands::Init { .. } => BoardConfig::default(),
        _ => BoardConfig::load_or_default(&cli.config)?,
    };
    init_logging(&config, cli.verbose);

    match &cli.command {
        Commands::Init { force } => {
            init::run(&cli.config, *force)?;
        }
        Commands::Show => {
            let client = connect(&config, &cli).await?;
            show::run(&client.board())?;
        }
        Commands::Add { list, title } => {
            let client = connect(&config, &cli).await?;
            add::run(&client, list, title).await?;
        }
        Commands::Edit { card, title } => {
            let client = connect(&config, &cli).await?;
            edit::run(&client, &CardId::new(card.as_str()), title).await?;
        }
        Commands::Rm { card } => {
            let client = connect(&config, &cli).await?;
            rm::run(&client, &CardId::new(card.as_str())).await?;
        }
        Commands::Mv { card, list, index } => {
            let client = connect(&config, &cli).await?;
            mv::run(&client, &CardId::new(card.as_str()), list, *index).await?;
        }
    }

    Ok(())
}

/// Open the configured gateway and load the board.
async fn connect(config: &BoardConfig, cli: &Cli) -> Result<BoardClient<Arc<dyn RemoteGateway>>> {
    let gateway = open_gateway(config, &cli.config, cli.data.as_deref())?;
    let client = BoardClient::new(gateway);
    client.activate().await.context("Failed to load the board")?;
    Ok(client)
}

/// Log to stderr. `RUST_LOG` wins over `-v`, which wins over the config.
fn init_logging(config: &BoardConfig, verbose: u8) {
    let level = match verbose {
        0 => config.log.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the gateway selected by the config.
fn open_gateway(config: &BoardConfig, config_path: &Path, data: Option<&Path>) -> Result<Arc<dyn RemoteGateway>> {
    if let Some(path) = data {
        return Ok(Arc::new(JsonFileGateway::new(path)));
    }

    let gateway: Arc<dyn RemoteGateway> = match config.gateway.kind {
        GatewayKind::File => Arc::new(JsonFileGateway::new(config.data_path(config_path))),
        GatewayKind::Http => {
            let url = config
                .gateway
                .url
                .as_deref()
                .ok_or(ConfigError::MissingField("url"))?;
            let api_key = config
                .gateway
                .api_key
                .as_deref()
                .ok_or(ConfigError::MissingField("api_key"))?;
            Arc::new(HttpGateway::new(url, api_key))
        }
    };
    Ok(gateway)
}
