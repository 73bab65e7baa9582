//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swcache - versioned offline cache manager
///
/// Routes web requests through network-first and cache-first strategies
/// and garbage-collects cache generations across deployments.
#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured version and activate it
    Install,

    /// Re-run activation: claim clients and delete stale stores
    Activate,

    /// Deliver a control message, e.g. '{"type":"SKIP_WAITING"}'
    Message(MessageArgs),

    /// Route one request through the active version
    Fetch(FetchArgs),

    /// Show versions and store health
    Status,

    /// Inspect or purge cache stores
    Stores(StoresArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// JSON payload
    pub payload: String,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Treat as a top-level navigation
    #[arg(long)]
    pub navigate: bool,

    /// Accept header
    #[arg(long)]
    pub accept: Option<String>,

    /// Destination hint (image, script, style, font, document, ...)
    #[arg(long)]
    pub destination: Option<String>,

    /// Extra request header ('Name: value'), repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Print status line and headers before the body
    #[arg(short, long)]
    pub include: bool,
}

/// Arguments for the stores command
#[derive(Parser, Debug)]
pub struct StoresArgs {
    #[command(subcommand)]
    pub action: StoresAction,
}

/// Stores subcommands
#[derive(Subcommand, Debug)]
pub enum StoresAction {
    /// List all cache stores
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one store
    Show {
        /// Store name, e.g. assets-<version>
        name: String,
    },

    /// Delete every store and forget the registration
    Purge {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., worker.version)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// One name per line
    Plain,
}

/// Parse a header in `Name: value` format
fn parse_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid header '{s}': expected 'Name: value'"))?;
    let name = s[..pos].trim();
    if name.is_empty() {
        return Err(format!("invalid header '{s}': empty name"));
    }
    Ok((name.to_string(), s[pos + 1..].trim().to_string()))
}
