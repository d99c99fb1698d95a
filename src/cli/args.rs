//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Shelter - offline asset cache for a static site
///
/// Precaches a site's bootstrap assets into versioned cache partitions and
/// answers requests from cache or network the way a page's offline
/// controller would.
#[derive(Parser, Debug)]
#[command(name = "shelter")]
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
    #[arg(short, long, global = true, env = "SHELTER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a controller version and precache its manifest
    Install(InstallArgs),

    /// Activate the waiting controller version
    Activate(ActivateArgs),

    /// Route one request through the active controller
    Fetch(FetchArgs),

    /// Inspect or clear cache partitions
    Partitions(PartitionsArgs),

    /// Deliver a push message
    Push(PushArgs),

    /// Deliver a notification click
    Click(ClickArgs),

    /// Post a control message from a page
    Message(MessageArgs),

    /// Show registration and lifecycle state
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Version to install (defaults to [cache].version)
    #[arg(value_name = "VERSION")]
    pub cache_version: Option<String>,
}

/// Arguments for the activate command
#[derive(Parser, Debug)]
pub struct ActivateArgs {
    /// An older version still controls open pages
    #[arg(long)]
    pub previous_holds_clients: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Request URL, usually origin-relative (e.g. /index.html)
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request destination (inferred from the path when omitted)
    #[arg(short, long)]
    pub destination: Option<DestinationArg>,

    /// Simulate a network outage
    #[arg(long)]
    pub offline: bool,

    /// Write the response body to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Request destination as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DestinationArg {
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Empty,
}

/// Arguments for the partitions command
#[derive(Parser, Debug)]
pub struct PartitionsArgs {
    /// Subcommand for partitions
    #[command(subcommand)]
    pub action: PartitionsAction,
}

/// Partition subcommands
#[derive(Subcommand, Debug)]
pub enum PartitionsAction {
    /// List all partitions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one partition
    Show {
        /// Partition name
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every partition
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Push payload text
    pub payload: Option<String>,
}

/// Arguments for the click command
#[derive(Parser, Debug)]
pub struct ClickArgs {
    /// Action id of the clicked button (explore, close)
    #[arg(short, long)]
    pub action: Option<String>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message to post
    #[command(subcommand)]
    pub kind: MessageKind,
}

/// Control messages
#[derive(Subcommand, Debug)]
pub enum MessageKind {
    /// Activate the waiting version now
    SkipWaiting,

    /// Install the configured version if it is newer
    CheckForUpdate,

    /// Post a raw JSON message
    Raw {
        /// JSON message body
        json: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
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

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.version)
        key: String,
        /// Value to set
        value: String,
    },
}
