//! Clap derive structures for the `nettopo` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nettopo_core::model::{NodeStatus, NodeType};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nettopo -- inspect, arrange and replay network topologies
#[derive(Debug, Parser)]
#[command(
    name = "nettopo",
    version,
    about = "Inspect, arrange and replay network topologies",
    long_about = "Works against a topology backend (configured profile or --server)\n\
        or offline against a topology JSON file (--file). Offline edits are\n\
        written back to the file.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "NETTOPO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "NETTOPO_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token (overrides profile)
    #[arg(long, env = "NETTOPO_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Work offline against a topology JSON file
    #[arg(long, short = 'f', env = "NETTOPO_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETTOPO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NETTOPO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage nodes
    #[command(alias = "node", alias = "n")]
    Nodes(NodesArgs),

    /// Manage node-to-node connections
    #[command(alias = "conn", alias = "c")]
    Connections(ConnectionsArgs),

    /// Manage groups and group-to-group links
    #[command(alias = "group", alias = "g")]
    Groups(GroupsArgs),

    /// Compute a hierarchical layout and commit it
    Arrange(ArrangeArgs),

    /// Show derived connection and group statuses
    Status,

    /// Apply a file of recorded sync events
    Replay(ReplayArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NODES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List nodes
    #[command(alias = "ls")]
    List {
        /// Only nodes of this type
        #[arg(long = "type", short = 't')]
        node_type: Option<NodeType>,

        /// Only nodes with this status
        #[arg(long)]
        status: Option<NodeStatus>,

        /// Only members of this group
        #[arg(long, short = 'g', conflicts_with = "ungrouped")]
        group: Option<String>,

        /// Only nodes outside any group
        #[arg(long)]
        ungrouped: bool,
    },

    /// Show node details
    Get {
        /// Node ID
        id: String,
    },

    /// Create a node
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Node type (e.g. router, switch, internet)
        #[arg(long = "type", short = 't', default_value = "OTHER")]
        node_type: NodeType,

        /// Group to place the node in
        #[arg(long, short = 'g')]
        group: Option<String>,

        /// Monitored IP address
        #[arg(long)]
        ip: Option<String>,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
    },

    /// Rename or retype a node
    Update {
        /// Node ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", short = 't')]
        node_type: Option<NodeType>,
    },

    /// Delete a node and every connection touching it
    #[command(alias = "rm")]
    Delete {
        /// Node ID
        id: String,
    },

    /// Move a node on the canvas
    Move {
        /// Node ID
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Put a node into a group, or take it out
    Assign {
        /// Node ID
        id: String,

        /// Target group ID
        #[arg(long, short = 'g', required_unless_present = "ungroup")]
        group: Option<String>,

        /// Remove the node from its group
        #[arg(long, conflicts_with = "group")]
        ungroup: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONNECTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: ConnectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConnectionsCommand {
    /// List connections
    #[command(alias = "ls")]
    List {
        /// Only connections leaving this node
        #[arg(long)]
        from: Option<String>,

        /// Only connections entering this node
        #[arg(long)]
        to: Option<String>,

        /// Only active uplinks
        #[arg(long)]
        active: bool,
    },

    /// Connect two nodes
    Create {
        /// Source node ID
        source: String,

        /// Target node ID
        target: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        bandwidth: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        animated: bool,
    },

    /// Edit a connection's label, bandwidth or color
    Update {
        /// Connection ID
        id: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        bandwidth: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        animated: Option<bool>,
    },

    /// Delete a connection
    #[command(alias = "rm")]
    Delete {
        /// Connection ID
        id: String,
    },

    /// Make an internet uplink the active source for its target
    Activate {
        /// Connection ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List groups with member counts and status
    #[command(alias = "ls")]
    List,

    /// Show group details
    Get {
        /// Group ID
        id: String,
    },

    /// Create a group
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// Rename or restyle a group
    Update {
        /// Group ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        opacity: Option<f64>,
    },

    /// Delete a group; members become ungrouped
    #[command(alias = "rm")]
    Delete {
        /// Group ID
        id: String,
    },

    /// Move (and optionally resize) a group
    Move {
        /// Group ID
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// Link two groups
    Link {
        /// Source group ID
        source: String,

        /// Target group ID
        target: String,

        #[arg(long)]
        label: Option<String>,
    },

    /// Remove a group-to-group link
    Unlink {
        /// Group connection ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ARRANGE / REPLAY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ArrangeArgs {
    /// Print the computed placements without committing them
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Newline-delimited event frames (`-` for stdin)
    pub events: PathBuf,

    /// Apply one event per animation frame instead of as fast as possible
    #[arg(long)]
    pub paced: bool,

    /// Write the resulting topology back to --file
    #[arg(long)]
    pub save: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with a server profile
    Init {
        /// Backend URL, e.g. http://localhost:3000
        #[arg(long)]
        server: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Environment variable holding the bearer token
        #[arg(long)]
        token_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }
}
