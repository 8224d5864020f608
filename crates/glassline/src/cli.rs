//! Clap derive structures for the `glassline` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use glassline_core::QueryType;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// glassline -- looking glass queries from the command line
#[derive(Debug, Parser)]
#[command(
    name = "glassline",
    version,
    about = "Run looking glass queries against network devices",
    long_about = "Run BGP route, community and AS path lookups, pings and traceroutes\n\
        against configured routers, over SSH or an HTTP query agent.",
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
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "GLASSLINE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GLASSLINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Raw output only (scripting)
    Plain,
}

impl OutputFormat {
    /// Formats meant for machines rather than people.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact | Self::Yaml)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// Run one query against a device
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Run queries from a file, one `location query-type target` per line
    Batch(BatchArgs),

    /// List configured devices
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Inspect configuration
    Config(ConfigArgs),

    /// Manage the result cache shared by every invocation
    Cache(CacheArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Device location id (see `glassline devices`)
    pub location: String,

    /// bgp_route, bgp_community, bgp_aspath, ping or traceroute
    pub query_type: QueryType,

    /// Prefix, address, community or AS path expression
    pub target: String,

    /// Skip the result cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Query file; `-` reads stdin
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file path
    Path,
    /// Load and validate configuration, resolving every credential
    Check,
    /// Print the effective configuration with secrets masked
    Show,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the results file path
    Path,
    /// Drop every cached result
    Clear,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
