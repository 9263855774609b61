//! Clap derive structures for the `practrack` CLI.
//!
//! Kept free of crate-internal imports: `build.rs` includes this file to
//! render man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// practrack -- track coding practice sessions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "practrack",
    version,
    about = "Track coding practice sessions and attempts",
    long_about = "Command-line client for a practice-tracking server.\n\n\
        Manage practice sessions and the individual practice attempts\n\
        recorded within them.",
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
    #[arg(long, short = 'p', env = "PRACTRACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'u', env = "PRACTRACK_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token (overrides profile credentials)
    #[arg(long, env = "PRACTRACK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PRACTRACK_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "PRACTRACK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile; 30 when unset)
    #[arg(long, env = "PRACTRACK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Manage practice sessions
    #[command(alias = "session", alias = "s")]
    Sessions(EntityArgs),

    /// Manage practice attempts
    #[command(alias = "practice", alias = "pr")]
    Practices(EntityArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Entity commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List all records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get {
        /// Record id
        id: i64,
    },

    /// Create a record from field assignments
    Create(FieldArgs),

    /// Replace a record: unset fields keep their current value
    Update {
        /// Record id
        id: i64,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Send only the given fields
    Patch {
        /// Record id
        id: i64,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record id
        id: i64,
    },
}

/// Paging and sorting for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Sort clause, e.g. `id,desc` (repeatable)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Zero-based page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size (used with --page)
    #[arg(long, default_value = "20")]
    pub size: u32,

    /// Request newline-delimited JSON from the server
    #[arg(long)]
    pub ndjson: bool,
}

#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Field assignment `name=value` (repeatable). Names accept
    /// camelCase, snake_case or kebab-case; dates use `YYYY-MM-DDTHH:MM`
    /// in local time.
    #[arg(long = "set", short = 's', value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,
}

/// Split `name=value` at the first `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the current configuration (secrets redacted)
    Show,

    /// Set a profile key
    Set {
        /// Key: url, auth_mode, token_env, username, remember_me, insecure, timeout, ca_cert
        key: String,
        /// Value
        value: String,
    },

    /// Log in (or prompt for a token) and store it in the system keyring
    SetToken {
        /// Profile to update (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
