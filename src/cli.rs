use crate::scanner::ScanCriteria;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dormant")]
#[command(about = "Find and safely remove inactive chat server accounts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to the user config dir)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Handle of the acting administrator")]
    pub caller: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args, Clone, Debug, Default)]
pub struct CriteriaArgs {
    #[arg(short = 'd', long, help = "Days without activity before a user counts as inactive")]
    pub inactive_days: Option<u32>,
    #[arg(long, help = "Only select users whose content matches the template")]
    pub require_unused: Option<bool>,
    #[arg(long, help = "Skip users storing more than this many bytes")]
    pub max_storage_bytes: Option<u64>,
    #[arg(long, help = "Drop the storage cap from the configured defaults")]
    pub no_storage_cap: bool,
    #[arg(long, help = "Skip users with an unexpired subscription")]
    pub exclude_active_subscriptions: Option<bool>,
}

impl CriteriaArgs {
    /// Overrides the configured defaults with whatever was given.
    pub fn apply(&self, defaults: ScanCriteria) -> ScanCriteria {
        let mut criteria = defaults;
        if let Some(days) = self.inactive_days {
            criteria.inactive_days = days;
        }
        if let Some(require) = self.require_unused {
            criteria.require_unused = require;
        }
        if self.no_storage_cap {
            criteria.max_storage_bytes = None;
        }
        if let Some(cap) = self.max_storage_bytes {
            criteria.max_storage_bytes = Some(cap);
        }
        if let Some(exclude) = self.exclude_active_subscriptions {
            criteria.exclude_active_subscriptions = exclude;
        }
        criteria
    }

    /// Flags that reproduce `criteria` regardless of the configured defaults.
    pub fn to_flags(criteria: &ScanCriteria) -> Vec<String> {
        let mut flags = vec![
            "-d".to_string(),
            criteria.inactive_days.to_string(),
            format!("--require-unused={}", criteria.require_unused),
            format!(
                "--exclude-active-subscriptions={}",
                criteria.exclude_active_subscriptions
            ),
        ];
        match criteria.max_storage_bytes {
            Some(cap) => flags.push(format!("--max-storage-bytes={}", cap)),
            None => flags.push("--no-storage-cap".to_string()),
        }
        flags
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Preview inactive users that would be deleted")]
    Scan {
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
        #[arg(short, long, help = "Write the preview to a file")]
        out: Option<String>,
    },
    #[command(about = "Delete the users of a confirmed preview")]
    Apply {
        #[arg(short, long, help = "Preview file written by 'scan --format json --out'")]
        from: Option<String>,
        #[arg(short, long)]
        token: Option<String>,
        #[arg(short, long, allow_negative_numbers = true)]
        count: Option<i64>,
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
        #[arg(short, long)]
        out: Option<String>,
    },
    #[command(about = "Compare a user's content with the template")]
    Audit {
        handle: String,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Compute the storage used by a user")]
    Size {
        handle: String,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "List all users")]
    Users {
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Manage a single user")]
    User {
        #[command(subcommand)]
        action: UserActions,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
    #[command(about = "View deletion history")]
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long, help = "Delete the history log")]
        clear: bool,
    },
    #[command(about = "Run as MCP server (for AI integration)")]
    Mcp,
}

#[derive(Subcommand)]
pub enum UserActions {
    #[command(about = "Disable login for a user")]
    Disable { handle: String },
    #[command(about = "Re-enable login for a user")]
    Enable { handle: String },
    #[command(about = "Grant admin rights")]
    Promote { handle: String },
    #[command(about = "Revoke admin rights")]
    Demote { handle: String },
    #[command(about = "Delete a user account")]
    Delete {
        handle: String,
        #[arg(long, help = "Also remove the user's data directory")]
        purge: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigActions {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Set a configuration value")]
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
    #[command(about = "Print the config file location")]
    Path,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
