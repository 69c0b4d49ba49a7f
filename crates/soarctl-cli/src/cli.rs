use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "soarctl")]
#[command(about = "Idempotent configuration management for SOAR platforms")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config and manifest)
    #[arg(short, long, global = true, env = "SOARCTL_URL")]
    pub url: Option<String>,

    /// API key sent as the Authorization header
    #[arg(long, global = true, env = "SOARCTL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "SOARCTL_PROFILE", default_value = "default")]
    pub profile: String,

    /// Skip TLS certificate verification (self-signed deployments only)
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Overall request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Compute and report changes without mutating the remote system
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a desired-state manifest
    Apply(ApplyArgs),
    /// Synchronize content to tenant accounts
    Sync(SyncArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Path to the manifest file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Default tenant account for resources that do not set one
    #[arg(long)]
    pub account: Option<String>,
}

#[derive(clap::Args)]
pub struct SyncArgs {
    /// Account to synchronize (repeatable)
    #[arg(long = "account", conflicts_with = "all_accounts")]
    pub accounts: Vec<String>,

    /// Synchronize every tenant account
    #[arg(long)]
    pub all_accounts: bool,

    /// Content item to synchronize (repeatable)
    #[arg(long = "item", conflicts_with = "all_items")]
    pub items: Vec<String>,

    /// Synchronize every changed content item
    #[arg(long)]
    pub all_items: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (url, api_key)
    pub key: String,
    /// Value
    pub value: String,
}
