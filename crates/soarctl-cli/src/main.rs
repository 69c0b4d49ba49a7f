mod cli;
mod commands;
mod config;
mod manifest;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Apply(args) => commands::apply::apply(&cli, args).await?,
        Commands::Sync(args) => commands::sync::sync(&cli, args).await?,
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let cfg = config::load_profile(&cli.profile)?;
                println!("Profile: {}", cli.profile);
                println!("URL: {}", cfg.url.as_deref().unwrap_or("(not set)"));
                println!(
                    "API key: {}",
                    if cfg.api_key.is_some() { "(set)" } else { "(not set)" }
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(&cli.profile)?;
                match set_args.key.as_str() {
                    "url" => cfg.url = Some(set_args.value.clone()),
                    "api_key" => cfg.api_key = Some(set_args.value.clone()),
                    other => {
                        anyhow::bail!("Unknown config key: {other}. Valid keys: url, api_key")
                    }
                }
                config::save_profile(&cli.profile, &cfg)?;
                output::print_success(&format!("Set {} for profile {}", set_args.key, cli.profile));
            }
        },
    }

    Ok(())
}
