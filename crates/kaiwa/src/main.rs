// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kaiwa - a multi-conversation chat session backend.
//!
//! This is the binary entry point for the Kaiwa daemon.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Kaiwa - a multi-conversation chat session backend.
#[derive(Parser, Debug)]
#[command(name = "kaiwa", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Kaiwa session daemon.
    Serve,
    /// Print the effective configuration and exit.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match kaiwa_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("kaiwa: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("kaiwa serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("agent.log_level = {}", config.agent.log_level);
            println!("agent.cooldown_secs = {}", config.agent.cooldown_secs);
            println!(
                "agent.flush_interval_secs = {}",
                config.agent.flush_interval_secs
            );
            println!("storage.history_dir = {}", config.storage.history_dir);
            println!("storage.state_dir = {}", config.storage.state_dir);
            println!("gemini.model = {}", config.gemini.model);
            println!("gemini.api_keys = {} configured", config.gemini.api_keys.len());
        }
        None => {
            println!("kaiwa: use --help for available commands");
        }
    }
}
