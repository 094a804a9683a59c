// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keepsake - archives chat events into session buckets.
//!
//! This is the binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keepsake_config::KeepsakeConfig;

/// Keepsake - archives chat events into session buckets.
#[derive(Parser, Debug)]
#[command(name = "keepsake", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Archive OneBot events read line by line until the input ends or a
    /// shutdown signal arrives.
    Serve {
        /// Event source; `-` reads standard input.
        #[arg(long)]
        input: Option<String>,
    },
    /// Archive every event of a newline-delimited capture file, then exit.
    Archive {
        file: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&std::path::Path>) -> KeepsakeConfig {
    let loaded = match path {
        Some(path) => keepsake_config::load_and_validate_path(path),
        None => keepsake_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            keepsake_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve { input }) => {
            if let Some(input) = input {
                config.onebot.input = input;
            }
            serve::run_serve(config).await
        }
        Some(Commands::Archive { file }) => {
            config.onebot.input = file.display().to_string();
            serve::run_archive(config).await
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(text) => {
                print!("{text}");
                Ok(())
            }
            Err(e) => Err(keepsake_core::KeepsakeError::Internal(format!(
                "cannot render configuration: {e}"
            ))),
        },
        None => {
            println!("keepsake: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("keepsake: {e}");
        std::process::exit(1);
    }
}
