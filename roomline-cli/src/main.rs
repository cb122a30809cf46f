//! Main entry point for the Roomline CLI.

use std::{io, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use timeline::config::{ConfigFormat, TimelineConfig};

mod commands;
mod tracer;

/// Roomline CLI
#[derive(Parser)]
#[command(name = "roomline")]
#[command(about = "Replay chat timeline diffs and inspect the reconciled result", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Roomline CLI
#[derive(Subcommand)]
enum Commands {
    /// Replay a diff script through a timeline and print every published snapshot
    Replay {
        /// Path to the replay script
        #[arg(
            long,
            short,
            help = "Path to the replay script (YAML or JSON) with `initial` items and `steps`."
        )]
        script: PathBuf,

        /// Path to the configuration file (optional)
        #[arg(
            long,
            short,
            help = "Path to the configuration file (e.g., roomline.yaml, roomline.json or roomline.toml). If not provided, defaults will be used."
        )]
        config: Option<PathBuf>,

        /// Debounce window override in milliseconds
        #[arg(
            long,
            short,
            help = "Debounce window in milliseconds; overrides the configuration file and environment."
        )]
        window_ms: Option<u64>,

        /// Print one JSON document per snapshot instead of a table
        #[arg(long, help = "Print one JSON document per published snapshot.")]
        json: bool,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate
        #[arg(
            long,
            short,
            default_value = "yaml",
            help = "Format of the configuration file to generate (yaml, json or toml)."
        )]
        format: ConfigFormat,

        /// Where to write the file; `-` prints to stdout
        #[arg(
            long,
            short,
            help = "Output path for the configuration file. Defaults to roomline.<format>; use '-' for stdout."
        )]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script
        #[arg(
            long,
            short,
            value_enum,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            config,
            window_ms,
            json,
        } => {
            let config = TimelineConfig::load_config(config.as_deref(), window_ms)
                .context("failed to load configuration")?;
            tracer::initialize_tracing(&config.logging)?;
            commands::replay::run_replay(&script, &config, json, &mut io::stdout()).await?;
        }
        Commands::Config { format, output } => {
            commands::config::generate_config(format, output.as_deref())?;
        }
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell, &mut io::stdout());
        }
    }

    Ok(())
}
