use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tidywatch::cli::{Command, run_cli};
use tracing_subscriber::EnvFilter;

/// Sort the files of a directory into category folders by extension.
#[derive(Parser, Debug)]
#[command(name = "tidywatch", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "TIDYWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize the directory, then keep it organized until Ctrl-C
    Watch {
        /// Directory to organize
        #[arg(env = "TIDYWATCH_DIR")]
        dir: PathBuf,
    },
    /// Organize the directory once and exit
    Organize {
        /// Directory to organize
        #[arg(env = "TIDYWATCH_DIR")]
        dir: PathBuf,

        /// Show what would be moved without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Revert the most recent organization pass
    Undo {
        /// Directory that was organized
        #[arg(env = "TIDYWATCH_DIR")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let (command, dir) = match cli.command {
        Commands::Watch { dir } => (Command::Watch, dir),
        Commands::Organize { dir, dry_run } => (Command::Organize { dry_run }, dir),
        Commands::Undo { dir } => (Command::Undo, dir),
    };

    run_cli(command, &dir, cli.config.as_deref()).await
}
