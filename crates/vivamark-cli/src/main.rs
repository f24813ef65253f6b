//! vivamark CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vivamark", version, about = "Timed, randomized viva questionnaire")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sit a timed exam session
    Exam {
        /// Candidate identifier (e.g. employee id)
        #[arg(long)]
        candidate: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Mark the accumulated answer history
    Mark {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank JSON file
    Validate {
        /// Path to the question bank
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vivamark=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Exam { candidate, config } => commands::exam::execute(candidate, config).await,
        Commands::Mark { config } => commands::mark::execute(config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
