use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trindex-cmd")]
#[command(about = "Command-line utility for trindex posting emission")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the posting records of a JSON-lines document file
    Emit {
        /// Path to the JSON job configuration
        #[arg(short, long)]
        config: String,

        /// JSON-lines document file
        #[arg(short, long)]
        input: String,

        /// Output file for the records (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Sort the records by key before writing them
        #[arg(long)]
        sorted: bool,

        /// Maximum number of parallel workers (1 runs sequentially)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Emit, shuffle and merge a document file, printing the postings of every term
    Postings {
        /// Path to the JSON job configuration
        #[arg(short, long)]
        config: String,

        /// JSON-lines document file
        #[arg(short, long)]
        input: String,

        /// Maximum number of parallel workers (1 runs sequentially)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Emit {
            config,
            input,
            output,
            sorted,
            workers,
        } => commands::emit::run(config, input, output, sorted, workers),
        Commands::Postings {
            config,
            input,
            workers,
        } => commands::postings::run(config, input, workers),
    }
}
