use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "kiscollect")]
#[command(about = "KIS market data collection core", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show descriptor state for collected datasets
    Status {
        /// Restrict to one feature path
        #[arg(short, long)]
        feature: Option<String>,
        /// Restrict to one dataset code
        #[arg(short, long)]
        code: Option<String>,
    },
    /// Print the update history of one dataset
    History {
        #[arg(short, long)]
        feature: String,
        #[arg(short, long)]
        code: String,
        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Check table files against their descriptors (hash and row count)
    Verify {
        #[arg(short, long)]
        feature: Option<String>,
        #[arg(short, long)]
        code: Option<String>,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { feature, code } => {
            commands::status::run(feature, code);
        }
        Commands::History { feature, code, limit } => {
            commands::history::run(feature, code, limit);
        }
        Commands::Verify { feature, code } => {
            commands::verify::run(feature, code);
        }
    }
}
