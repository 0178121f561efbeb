mod run_fit;
mod run_simulate;

use crate::run_fit::*;
use crate::run_simulate::*;

use clap::{Parser, Subcommand};

/// Overlapping community detection by nonnegative matrix factorization
#[derive(Parser, Debug)]
#[command(version, about, long_about, term_width = 80)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit BigClam affinities to a graph file and print the communities
    Fit(FitArgs),

    /// Simulate a graph with planted overlapping communities
    #[command(alias = "sim")]
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Fit(args) => {
            run_fit(args.clone())?;
        }
        Commands::Simulate(args) => {
            run_simulate(args.clone())?;
        }
    }

    Ok(())
}
