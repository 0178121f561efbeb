use bigclam::graph_io::write_graph_file;
use bigclam::simulate::{planted_overlapping_graph, SimArgs};

use clap::Parser;
use log::info;
use matrix_util::common_io::write_lines;

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// number of nodes
    #[arg(long, short = 'n', default_value_t = 100)]
    nodes: usize,

    /// number of planted communities
    #[arg(long, short = 'k', default_value_t = 3)]
    communities: usize,

    /// nodes per community
    #[arg(long, short = 's', default_value_t = 30)]
    size: usize,

    /// nodes shared by consecutive communities
    #[arg(long, default_value_t = 5)]
    overlap: usize,

    /// edge probability within a community
    #[arg(long, default_value_t = 0.3)]
    p_in: f64,

    /// background edge probability
    #[arg(long, default_value_t = 0.01)]
    p_out: f64,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// output graph file (`.gz` is fine)
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// output file for the planted memberships, one community per line
    #[arg(long)]
    truth: Option<Box<str>>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Simulate a planted overlapping-community graph
pub fn run_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let sim = planted_overlapping_graph(&SimArgs {
        num_nodes: args.nodes,
        num_communities: args.communities,
        community_size: args.size,
        overlap: args.overlap,
        p_in: args.p_in,
        p_out: args.p_out,
        rseed: args.rseed,
    })?;

    write_graph_file(&args.out, args.nodes, args.communities, &sim.edges)?;

    if let Some(truth_file) = &args.truth {
        let lines: Vec<String> = sim
            .membership
            .iter()
            .map(|members| {
                members
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        write_lines(&lines, truth_file)?;
        info!("wrote planted memberships to {}", truth_file);
    }

    Ok(())
}
