use bigclam::config::*;
use bigclam::graph_io::read_graph_file;
use bigclam::{BigClam, ClamError, Communities};

use clap::Parser;
use log::{info, warn};
use matrix_util::common_io::write_lines;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
pub struct FitArgs {
    /// graph file: `n m k` followed by `m` pairs of 0-based node
    /// indices (`.gz` is fine)
    #[arg(required = true)]
    graph_file: Box<str>,

    /// number of communities (overrides `k` in the graph file)
    #[arg(long, short = 'k')]
    communities: Option<usize>,

    /// convergence tolerance on |gradient|
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    /// learning rate of the gradient ascent
    #[arg(long, short = 'r', default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    /// L2 regularization coefficient
    #[arg(long, default_value_t = DEFAULT_LAMBDA)]
    lambda: f64,

    /// membership threshold (default: sqrt(1 - ln(1 - epsilon)))
    #[arg(long, short = 't')]
    threshold: Option<f64>,

    /// floor on edge and non-edge probabilities
    #[arg(long, default_value_t = DEFAULT_PROB_FLOOR)]
    prob_floor: f64,

    /// give up after this many sweeps
    #[arg(long)]
    max_sweeps: Option<usize>,

    /// give up after this many seconds
    #[arg(long)]
    max_seconds: Option<f64>,

    /// double-buffered parallel sweeps instead of sequential in-place
    /// updates (different trajectory)
    #[arg(long, default_value_t = false)]
    jacobi: bool,

    /// random seed for the initial affinities
    #[arg(long)]
    seed: Option<u64>,

    /// number of worker threads (default: all logical CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// log a progress line every this many sweeps
    #[arg(long, default_value_t = DEFAULT_LOG_EVERY)]
    log_every: usize,

    /// print the communities even when the sweep/time budget ran out
    #[arg(long, default_value_t = false)]
    accept_unconverged: bool,

    /// list memberships per node instead of per community
    #[arg(long, default_value_t = false)]
    by_node: bool,

    /// output file (default: stdout)
    #[arg(long, short, default_value = "stdout")]
    out: Box<str>,

    /// show progress bar
    #[arg(long, default_value_t = false)]
    progress: bool,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Fit BigClam to a graph file and print the communities
pub fn run_fit(args: FitArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let num_threads = args.threads.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let max_duration = args
        .max_seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid --max-seconds: {}", e))?;

    let input = read_graph_file(&args.graph_file)?;
    let k = args.communities.unwrap_or(input.num_communities);
    let graph = input.to_graph()?;

    let config = ClamConfig {
        epsilon: args.epsilon,
        learning_rate: args.learning_rate,
        lambda: args.lambda,
        threshold: args.threshold,
        prob_floor: args.prob_floor,
        max_sweeps: args.max_sweeps,
        max_duration,
        schedule: if args.jacobi {
            UpdateSchedule::Jacobi
        } else {
            UpdateSchedule::GaussSeidel
        },
        seed: args.seed,
        log_every: args.log_every,
        show_progress: args.progress,
    };

    info!(
        "fitting k={} on {} threads, threshold={}",
        k,
        num_threads,
        config.membership_threshold()
    );

    let n = graph.num_nodes();
    let mut model = BigClam::new(graph, k, config)?;

    match model.fit() {
        Ok(report) => {
            info!(
                "converged: {} sweeps, {:.2?}, {} clamped",
                report.sweeps, report.elapsed, report.clamp_count
            );
        }
        Err(ClamError::NonConvergence {
            sweeps,
            max_abs_gradient,
        }) if args.accept_unconverged => {
            warn!(
                "reporting unconverged result after {} sweeps (max |gradient| = {:.3e})",
                sweeps, max_abs_gradient
            );
        }
        Err(e) => return Err(e.into()),
    }

    let lines = output_lines(&model.communities(), n, args.by_node);
    write_lines(&lines, &args.out)?;
    Ok(())
}

/// One line per community, or one `node<TAB>labels` line per node
fn output_lines(communities: &Communities, n: usize, by_node: bool) -> Vec<String> {
    if by_node {
        communities
            .node_memberships(n)
            .iter()
            .enumerate()
            .map(|(i, cs)| {
                let labels: Vec<String> = cs.iter().map(|j| (j + 1).to_string()).collect();
                format!("{}\t{}", i, labels.join(","))
            })
            .collect()
    } else {
        communities.to_string().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigclam::{extract_communities, FactorMatrix};
    use ndarray::array;

    fn communities() -> Communities {
        let f = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0]
        ];
        extract_communities(&FactorMatrix::from_array(f).unwrap(), 0.5)
    }

    #[test]
    fn community_lines_follow_display() {
        let communities = communities();
        let lines = output_lines(&communities, 4, false);
        assert_eq!(
            lines,
            vec!["Community 1: [0, 1, 2]", "Community 2: []", "Community 3: [2, 3]"]
        );
        assert_eq!(lines.join("\n") + "\n", communities.to_string());
    }

    #[test]
    fn node_lines_list_one_based_labels() {
        assert_eq!(
            output_lines(&communities(), 5, true),
            vec!["0\t1", "1\t1", "2\t1,3", "3\t3", "4\t"]
        );
    }
}
