//! Overlapping community detection by nonnegative matrix factorization
//! (BigClam).
//!
//! Each node carries a nonnegative affinity vector over `k` latent
//! communities. The affinities are fitted by projected gradient ascent
//! on an approximate log-likelihood of the observed edges, and a node
//! joins every community where its affinity exceeds a threshold τ.
//!
//! # Model
//!
//! ```text
//! P(i ~ u) = 1 - exp(-F[i]·F[u])
//! ```
//!
//! # References
//!
//! Yang & Leskovec (2013). "Overlapping community detection at scale:
//! a nonnegative matrix factorization approach." WSDM.

/// Error taxonomy and `Result` alias
pub mod error;

/// Tuning parameters (ε, η, λ, τ, δ, caps)
pub mod config;

/// Immutable undirected graph
pub mod graph;

/// Nonnegative node × community affinity matrix
pub mod factor_matrix;

/// Partial derivatives of the approximate log-likelihood
pub mod gradient;

/// Projected gradient ascent loop
pub mod optimizer;

/// Threshold-based community extraction
pub mod communities;

/// Plain-text `n m k` + edge-pair graph files
pub mod graph_io;

/// Planted overlapping-community graphs
pub mod simulate;

pub use communities::{extract_communities, Communities};
pub use config::{ClamConfig, UpdateSchedule};
pub use error::{ClamError, Result};
pub use factor_matrix::FactorMatrix;
pub use graph::Graph;
pub use optimizer::{AscentState, FitReport, Optimizer, SweepSummary};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A graph, its fitted (or being fitted) factors, and the tuning used.
///
/// # Usage
///
/// ```ignore
/// use bigclam::{BigClam, ClamConfig, Graph};
///
/// let graph = Graph::from_edges(3, vec![(0, 1), (1, 2), (0, 2)])?;
/// let mut model = BigClam::new(graph, 1, ClamConfig::default())?;
/// model.fit()?;
/// println!("{}", model.communities());
/// ```
pub struct BigClam {
    graph: Graph,
    factors: FactorMatrix,
    config: ClamConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl BigClam {
    /// Validate the configuration and draw the initial factors
    /// (`U[0,1)`, seeded by `config.seed` when given).
    ///
    /// * `graph` - observed graph
    /// * `k` - number of communities (>= 1)
    /// * `config` - tuning parameters
    pub fn new(graph: Graph, k: usize, config: ClamConfig) -> Result<Self> {
        config.validate()?;
        let factors = match config.seed {
            Some(seed) => {
                FactorMatrix::random(graph.num_nodes(), k, &mut StdRng::seed_from_u64(seed))?
            }
            None => FactorMatrix::random_unseeded(graph.num_nodes(), k)?,
        };
        Ok(BigClam {
            graph,
            factors,
            config,
            cancel: None,
        })
    }

    /// Start from given factors instead of a random draw
    pub fn with_factors(graph: Graph, factors: FactorMatrix, config: ClamConfig) -> Result<Self> {
        config.validate()?;
        if factors.nrows() != graph.num_nodes() {
            return Err(ClamError::InvalidConfiguration(format!(
                "factor matrix has {} rows for {} nodes",
                factors.nrows(),
                graph.num_nodes()
            )));
        }
        Ok(BigClam {
            graph,
            factors,
            config,
            cancel: None,
        })
    }

    /// Stop fitting with `ClamError::Cancelled` once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the ascent loop. On `NonConvergence` or `Cancelled` the
    /// best-effort factors remain available through [`BigClam::factors`].
    pub fn fit(&mut self) -> Result<FitReport> {
        let mut optimizer = Optimizer::new(&self.graph, &mut self.factors, &self.config)?;
        if let Some(flag) = &self.cancel {
            optimizer = optimizer.with_cancel(flag.clone());
        }
        optimizer.run()
    }

    /// Communities at the configured threshold τ
    pub fn communities(&self) -> Communities {
        extract_communities(&self.factors, self.config.membership_threshold())
    }

    /// Communities at an arbitrary threshold
    pub fn communities_at(&self, threshold: f64) -> Communities {
        extract_communities(&self.factors, threshold)
    }

    /// The observed graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Current factor matrix
    pub fn factors(&self) -> &FactorMatrix {
        &self.factors
    }

    /// Take ownership of the factor matrix
    pub fn into_factors(self) -> FactorMatrix {
        self.factors
    }

    /// Tuning in use
    pub fn config(&self) -> &ClamConfig {
        &self.config
    }
}

/// One-call entry point: build the graph from `edges`, fit `k`
/// communities and extract them at τ.
///
/// * `n` - number of nodes
/// * `edges` - undirected 0-based pairs
/// * `k` - number of communities
/// * `config` - tuning parameters
pub fn detect_communities<I>(
    n: usize,
    edges: I,
    k: usize,
    config: ClamConfig,
) -> Result<(Communities, FitReport)>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let graph = Graph::from_edges(n, edges)?;
    let mut model = BigClam::new(graph, k, config)?;
    let report = model.fit()?;
    let communities = model.communities();
    info!(
        "{} of {} communities non-empty",
        communities.num_nonempty(),
        communities.len()
    );
    Ok((communities, report))
}
