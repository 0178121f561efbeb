//! Planted overlapping-community graphs for testing and demos.

use crate::error::{ClamError, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimArgs {
    pub num_nodes: usize,
    pub num_communities: usize,
    /// Nodes per planted community
    pub community_size: usize,
    /// Nodes shared by consecutive communities
    pub overlap: usize,
    /// Edge probability for a pair sharing at least one community
    pub p_in: f64,
    /// Edge probability for any other pair
    pub p_out: f64,
    pub rseed: u64,
}

pub struct SimOut {
    pub edges: Vec<(usize, usize)>,
    /// Planted members of each community, ascending
    pub membership: Vec<Vec<usize>>,
}

/// Communities are laid out as consecutive blocks of `community_size`
/// nodes, each starting `community_size - overlap` after the previous
/// one. Nodes past the last block belong to no community.
///
/// ```text
/// P(i ~ j) = p_in   if i and j share a community
///          = p_out  otherwise
/// ```
pub fn planted_overlapping_graph(args: &SimArgs) -> Result<SimOut> {
    let bad = |msg: String| Err(ClamError::InvalidConfiguration(msg));

    if args.num_communities == 0 {
        return bad("need at least one community".into());
    }
    if args.community_size == 0 || args.overlap >= args.community_size {
        return bad(format!(
            "overlap ({}) must be smaller than the community size ({})",
            args.overlap, args.community_size
        ));
    }
    for p in [args.p_in, args.p_out] {
        if !(0.0..=1.0).contains(&p) {
            return bad(format!("edge probability {} outside [0, 1]", p));
        }
    }

    let stride = args.community_size - args.overlap;
    let span = (args.num_communities - 1) * stride + args.community_size;
    if span > args.num_nodes {
        return bad(format!(
            "{} communities of size {} need {} nodes, got {}",
            args.num_communities, args.community_size, span, args.num_nodes
        ));
    }

    let membership: Vec<Vec<usize>> = (0..args.num_communities)
        .map(|c| (c * stride..c * stride + args.community_size).collect())
        .collect();

    let mut node_communities: Vec<Vec<usize>> = vec![vec![]; args.num_nodes];
    for (c, members) in membership.iter().enumerate() {
        for &i in members {
            node_communities[i].push(c);
        }
    }

    let share = |i: usize, j: usize| {
        node_communities[i]
            .iter()
            .any(|c| node_communities[j].contains(c))
    };

    let mut rng = StdRng::seed_from_u64(args.rseed);
    let mut edges = vec![];
    for i in 0..args.num_nodes {
        for j in (i + 1)..args.num_nodes {
            let p = if share(i, j) { args.p_in } else { args.p_out };
            if rng.random::<f64>() < p {
                edges.push((i, j));
            }
        }
    }

    info!(
        "simulated {} edges over {} nodes with {} planted communities",
        edges.len(),
        args.num_nodes,
        args.num_communities
    );

    Ok(SimOut { edges, membership })
}
