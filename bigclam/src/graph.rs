//! Immutable undirected graph over the dense node range `[0, n)`.

use crate::error::{ClamError, Result};
use fnv::FnvHashSet as HashSet;
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct Graph {
    /// Number of nodes
    n_nodes: usize,
    /// Ascending neighbour lists
    neighbors: Vec<Vec<usize>>,
    /// Hashed copies of `neighbors` for O(1) membership tests
    neighbor_sets: Vec<HashSet<usize>>,
    /// Number of undirected edges
    n_edges: usize,
}

impl Graph {
    /// Build a graph from undirected pairs. Each pair `(u, v)` is
    /// inserted symmetrically; repeated pairs collapse and self-loops
    /// are dropped with a warning.
    ///
    /// * `n` - number of nodes (> 0)
    /// * `edges` - 0-based node pairs
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Graph>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        check_num_nodes(n)?;
        let mut sets = empty_sets(n)?;
        let mut self_loops = 0;

        for (u, v) in edges {
            check_pair(n, u, v)?;
            if u == v {
                self_loops += 1;
                continue;
            }
            sets[u].insert(v);
            sets[v].insert(u);
        }

        warn_self_loops(self_loops);
        Ok(Self::from_sets(sets))
    }

    /// Build a graph from an adjacency list that must already be
    /// symmetric: `v ∈ adj[u] ⇔ u ∈ adj[v]`.
    pub fn from_adjacency(n: usize, adj: &[Vec<usize>]) -> Result<Graph> {
        check_num_nodes(n)?;
        if adj.len() != n {
            return Err(ClamError::InvalidGraph(format!(
                "adjacency has {} rows for {} nodes",
                adj.len(),
                n
            )));
        }

        let mut sets: Vec<HashSet<usize>> = Vec::with_capacity(n);
        let mut self_loops = 0;
        for (u, nbrs) in adj.iter().enumerate() {
            let mut set = HashSet::default();
            for &v in nbrs {
                check_pair(n, u, v)?;
                if u == v {
                    self_loops += 1;
                    continue;
                }
                set.insert(v);
            }
            sets.push(set);
        }
        warn_self_loops(self_loops);

        for (u, set) in sets.iter().enumerate() {
            if let Some(&v) = set.iter().find(|&&v| !sets[v].contains(&u)) {
                return Err(ClamError::InvalidGraph(format!(
                    "asymmetric adjacency: {} lists {} but not the reverse",
                    u, v
                )));
            }
        }

        Ok(Self::from_sets(sets))
    }

    fn from_sets(neighbor_sets: Vec<HashSet<usize>>) -> Graph {
        let n_nodes = neighbor_sets.len();
        let neighbors: Vec<Vec<usize>> = neighbor_sets
            .iter()
            .map(|set| {
                let mut nbrs: Vec<usize> = set.iter().copied().collect();
                nbrs.sort_unstable();
                nbrs
            })
            .collect();
        let n_edges = neighbors.iter().map(|x| x.len()).sum::<usize>() / 2;

        debug!("graph with {} nodes, {} edges", n_nodes, n_edges);

        Graph {
            n_nodes,
            neighbors,
            neighbor_sets,
            n_edges,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.n_edges
    }

    /// Neighbours of `u` in ascending order
    pub fn neighbors(&self, u: usize) -> &[usize] {
        &self.neighbors[u]
    }

    pub fn degree(&self, u: usize) -> usize {
        self.neighbors[u].len()
    }

    #[inline]
    pub fn is_neighbor(&self, u: usize, v: usize) -> bool {
        self.neighbor_sets[u].contains(&v)
    }

    /// Each undirected edge once, as `(u, v)` with `u < v`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(u, nbrs)| {
            nbrs.iter()
                .copied()
                .filter(move |&v| v > u)
                .map(move |v| (u, v))
        })
    }
}

fn check_num_nodes(n: usize) -> Result<()> {
    if n == 0 {
        return Err(ClamError::InvalidGraph(
            "number of nodes must be positive".into(),
        ));
    }
    Ok(())
}

/// `n` empty neighbour sets, failing instead of aborting when `n` is
/// beyond what can be allocated
fn empty_sets(n: usize) -> Result<Vec<HashSet<usize>>> {
    let mut sets: Vec<HashSet<usize>> = Vec::new();
    sets.try_reserve_exact(n)
        .map_err(|e| ClamError::InvalidGraph(format!("cannot hold {} nodes: {}", n, e)))?;
    sets.resize_with(n, HashSet::default);
    Ok(sets)
}

fn check_pair(n: usize, u: usize, v: usize) -> Result<()> {
    if u >= n || v >= n {
        return Err(ClamError::InvalidGraph(format!(
            "edge ({}, {}) out of range [0, {})",
            u, v, n
        )));
    }
    Ok(())
}

fn warn_self_loops(count: usize) {
    if count > 0 {
        warn!("dropped {} self-loop(s); a node is never its own neighbour", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_insert_from_edges() -> anyhow::Result<()> {
        let g = Graph::from_edges(4, vec![(0, 1), (2, 1), (0, 1)])?;
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert!(g.is_neighbor(1, 0) && g.is_neighbor(0, 1));
        assert!(!g.is_neighbor(0, 2));
        assert_eq!(g.degree(3), 0);
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Graph::from_edges(0, Vec::<(usize, usize)>::new()),
            Err(ClamError::InvalidGraph(_))
        ));
        assert!(matches!(
            Graph::from_edges(3, vec![(0, 3)]),
            Err(ClamError::InvalidGraph(_))
        ));
        assert!(matches!(
            Graph::from_edges(usize::MAX / 2, Vec::<(usize, usize)>::new()),
            Err(ClamError::InvalidGraph(_))
        ));
    }

    #[test]
    fn self_loops_are_dropped() -> anyhow::Result<()> {
        let g = Graph::from_edges(3, vec![(1, 1), (0, 1), (2, 2)])?;
        assert_eq!(g.num_edges(), 1);
        assert!(!g.is_neighbor(1, 1));
        assert_eq!(g.neighbors(1), &[0]);
        assert_eq!(g.degree(2), 0);

        let adj = vec![vec![0, 1], vec![0]];
        let g = Graph::from_adjacency(2, &adj)?;
        assert_eq!(g.neighbors(0), &[1]);
        assert!(!g.is_neighbor(0, 0));
        Ok(())
    }

    #[test]
    fn adjacency_must_be_symmetric() {
        let ok = vec![vec![1, 2], vec![0], vec![0]];
        assert!(Graph::from_adjacency(3, &ok).is_ok());

        let asym = vec![vec![1, 2], vec![0], vec![]];
        let err = Graph::from_adjacency(3, &asym).err().unwrap();
        assert!(err.to_string().contains("asymmetric"));

        let short = vec![vec![1], vec![0]];
        assert!(Graph::from_adjacency(3, &short).is_err());

        let out_of_range = vec![vec![5], vec![]];
        assert!(Graph::from_adjacency(2, &out_of_range).is_err());
    }
}
