//! Threshold-based community membership.

use crate::factor_matrix::FactorMatrix;
use matrix_util::traits::NonNegOps;
use std::fmt;

/// Member lists of the `k` communities; a node may appear in any number
/// of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communities {
    members: Vec<Vec<usize>>,
}

/// Node `i` belongs to community `j` iff `F[i,j] > threshold`.
/// Members are listed in ascending node order.
pub fn extract_communities(factors: &FactorMatrix, threshold: f64) -> Communities {
    Communities {
        members: factors.as_array().rows_above_per_column(threshold),
    }
}

impl Communities {
    /// Number of communities `k` (empty ones included)
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, j: usize) -> Option<&[usize]> {
        self.members.get(j).map(|x| x.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.members.iter().map(|x| x.as_slice())
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.members.iter().map(|x| x.len()).collect()
    }

    /// Number of communities with at least one member
    pub fn num_nonempty(&self) -> usize {
        self.members.iter().filter(|x| !x.is_empty()).count()
    }

    /// The dual view: for each of the `n` nodes, the communities it
    /// belongs to (ascending)
    pub fn node_memberships(&self, n: usize) -> Vec<Vec<usize>> {
        let mut out = vec![vec![]; n];
        for (j, members) in self.members.iter().enumerate() {
            for &i in members {
                if i < n {
                    out[i].push(j);
                }
            }
        }
        out
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.members
    }
}

/// `Community 1: [0, 1, 2]`, one line per community, 1-based labels
impl fmt::Display for Communities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (j, members) in self.members.iter().enumerate() {
            writeln!(f, "Community {}: {:?}", j + 1, members)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn factors() -> FactorMatrix {
        FactorMatrix::from_array(array![[1.5, 0.2], [1.1, 1.3], [0.0, 2.0], [0.9, 0.9]]).unwrap()
    }

    #[test]
    fn strict_threshold_per_entry() {
        let c = extract_communities(&factors(), 1.0);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(0), Some(&[0, 1][..]));
        assert_eq!(c.get(1), Some(&[1, 2][..]));
        assert_eq!(c.get(2), None);

        // equality is not membership
        let c = extract_communities(&factors(), 1.5);
        assert_eq!(c.get(0), Some(&[][..]));
    }

    #[test]
    fn overlap_and_dual_view() {
        let c = extract_communities(&factors(), 1.0);
        let by_node = c.node_memberships(4);
        assert_eq!(by_node, vec![vec![0], vec![0, 1], vec![1], vec![]]);
        assert_eq!(c.sizes(), vec![2, 2]);
        assert_eq!(c.num_nonempty(), 2);
    }

    #[test]
    fn larger_threshold_never_grows_a_community() {
        let f = factors();
        let mut prev = extract_communities(&f, 0.0).sizes();
        for step in 1..=25 {
            let tau = step as f64 * 0.1;
            let sizes = extract_communities(&f, tau).sizes();
            for (now, before) in sizes.iter().zip(prev.iter()) {
                assert!(now <= before);
            }
            prev = sizes;
        }
        assert_eq!(prev, vec![0, 0]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let f = factors();
        assert_eq!(extract_communities(&f, 1.0), extract_communities(&f, 1.0));
    }

    #[test]
    fn human_readable_dump() {
        let c = extract_communities(&factors(), 1.0);
        assert_eq!(c.to_string(), "Community 1: [0, 1]\nCommunity 2: [1, 2]\n");
    }
}
