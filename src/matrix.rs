use crate::error::{GreedyError, Result};

/// Directional pairwise scores consumed by the greedy pass.
///
/// `score(i, j)` says how strongly node `j` should pull node `i` into its
/// cluster. Positive is attractive; the matrix need not be symmetric.
pub trait ScoreMatrix {
    fn nodes(&self) -> usize;
    fn score(&self, i: usize, j: usize) -> f32;
}

/// Dense row-major N×N score matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightMatrix {
    n: usize,
    data: Vec<f32>,
}

impl WeightMatrix {
    /// All-zero matrix over `n` nodes.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build from rows, rejecting empty input and ragged or non-square rows.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(GreedyError::Empty);
        }
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(GreedyError::NotSquare {
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
            data.extend(values);
        }
        Ok(Self { n, data })
    }

    /// Fill every `(i, j)` entry from a scoring function.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(f(i, j));
            }
        }
        Self { n, data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.n + j] = value;
    }
}

impl ScoreMatrix for WeightMatrix {
    #[inline]
    fn nodes(&self) -> usize {
        self.n
    }

    #[inline]
    fn score(&self, i: usize, j: usize) -> f32 {
        self.get(i, j)
    }
}

/// Binary co-cluster matrix produced by a greedy pass.
///
/// Off-diagonal entries start unaltered (0) and can only ever be raised to 1.
/// The diagonal is reflexive: a node always shares a cluster with itself, so
/// `is_linked(i, i)` is true but never counted as a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkMatrix {
    n: usize,
    links: Vec<bool>,
}

impl LinkMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            links: vec![false; n * n],
        }
    }

    #[inline]
    pub fn nodes(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_linked(&self, i: usize, j: usize) -> bool {
        i == j || self.links[i * self.n + j]
    }

    /// Entry as the 0/1 flag callers compare against. Diagonal reads 0.
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> u8 {
        u8::from(i != j && self.links[i * self.n + j])
    }

    /// Mark `i` and `j` as co-clustered in the `(i, j)` direction.
    #[inline]
    pub(crate) fn link(&mut self, i: usize, j: usize) {
        if i != j {
            self.links[i * self.n + j] = true;
        }
    }

    /// Copy every membership flag of `other`'s row onto `node`'s row.
    /// Reflexivity of `other` makes this link `(node, other)` as well.
    pub(crate) fn copy_row(&mut self, node: usize, other: usize) {
        for k in 0..self.n {
            if self.is_linked(other, k) {
                self.link(node, k);
            }
        }
    }

    /// Number of off-diagonal 1 entries.
    pub fn linked_pairs(&self) -> usize {
        self.links.iter().filter(|&&l| l).count()
    }

    /// True when no off-diagonal entry was ever set.
    pub fn is_unaltered(&self) -> bool {
        !self.links.iter().any(|&l| l)
    }

    /// True when `(i, j)` and `(j, i)` always agree.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.is_linked(i, j) == self.is_linked(j, i)))
    }

    /// Connected components of the undirected link graph.
    ///
    /// Nodes that were never linked come back as singletons. Members are
    /// sorted ascending and clusters are ordered by their smallest member.
    pub fn clusters(&self) -> ClusterResult {
        let mut parent: Vec<usize> = (0..self.n).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for i in 0..self.n {
            for j in 0..self.n {
                if i != j && self.links[i * self.n + j] {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[ri.max(rj)] = ri.min(rj);
                    }
                }
            }
        }

        let mut slot_of_root = vec![usize::MAX; self.n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for node in 0..self.n {
            let root = find(&mut parent, node);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = clusters.len();
                clusters.push(Vec::new());
            }
            clusters[slot_of_root[root]].push(node);
        }

        ClusterResult { clusters }
    }
}

/// Partition read back from a [`LinkMatrix`]: disjoint node groups that
/// together cover every node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterResult {
    pub clusters: Vec<Vec<usize>>,
}

impl ClusterResult {
    /// Node → cluster index (position in `clusters`).
    pub fn labels(&self) -> Vec<usize> {
        let n = self.clusters.iter().map(Vec::len).sum();
        let mut labels = vec![0; n];
        for (cid, members) in self.clusters.iter().enumerate() {
            for &m in members {
                labels[m] = cid;
            }
        }
        labels
    }

    /// Number of clusters, singletons included.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True only for the partition of a zero-node matrix.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Correlation-clustering disagreement of a partition.
///
/// Sums positive scores between nodes placed apart plus the magnitude of
/// negative scores between nodes placed together, over ordered pairs `i != j`.
pub fn disagreement_cost<M: ScoreMatrix + ?Sized>(scores: &M, result: &ClusterResult) -> f64 {
    let labels = result.labels();
    debug_assert_eq!(labels.len(), scores.nodes(), "partition must cover every node");

    let mut cost = 0.0f64;
    for i in 0..labels.len() {
        for j in 0..labels.len() {
            if i == j {
                continue;
            }
            let s = scores.score(i, j) as f64;
            let together = labels[i] == labels[j];
            if s > 0.0 && !together {
                cost += s;
            } else if s < 0.0 && together {
                cost -= s;
            }
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = WeightMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            GreedyError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            }
        ));
        assert!(matches!(
            WeightMatrix::from_rows(Vec::new()),
            Err(GreedyError::Empty)
        ));
    }

    #[test]
    fn test_from_rows_layout() {
        let w = WeightMatrix::from_rows(vec![vec![0.0, 2.0], vec![-1.0, 0.0]]).unwrap();
        assert_eq!(w.nodes(), 2);
        assert_eq!(w.score(0, 1), 2.0);
        assert_eq!(w.score(1, 0), -1.0);
    }

    #[test]
    fn test_copy_row_uses_reflexive_diagonal() {
        let mut m = LinkMatrix::new(3);
        m.copy_row(1, 0);
        assert_eq!(m.value(1, 0), 1);
        assert_eq!(m.value(0, 1), 0);
        m.copy_row(2, 1);
        assert_eq!(m.value(2, 0), 1);
        assert_eq!(m.value(2, 1), 1);
        assert_eq!(m.value(2, 2), 0);
        assert_eq!(m.linked_pairs(), 3);
    }

    #[test]
    fn test_clusters_components() {
        let mut m = LinkMatrix::new(5);
        m.link(3, 0);
        m.link(4, 2);
        let res = m.clusters();
        assert_eq!(res.clusters, vec![vec![0, 3], vec![1], vec![2, 4]]);
        assert_eq!(res.labels(), vec![0, 1, 2, 0, 2]);
        assert_eq!(res.len(), 3);
        assert!(!res.is_empty());
        assert!(LinkMatrix::new(0).clusters().is_empty());
    }

    #[test]
    fn test_disagreement_cost() {
        let w = WeightMatrix::from_rows(vec![
            vec![0.0, 2.0, -1.0],
            vec![2.0, 0.0, 0.5],
            vec![-1.0, 0.5, 0.0],
        ])
        .unwrap();
        let all_apart = ClusterResult {
            clusters: vec![vec![0], vec![1], vec![2]],
        };
        assert!((disagreement_cost(&w, &all_apart) - 5.0).abs() < 1e-9);

        let together = ClusterResult {
            clusters: vec![vec![0, 1, 2]],
        };
        assert!((disagreement_cost(&w, &together) - 2.0).abs() < 1e-9);
    }
}
