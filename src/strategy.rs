//! The four per-node linking rules.
//!
//! Soon, BestLink and VotedLink look backwards at nodes already visited;
//! Pivot looks forward and claims nodes not yet visited.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::GreedyError;
use crate::greedy::{LinkStrategy, Pass};
use crate::matrix::ScoreMatrix;

/// Link to the nearest preceding node with a positive score.
#[derive(Clone, Copy, Debug, Default)]
pub struct Soon;

impl LinkStrategy for Soon {
    fn name(&self) -> &'static str {
        "soon"
    }

    fn mark_node<M: ScoreMatrix + ?Sized>(
        &mut self,
        node: usize,
        perm_idx: usize,
        pass: &mut Pass<'_, M>,
    ) {
        for prev in (0..perm_idx).rev() {
            let prev_node = pass.permutation()[prev];
            let w = pass.score(node, prev_node);
            if w > 0.0 {
                trace!(node, linked_to = prev_node, score = w, "soon: first positive predecessor");
                pass.assoc(node, prev_node);
                return;
            }
        }
        trace!(node, "soon: no positive predecessor");
    }
}

/// Link to the preceding node with the greatest positive score.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestLink;

impl LinkStrategy for BestLink {
    fn name(&self) -> &'static str {
        "best-link"
    }

    fn mark_node<M: ScoreMatrix + ?Sized>(
        &mut self,
        node: usize,
        perm_idx: usize,
        pass: &mut Pass<'_, M>,
    ) {
        let mut best: Option<usize> = None;
        let mut best_score = 0.0f32;
        for prev in (0..perm_idx).rev() {
            let prev_node = pass.permutation()[prev];
            let w = pass.score(node, prev_node);
            // Strict: among equal maxima the most recently visited wins.
            if w > best_score {
                best = Some(prev_node);
                best_score = w;
            }
        }

        match best {
            Some(b) => {
                trace!(node, linked_to = b, score = best_score, "best-link: chosen");
                pass.assoc(node, b);
            }
            None => trace!(node, "best-link: no positive predecessor"),
        }
    }
}

/// Join the existing cluster with the largest positive summed score, or
/// open a new one. Every node ends up in exactly one cluster.
#[derive(Clone, Debug)]
pub struct VotedLink {
    /// Node → cluster id; 0 means unassigned.
    clusters: Vec<usize>,
    next_cluster: usize,
    /// Indexed by cluster id; slot 0 is never voted on.
    votes: Vec<f32>,
}

impl VotedLink {
    pub fn new(nodes: usize) -> Self {
        Self {
            clusters: vec![0; nodes],
            next_cluster: 1,
            votes: Vec::new(),
        }
    }

    /// Cluster id per node, valid after the pass.
    pub fn cluster_ids(&self) -> &[usize] {
        &self.clusters
    }

    /// Number of distinct clusters opened so far.
    pub fn cluster_count(&self) -> usize {
        self.next_cluster - 1
    }
}

impl Default for VotedLink {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LinkStrategy for VotedLink {
    fn name(&self) -> &'static str {
        "voted-link"
    }

    fn begin(&mut self, nodes: usize) {
        self.clusters.clear();
        self.clusters.resize(nodes, 0);
        self.next_cluster = 1;
    }

    fn mark_node<M: ScoreMatrix + ?Sized>(
        &mut self,
        node: usize,
        perm_idx: usize,
        pass: &mut Pass<'_, M>,
    ) {
        self.votes.clear();
        self.votes.resize(self.next_cluster, 0.0);

        for prev in (0..perm_idx).rev() {
            let prev_node = pass.permutation()[prev];
            self.votes[self.clusters[prev_node]] += pass.score(node, prev_node);
        }

        let mut best: Option<usize> = None;
        let mut best_score = 0.0f32;
        for cluster in 1..self.next_cluster {
            if self.votes[cluster] > best_score {
                best = Some(cluster);
                best_score = self.votes[cluster];
            }
        }

        debug_assert_eq!(self.clusters[node], 0, "node {node} assigned twice");
        self.clusters[node] = match best {
            Some(cluster) => {
                trace!(node, cluster, votes = best_score, "voted-link: joined");
                cluster
            }
            None => {
                let cluster = self.next_cluster;
                self.next_cluster += 1;
                trace!(node, cluster, "voted-link: opened new cluster");
                cluster
            }
        };
    }

    fn finish<M: ScoreMatrix + ?Sized>(&mut self, pass: &mut Pass<'_, M>) {
        let n = self.clusters.len();
        for i in 0..n {
            for j in i + 1..n {
                if self.clusters[i] == self.clusters[j] {
                    pass.link(i, j);
                    pass.link(j, i);
                }
            }
        }
    }
}

/// Each unclaimed node claims every later unclaimed node it scores
/// positively against.
#[derive(Clone, Debug)]
pub struct Pivot {
    taken: Vec<bool>,
}

impl Pivot {
    pub fn new(nodes: usize) -> Self {
        Self {
            taken: vec![false; nodes],
        }
    }

    pub fn is_taken(&self, node: usize) -> bool {
        self.taken[node]
    }
}

impl Default for Pivot {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LinkStrategy for Pivot {
    fn name(&self) -> &'static str {
        "pivot"
    }

    fn begin(&mut self, nodes: usize) {
        self.taken.clear();
        self.taken.resize(nodes, false);
    }

    fn mark_node<M: ScoreMatrix + ?Sized>(
        &mut self,
        node: usize,
        perm_idx: usize,
        pass: &mut Pass<'_, M>,
    ) {
        if self.taken[node] {
            return;
        }

        // Everything at or before perm_idx has already been visited.
        let n = pass.node_count();
        let mut claimed = 0usize;
        for next in perm_idx + 1..n {
            let next_node = pass.permutation()[next];
            if self.taken[next_node] {
                continue;
            }
            if pass.score(node, next_node) > 0.0 {
                pass.assoc(next_node, node);
                self.taken[next_node] = true;
                claimed += 1;
            }
        }
        trace!(node, claimed, "pivot");
    }
}

/// Strategy selector for callers that pick the rule at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Soon,
    BestLink,
    VotedLink,
    Pivot,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Soon,
        StrategyKind::BestLink,
        StrategyKind::VotedLink,
        StrategyKind::Pivot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Soon => "soon",
            StrategyKind::BestLink => "best-link",
            StrategyKind::VotedLink => "voted-link",
            StrategyKind::Pivot => "pivot",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = GreedyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soon" => Ok(StrategyKind::Soon),
            "best-link" | "bestlink" | "best_link" => Ok(StrategyKind::BestLink),
            "voted-link" | "votedlink" | "voted_link" => Ok(StrategyKind::VotedLink),
            "pivot" => Ok(StrategyKind::Pivot),
            _ => Err(GreedyError::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::{Greedy, GreedyOptions};
    use crate::matrix::WeightMatrix;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn identity() -> GreedyOptions {
        GreedyOptions {
            seed: None,
            identity_order: true,
        }
    }

    #[test]
    fn test_soon_stops_at_first_positive() {
        // Visit order 1, 0, 2: node 0 is nearest to node 2.
        let mut w = WeightMatrix::new(3);
        w.set(2, 1, 9.0);
        w.set(2, 0, 1.0);
        let mut g = Greedy::new(&w, Soon);
        g.set_permutation(vec![1, 0, 2]).unwrap();
        let links = g.solve();
        assert_eq!(links.value(2, 0), 1);
        assert_eq!(links.value(2, 1), 0);
    }

    #[test]
    fn test_best_link_takes_maximum() {
        let mut w = WeightMatrix::new(3);
        w.set(2, 1, 9.0);
        w.set(2, 0, 1.0);
        let mut g = Greedy::new(&w, BestLink);
        g.set_permutation(vec![1, 0, 2]).unwrap();
        let links = g.solve();
        assert_eq!(links.value(2, 1), 1);
        assert_eq!(links.value(2, 0), 0);
    }

    #[test]
    fn test_best_link_tie_prefers_most_recent() {
        let mut w = WeightMatrix::new(3);
        w.set(2, 0, 4.0);
        w.set(2, 1, 4.0);
        let links = Greedy::with_options(&w, BestLink, &identity()).solve();
        assert_eq!(links.value(2, 1), 1);
        assert_eq!(links.value(2, 0), 0);
    }

    #[test]
    fn test_voted_link_sums_cluster_votes() {
        // 0 and 1 join; node 2 has no pull anywhere; node 3 is repelled by all.
        let mut w = WeightMatrix::new(4);
        w.set(1, 0, 1.0);
        w.set(3, 0, -1.0);
        w.set(3, 1, -1.0);
        w.set(3, 2, -1.0);
        let (links, voted) = Greedy::with_options(&w, VotedLink::new(4), &identity()).run();
        assert_eq!(voted.cluster_ids(), &[1, 1, 2, 3]);
        assert_eq!(voted.cluster_count(), 3);
        assert_eq!(links.value(0, 1), 1);
        assert_eq!(links.value(1, 0), 1);
        assert_eq!(links.linked_pairs(), 2);

        let mut w = WeightMatrix::new(3);
        w.set(2, 0, 1.5);
        w.set(2, 1, 1.5);
        w.set(1, 0, -0.5);
        let (_, voted) = Greedy::with_options(&w, VotedLink::new(3), &identity()).run();
        // Two singleton clusters, node 2 goes to the lower id on a tie.
        assert_eq!(voted.cluster_ids(), &[1, 2, 1]);
    }

    #[test]
    fn test_voted_link_negative_mass_opens_cluster() {
        let mut w = WeightMatrix::new(3);
        w.set(1, 0, 2.0);
        w.set(2, 0, 3.0);
        w.set(2, 1, -4.0);
        let (_, voted) = Greedy::with_options(&w, VotedLink::new(3), &identity()).run();
        assert_eq!(voted.cluster_ids(), &[1, 1, 2]);
    }

    #[test]
    fn test_pivot_claims_forward() {
        let mut w = WeightMatrix::new(4);
        w.set(0, 2, 1.0);
        w.set(0, 3, 1.0);
        // 1 would claim 3, but 0 got there first.
        w.set(1, 3, 5.0);
        let (links, pivot) = Greedy::with_options(&w, Pivot::new(4), &identity()).run();
        assert_eq!(links.value(2, 0), 1);
        assert_eq!(links.value(3, 0), 1);
        assert_eq!(links.value(3, 1), 0);
        assert!(pivot.is_taken(2) && pivot.is_taken(3));
        assert!(!pivot.is_taken(0) && !pivot.is_taken(1));
        assert_eq!(links.linked_pairs(), 2);
    }

    #[test]
    fn test_pivot_ignores_backward_scores() {
        let mut w = WeightMatrix::new(2);
        w.set(1, 0, 10.0);
        let links = Greedy::with_options(&w, Pivot::new(2), &identity()).solve();
        assert!(links.is_unaltered());
    }

    #[test]
    fn test_strategy_kind_parse() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!("BestLink".parse::<StrategyKind>().unwrap(), StrategyKind::BestLink);
        assert!(matches!(
            "kmeans".parse::<StrategyKind>(),
            Err(GreedyError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_voted_link_ids_contiguous() {
        let mut rng = StdRng::seed_from_u64(11);
        let w = WeightMatrix::from_fn(30, |_, _| rng.gen_range(-1.0f32..1.0));
        let opts = GreedyOptions {
            seed: Some(5),
            identity_order: false,
        };
        let (_, voted) = Greedy::with_options(&w, VotedLink::new(30), &opts).run();
        let count = voted.cluster_count();
        for id in 1..=count {
            assert!(voted.cluster_ids().contains(&id), "missing cluster id {id}");
        }
        assert!(voted.cluster_ids().iter().all(|&id| id >= 1 && id <= count));
    }
}
