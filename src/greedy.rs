use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::debug;

use crate::error::{GreedyError, Result};
use crate::matrix::{LinkMatrix, ScoreMatrix, WeightMatrix};
use crate::strategy::{BestLink, Pivot, Soon, StrategyKind, VotedLink};

/// Options controlling the visiting order of the greedy pass.
#[derive(Clone, Debug, Default)]
pub struct GreedyOptions {
    /// Seed for the permutation shuffle. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Visit nodes in natural order 0..N, ignoring `seed`.
    pub identity_order: bool,
}

/// Per-node linking decision plugged into [`Greedy`].
pub trait LinkStrategy {
    fn name(&self) -> &'static str;

    /// Called once with the node count before the first `mark_node`.
    fn begin(&mut self, _nodes: usize) {}

    /// Decide links for `node`, found at position `perm_idx` of the permutation.
    fn mark_node<M: ScoreMatrix + ?Sized>(
        &mut self,
        node: usize,
        perm_idx: usize,
        pass: &mut Pass<'_, M>,
    );

    /// Called once after every node has been marked.
    fn finish<M: ScoreMatrix + ?Sized>(&mut self, _pass: &mut Pass<'_, M>) {}
}

/// What a strategy may see and do during a pass.
///
/// Scores and the permutation are read-only; the link matrix can only be
/// grown through [`Pass::assoc`].
pub struct Pass<'p, M: ?Sized> {
    scores: &'p M,
    perm: &'p [usize],
    links: &'p mut LinkMatrix,
}

impl<'p, M: ScoreMatrix + ?Sized> Pass<'p, M> {
    #[inline]
    pub fn permutation(&self) -> &[usize] {
        self.perm
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.perm.len()
    }

    #[inline]
    pub fn score(&self, i: usize, j: usize) -> f32 {
        self.scores.score(i, j)
    }

    /// Let `node` inherit every cluster membership `other` currently holds.
    pub fn assoc(&mut self, node: usize, other: usize) {
        self.links.copy_row(node, other);
        debug_assert!(
            self.links.is_linked(node, other),
            "assoc({node}, {other}) left the pair unlinked"
        );
    }

    #[inline]
    pub fn is_linked(&self, i: usize, j: usize) -> bool {
        self.links.is_linked(i, j)
    }

    /// Raw single-entry write, reserved for post-pass materialization.
    #[inline]
    pub(crate) fn link(&mut self, i: usize, j: usize) {
        self.links.link(i, j);
    }
}

/// Single-pass greedy clustering engine.
///
/// Assumptions:
/// - `scores` is square; its node count fixes the size of everything else.
/// - The engine is one-shot: [`Greedy::solve`] consumes it.
pub struct Greedy<'a, S, M: ?Sized = WeightMatrix> {
    scores: &'a M,
    links: LinkMatrix,
    perm: Vec<usize>,
    strategy: S,
}

impl<'a, S: LinkStrategy, M: ScoreMatrix + ?Sized> Greedy<'a, S, M> {
    /// Engine over `scores` with a freshly shuffled visiting order.
    pub fn new(scores: &'a M, strategy: S) -> Self {
        Self::with_options(scores, strategy, &GreedyOptions::default())
    }

    pub fn with_options(scores: &'a M, strategy: S, options: &GreedyOptions) -> Self {
        let n = scores.nodes();
        let mut engine = Self {
            scores,
            links: LinkMatrix::new(n),
            perm: (0..n).collect(),
            strategy,
        };
        if !options.identity_order {
            let mut rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            engine.perm.shuffle(&mut rng);
        }
        engine
    }

    /// Visit nodes in natural order 0..N.
    pub fn set_identity_permutation(&mut self) {
        for (idx, slot) in self.perm.iter_mut().enumerate() {
            *slot = idx;
        }
    }

    /// Install an explicit visiting order.
    pub fn set_permutation(&mut self, order: Vec<usize>) -> Result<()> {
        let n = self.perm.len();
        if order.len() != n {
            return Err(GreedyError::InvalidPermutation {
                reason: format!("expected {n} entries, got {}", order.len()),
            });
        }
        let mut seen = vec![false; n];
        for &node in &order {
            if node >= n {
                return Err(GreedyError::InvalidPermutation {
                    reason: format!("node {node} out of range 0..{n}"),
                });
            }
            if std::mem::replace(&mut seen[node], true) {
                return Err(GreedyError::InvalidPermutation {
                    reason: format!("node {node} appears more than once"),
                });
            }
        }
        self.perm = order;
        Ok(())
    }

    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run the pass and return the completed link matrix.
    pub fn solve(self) -> LinkMatrix {
        self.run().0
    }

    /// Run the pass, handing back the strategy alongside the links so its
    /// bookkeeping (e.g. VotedLink cluster ids) can be inspected.
    pub fn run(self) -> (LinkMatrix, S) {
        let Self {
            scores,
            mut links,
            perm,
            mut strategy,
        } = self;

        let n = perm.len();
        debug!(strategy = strategy.name(), nodes = n, "starting greedy pass");

        strategy.begin(n);
        let mut pass = Pass {
            scores,
            perm: &perm,
            links: &mut links,
        };
        for (perm_idx, &node) in perm.iter().enumerate() {
            strategy.mark_node(node, perm_idx, &mut pass);
        }
        strategy.finish(&mut pass);

        debug!(
            strategy = strategy.name(),
            linked_pairs = links.linked_pairs(),
            "greedy pass complete"
        );
        (links, strategy)
    }
}

/// Build and run the engine for a strategy chosen at runtime.
pub fn cluster<M: ScoreMatrix + ?Sized>(
    scores: &M,
    kind: StrategyKind,
    options: &GreedyOptions,
) -> LinkMatrix {
    let n = scores.nodes();
    match kind {
        StrategyKind::Soon => Greedy::with_options(scores, Soon, options).solve(),
        StrategyKind::BestLink => Greedy::with_options(scores, BestLink, options).solve(),
        StrategyKind::VotedLink => {
            Greedy::with_options(scores, VotedLink::new(n), options).solve()
        }
        StrategyKind::Pivot => Greedy::with_options(scores, Pivot::new(n), options).solve(),
    }
}
