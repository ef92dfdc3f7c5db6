//! Greedy correlation clustering.
//!
//! - Input: a square matrix of pairwise "weight difference" scores.
//! - One pass over a (seedable) random permutation of the nodes.
//! - Per-node linking decided by a strategy: Soon, BestLink, VotedLink or Pivot.
//! - Output: a 0/1 co-cluster link matrix, convertible to explicit clusters.
//!
//! Scores are only borrowed; every engine owns its visiting order and link
//! matrix, so a fixed seed (or identity order) reproduces a run exactly.

pub mod error;
pub mod greedy;
pub mod matrix;
pub mod strategy;

pub use error::{GreedyError, Result};
pub use greedy::{cluster, Greedy, GreedyOptions, LinkStrategy, Pass};
pub use matrix::{disagreement_cost, ClusterResult, LinkMatrix, ScoreMatrix, WeightMatrix};
pub use strategy::{BestLink, Pivot, Soon, StrategyKind, VotedLink};
