//! Consistency metrics derived from a consensus matrix
//!
//! Edge consistency says how stable an edge's co-membership is compared to
//! the edges around it; node consistency summarizes those values over each
//! node's incident edges, and optionally across a threshold sweep.

pub mod edge;
pub mod node;

pub use edge::{edge_consistency, EdgeConsistency};
pub use node::{aggregate_sweep, node_consistency, CutoffFraction, NodeConsistency, SweepConsistency};
