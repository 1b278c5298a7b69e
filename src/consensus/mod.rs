//! Consensus clustering: co-membership matrix, the re-clustering loop and
//! threshold sweeps

pub mod engine;
pub mod matrix;
pub mod sweep;

pub use engine::{consensus_partition, ConsensusEngine, ConsensusOutcome};
pub use matrix::{ConsensusEntry, ConsensusMatrix};
pub use sweep::{sweep_thresholds, threshold_range, ThresholdResult};
