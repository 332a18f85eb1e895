//! Weighted concept graph and its checkpoint persistence.
//!
//! `concept` holds the graph and the two neighbor-ranking queries;
//! `store` snapshots it to disk and loads it back.

mod concept;
pub mod store;

pub use concept::{ConceptGraph, ConceptNode, KindSpec, Neighbor, Snapshot};
