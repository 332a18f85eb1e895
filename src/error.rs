//! Typed errors for concept graph operations.
//!
//! Queries must let callers tell "no such node" apart from "node exists
//! but has no edges" (the latter is an empty result, not an error), so
//! the graph API returns this enum rather than a stringly anyhow error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The queried or referenced node key is not in the graph.
    #[error("unknown node: {0:?}")]
    UnknownNode(String),

    /// Batch insertion received per-node kinds whose length does not
    /// match the key list. Nothing was inserted.
    #[error("kind count mismatch: {keys} keys but {kinds} kinds")]
    KindCountMismatch { keys: usize, kinds: usize },
}
