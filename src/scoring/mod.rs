//! Candidate scoring - from annotated documents to weighted skill
//! candidates.
//!
//! `embedding` defines the word-embedding model boundary (plus the
//! keyed-vectors loader); `filter` runs the five-stage scoring pipeline
//! over it.

mod filter;
pub mod embedding;

pub use embedding::{EmbedError, EmbeddingModel, KeyedVectors, Similar};
pub use filter::SkillFilter;
