//! skillgraph - skill concept extraction over a weighted title/skill graph
//!
//! Extracts candidate skills from free-text job postings and accumulates
//! them into a typed, weighted, undirected graph linking job titles to
//! skills, then answers ranked neighbor queries against that graph.
//!
//! # Architecture
//!
//! ```text
//! JSONL records → Candidate Scorer → Concept Graph → Checkpoint → Queries
//!       ↓               ↓                 ↓              ↓           ↓
//!   serde_json    embedding model     petgraph       bincode    first-hop /
//!   + annotator   similarity space   + key index    + rename    second-hop
//! ```
//!
//! Tagging (part-of-speech, named entities) and embedding training are
//! external collaborators: annotations ride along inside each record and
//! the embedding model is loaded from pre-trained keyed vectors. The core
//! is single-threaded and batch-oriented; the graph has exactly one
//! writer and is read after writing stops.

pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod types;

// Re-export core types
pub use error::GraphError;
pub use graph::{ConceptGraph, KindSpec, Neighbor};
pub use ingest::Record;
pub use pipeline::{query, Pipeline, PipelineStats};
pub use scoring::{EmbeddingModel, KeyedVectors, SkillFilter};
pub use types::{AnnotatedDoc, Candidate, EntitySpan, NodeKind, PosTag, QueryMode, Token};
