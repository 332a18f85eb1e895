//! Core types for skillgraph - shared data contracts between the
//! ingest, scoring, graph, and pipeline stages.
//!
//! Everything here is plain data: serde-serializable, no behavior beyond
//! small helpers. The annotation types (`Token`, `EntitySpan`) mirror what
//! an external linguistic annotator emits (spaCy-style tags and labels),
//! carried inside each input record.

use serde::{Deserialize, Serialize};

/// Kind of a concept graph node. Fixed at creation, never changed.
///
/// Re-inserting an existing key with a different kind is a caller-contract
/// violation: the graph keeps the original kind and does not reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Job title node
    Title,
    /// Skill node
    Skill,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Title => "title",
            NodeKind::Skill => "skill",
        }
    }
}

/// A scored skill candidate produced by the scorer for one document.
/// Intermediate only - the pipeline turns it into a skill node + edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Entity surface text as it appeared in the document
    pub text: String,
    /// Salience weight from the entity-label scale; becomes the edge weight
    pub weight: f64,
}

impl Candidate {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self { text: text.into(), weight }
    }
}

/// Part-of-speech tag, reduced to the distinction the scorer needs.
///
/// Accepts the annotator's uppercase tag strings (`NOUN`, `PROPN`) on
/// deserialization; any other tag maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PosTag {
    Noun,
    ProperNoun,
    Other,
}

impl PosTag {
    /// Nouns and proper nouns are the admissible skill vocabulary.
    pub fn is_noun(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::ProperNoun)
    }
}

impl From<String> for PosTag {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "NOUN" => PosTag::Noun,
            "PROPN" => PosTag::ProperNoun,
            _ => PosTag::Other,
        }
    }
}

impl From<PosTag> for String {
    fn from(tag: PosTag) -> Self {
        match tag {
            PosTag::Noun => "NOUN".into(),
            PosTag::ProperNoun => "PROPN".into(),
            PosTag::Other => "OTHER".into(),
        }
    }
}

/// One annotated token from the external annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// Part-of-speech tag
    pub pos: PosTag,
    /// Char offset of the token in the raw description
    #[serde(default)]
    pub start: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, pos: PosTag, start: usize) -> Self {
        Self { text: text.into(), pos, start }
    }
}

/// One named-entity span from the external annotator.
///
/// `label` is the annotator's category string (e.g. `PRODUCT`, `ORG`);
/// the scorer's allow-list decides which labels admit candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Entity surface text (may be multiword)
    pub text: String,
    /// Category label from the annotator's fixed label set
    pub label: String,
    /// Char offset of the span in the raw description
    #[serde(default)]
    pub start: usize,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: impl Into<String>, start: usize) -> Self {
        Self { text: text.into(), label: label.into(), start }
    }
}

/// A fully annotated document: the scorer's input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotatedDoc {
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
}

impl AnnotatedDoc {
    pub fn new(tokens: Vec<Token>, entities: Vec<EntitySpan>) -> Self {
        Self { tokens, entities }
    }

    /// Restrict the document to tokens and entities starting at or after
    /// `offset`. Used to bias extraction toward the requirements section.
    pub fn slice_from(&self, offset: usize) -> AnnotatedDoc {
        AnnotatedDoc {
            tokens: self
                .tokens
                .iter()
                .filter(|t| t.start >= offset)
                .cloned()
                .collect(),
            entities: self
                .entities
                .iter()
                .filter(|e| e.start >= offset)
                .cloned()
                .collect(),
        }
    }
}

/// Which neighbor query to run against the concept graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Directly adjacent nodes, ranked by edge weight
    Nearest,
    /// Second-hop nodes, ranked by cumulative path weight
    Next,
}
