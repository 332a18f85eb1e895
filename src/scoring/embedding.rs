//! Word-embedding model boundary.
//!
//! The scorer only needs two primitives from an embedding model:
//! ranked nearest words and pairwise similarity, both over lower-cased
//! tokens. Out-of-vocabulary lookups are a typed, catchable error - the
//! scorer skips them instead of aborting a candidate.
//!
//! `KeyedVectors` is the concrete load-side implementation: a word2vec
//! style text file of pre-trained vectors. Training the vectors is an
//! external concern (see `normalize` and the corpus export in the CLI).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use thiserror::Error;

/// Lookup failure from an embedding model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedError {
    /// The word is not in the model's vocabulary.
    #[error("out of vocabulary: {0:?}")]
    OutOfVocabulary(String),
}

/// One ranked similarity hit from [`EmbeddingModel::most_similar`].
#[derive(Debug, Clone, PartialEq)]
pub struct Similar {
    pub word: String,
    pub similarity: f64,
}

/// The two embedding primitives the scorer consumes.
pub trait EmbeddingModel {
    /// Up to `top_n` vocabulary words most similar to `word`, ranked by
    /// similarity descending. Never includes `word` itself.
    fn most_similar(&self, word: &str, top_n: usize) -> Result<Vec<Similar>, EmbedError>;

    /// Similarity between two words.
    fn similarity(&self, a: &str, b: &str) -> Result<f64, EmbedError>;
}

/// Pre-trained word vectors loaded from a text file.
///
/// Format: optional `count dim` header line, then one `word v1 v2 ...`
/// per line. Similarity is cosine. Ties in `most_similar` break by
/// vocabulary (file) order via the stable sort, which pins down the
/// ranking even when the similarity function alone does not.
pub struct KeyedVectors {
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Vec<Vec<f64>>,
}

impl KeyedVectors {
    /// Load vectors from `path`. Fails on inconsistent dimensions or
    /// unparseable components.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectors: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse vectors: {}", path.display()))
    }

    /// Parse the text format. Split out from `load` for testability.
    pub fn parse(content: &str) -> Result<Self> {
        let mut words = Vec::new();
        let mut index = HashMap::new();
        let mut vectors: Vec<Vec<f64>> = Vec::new();
        let mut dim: Option<usize> = None;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let word = parts.next().expect("non-empty line has a first token");
            let components: Vec<&str> = parts.collect();

            // word2vec text files start with a "count dim" header
            if lineno == 0 && components.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }

            let mut vector = Vec::with_capacity(components.len());
            for c in &components {
                let v: f64 = c
                    .parse()
                    .with_context(|| format!("Bad vector component {:?} on line {}", c, lineno + 1))?;
                vector.push(v);
            }

            match dim {
                None => dim = Some(vector.len()),
                Some(d) if d != vector.len() => {
                    bail!(
                        "Inconsistent dimensions: expected {}, got {} on line {}",
                        d,
                        vector.len(),
                        lineno + 1
                    );
                }
                _ => {}
            }

            if index.contains_key(word) {
                continue; // first occurrence wins
            }
            index.insert(word.to_string(), words.len());
            words.push(word.to_string());
            vectors.push(vector);
        }

        if words.is_empty() {
            bail!("No vectors found");
        }
        Ok(Self { words, index, vectors })
    }

    pub fn vocab_size(&self) -> usize {
        self.words.len()
    }

    fn vector(&self, word: &str) -> Result<&[f64], EmbedError> {
        self.index
            .get(word)
            .map(|&i| self.vectors[i].as_slice())
            .ok_or_else(|| EmbedError::OutOfVocabulary(word.to_string()))
    }
}

impl EmbeddingModel for KeyedVectors {
    fn most_similar(&self, word: &str, top_n: usize) -> Result<Vec<Similar>, EmbedError> {
        let query = self.vector(word)?;

        let mut ranked: Vec<Similar> = self
            .words
            .iter()
            .zip(&self.vectors)
            .filter(|(w, _)| w.as_str() != word)
            .map(|(w, v)| Similar {
                word: w.clone(),
                similarity: cosine(query, v),
            })
            .collect();

        // Stable: equal similarities keep vocabulary order.
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(top_n);
        Ok(ranked)
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f64, EmbedError> {
        Ok(cosine(self.vector(a)?, self.vector(b)?))
    }
}

/// Cosine similarity; zero vectors compare as 0.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &str = "\
4 2
java 1.0 0.0
kotlin 0.9 0.1
cobol 0.0 1.0
scala 0.9 0.1
";

    #[test]
    fn test_parse_with_header() {
        let kv = KeyedVectors::parse(VECTORS).unwrap();
        assert_eq!(kv.vocab_size(), 4);
    }

    #[test]
    fn test_parse_without_header() {
        let kv = KeyedVectors::parse("a 1.0 0.0\nb 0.0 1.0\n").unwrap();
        assert_eq!(kv.vocab_size(), 2);
    }

    #[test]
    fn test_parse_rejects_ragged_dimensions() {
        assert!(KeyedVectors::parse("a 1.0 0.0\nb 0.5\n").is_err());
    }

    #[test]
    fn test_similarity_cosine() {
        let kv = KeyedVectors::parse(VECTORS).unwrap();
        let same = kv.similarity("java", "java").unwrap();
        assert!((same - 1.0).abs() < 1e-9);
        let orthogonal = kv.similarity("java", "cobol").unwrap();
        assert!(orthogonal.abs() < 1e-9);
    }

    #[test]
    fn test_similarity_oov() {
        let kv = KeyedVectors::parse(VECTORS).unwrap();
        assert_eq!(
            kv.similarity("java", "rust").unwrap_err(),
            EmbedError::OutOfVocabulary("rust".into())
        );
    }

    #[test]
    fn test_most_similar_excludes_query_and_ranks() {
        let kv = KeyedVectors::parse(VECTORS).unwrap();
        let hits = kv.most_similar("java", 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.word != "java"));
        // kotlin and scala tie; vocabulary order puts kotlin first.
        assert_eq!(hits[0].word, "kotlin");
        assert_eq!(hits[1].word, "scala");
        assert_eq!(hits[2].word, "cobol");
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_most_similar_truncates() {
        let kv = KeyedVectors::parse(VECTORS).unwrap();
        assert_eq!(kv.most_similar("java", 1).unwrap().len(), 1);
        // top_n beyond vocab returns everything but the query
        assert_eq!(kv.most_similar("java", 100).unwrap().len(), 3);
    }
}
