//! Multi-stage skill candidate scorer.
//!
//! Given one annotated document and an embedding model, decides which
//! terms become skill nodes and with what salience weight:
//!
//! 1. Noun filter - nouns/proper nouns form the admissible vocabulary
//! 2. Entity filter - allow-listed entity labels, cross-checked against
//!    the noun vocabulary, each assigned a label-scale weight
//! 3. Neighbor accumulation - count embedding neighbors of all candidate
//!    words into one occurrence counter
//! 4. Similarity scoring - score candidates against the counter's most
//!    frequent entries
//! 5. Rank & truncate - sort by score, keep topk, emit (text, weight)
//!
//! All scratch state lives inside one `process` call; calls are
//! independent and order-insensitive across documents.

use crate::types::{AnnotatedDoc, Candidate};

use super::embedding::{EmbeddingModel, Similar};

/// Entity labels admitted as skill candidates, with their positional
/// salience weights. Both lists come from visual inspection of job
/// postings; duplicate weights are intentional.
const NER_LABELS: [&str; 9] = [
    "PRODUCT",
    "PERSON",
    "ORG",
    "NORP",
    "LANGUAGE",
    "GPE",
    "FAC",
    "WORK_OF_ART",
    "EVENT",
];
const LABEL_SCALE: [f64; 9] = [0.8, 0.7, 0.7, 0.7, 0.7, 0.6, 0.6, 0.5, 0.3];

/// How many counter entries feed the similarity scoring stage.
const TOP_WORDS: usize = 10;

/// The candidate scorer. Cheap to construct; borrows the model.
pub struct SkillFilter<'m, M: EmbeddingModel> {
    model: &'m M,
    topk: usize,
}

impl<'m, M: EmbeddingModel> SkillFilter<'m, M> {
    pub fn new(model: &'m M, topk: usize) -> Self {
        Self { model, topk }
    }

    /// Run the full five-stage pipeline on one document. Returns up to
    /// `topk` candidates, ranked by similarity score descending, each
    /// carrying its stage-2 label weight unchanged.
    pub fn process(&self, doc: &AnnotatedDoc) -> Vec<Candidate> {
        let nouns = noun_vocabulary(doc);
        let admitted = admit_entities(doc, &nouns);
        if admitted.is_empty() {
            return Vec::new();
        }

        let counter = self.accumulate_neighbors(&admitted);
        let top_words = counter.most_common(TOP_WORDS);
        let scores = self.score_candidates(&admitted, &top_words);

        rank_and_truncate(admitted, scores, self.topk)
    }

    /// Stage 3: query the model's nearest words for every constituent
    /// word of every candidate and count the returned (word, similarity)
    /// pairs. Out-of-vocabulary words are skipped, never fatal.
    fn accumulate_neighbors(&self, admitted: &[Candidate]) -> PairCounter {
        let top_n = if self.topk < 10 { self.topk * 2 } else { self.topk };

        let mut counter = PairCounter::new();
        for candidate in admitted {
            for word in candidate.text.split_whitespace() {
                if let Ok(hits) = self.model.most_similar(&word.to_lowercase(), top_n) {
                    counter.update(hits);
                }
            }
        }
        counter
    }

    /// Stage 4: sum similarity against the top counter words. Multiword
    /// candidates average the per-word sums over the full word count;
    /// OOV similarities are skipped without shrinking the denominator.
    fn score_candidates(&self, admitted: &[Candidate], top_words: &[String]) -> Vec<f64> {
        admitted
            .iter()
            .map(|candidate| {
                let words: Vec<&str> = candidate.text.split_whitespace().collect();
                let total: f64 = words
                    .iter()
                    .map(|word| self.word_score(word, top_words))
                    .sum();
                if words.len() > 1 {
                    total / words.len() as f64
                } else {
                    total
                }
            })
            .collect()
    }

    fn word_score(&self, word: &str, top_words: &[String]) -> f64 {
        let word = word.to_lowercase();
        top_words
            .iter()
            .filter_map(|top| self.model.similarity(&word, top).ok())
            .sum()
    }
}

/// Stage 1: every noun/proper-noun token in first-occurrence order,
/// deduplicated by surface text.
fn noun_vocabulary(doc: &AnnotatedDoc) -> Vec<String> {
    let mut nouns: Vec<String> = Vec::new();
    for token in &doc.tokens {
        if token.pos.is_noun() && !nouns.iter().any(|n| n == &token.text) {
            nouns.push(token.text.clone());
        }
    }
    nouns
}

/// Stage 2: keep entities whose label is allow-listed and where at least
/// one constituent word is in the noun vocabulary (a single-word entity
/// must itself be a noun). Deduplicated by surface text; rejected
/// entities are gone for good.
fn admit_entities(doc: &AnnotatedDoc, nouns: &[String]) -> Vec<Candidate> {
    let mut admitted: Vec<Candidate> = Vec::new();
    for entity in &doc.entities {
        let Some(label_pos) = NER_LABELS.iter().position(|l| *l == entity.label) else {
            continue;
        };
        if admitted.iter().any(|c| c.text == entity.text) {
            continue;
        }
        let qualifies = entity
            .text
            .split_whitespace()
            .any(|word| nouns.iter().any(|n| n == word));
        if qualifies {
            admitted.push(Candidate::new(entity.text.clone(), LABEL_SCALE[label_pos]));
        }
    }
    admitted
}

/// Stage 5: stable sort by score descending (ties keep stage-2 admission
/// order), then truncate to `topk`.
fn rank_and_truncate(admitted: Vec<Candidate>, scores: Vec<f64>, topk: usize) -> Vec<Candidate> {
    let mut ranked: Vec<(Candidate, f64)> = admitted.into_iter().zip(scores).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(topk);
    ranked.into_iter().map(|(c, _)| c).collect()
}

/// Occurrence counter keyed by the full (word, similarity) pair, not the
/// word alone: the same word returned under two different similarities
/// counts as two distinct entries. Equal counts rank in first-seen
/// order. This mirrors how the accumulated neighbor lists behave in the
/// trained pipeline and is relied on by the scoring stage.
struct PairCounter {
    entries: Vec<(Similar, usize)>,
}

impl PairCounter {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn update(&mut self, hits: Vec<Similar>) {
        for hit in hits {
            let found = self.entries.iter_mut().find(|(s, _)| {
                s.word == hit.word && s.similarity.to_bits() == hit.similarity.to_bits()
            });
            match found {
                Some((_, count)) => *count += 1,
                None => self.entries.push((hit, 1)),
            }
        }
    }

    /// The `n` most frequent entries' words, count descending with
    /// first-seen order on ties. A word can appear more than once when
    /// it was counted under different similarities.
    fn most_common(&self, n: usize) -> Vec<String> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| self.entries[b].1.cmp(&self.entries[a].1));
        order
            .into_iter()
            .take(n)
            .map(|i| self.entries[i].0.word.clone())
            .collect()
    }
}
