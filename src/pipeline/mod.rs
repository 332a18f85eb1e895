//! Pipeline orchestration: records in, concept graph out.
//!
//! Per record: insert the lower-cased title as a title node, bias the
//! annotated description toward its requirements section, run the
//! candidate scorer, and merge each returned (skill, weight) pair into
//! the graph as a skill node plus a max-merged edge. Every
//! `checkpoint_every` records the whole graph is snapshotted to disk so
//! a crash loses at most one interval of work.
//!
//! Single writer by design: the pipeline owns the graph exclusively
//! while it runs, and checkpointing is serialized with mutation.

use std::path::PathBuf;

use anyhow::Result;

use crate::graph::{store, ConceptGraph, Neighbor};
use crate::ingest::Record;
use crate::scoring::{EmbeddingModel, SkillFilter};
use crate::types::{NodeKind, QueryMode};

/// The requirements-section stem. The first case-sensitive occurrence in
/// the description marks where extraction starts.
const REQUIREMENTS_STEM: &str = "require";

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records processed into the graph
    pub processed: usize,
    /// Malformed records skipped
    pub skipped: usize,
    /// Checkpoints written (including the final one)
    pub checkpoints: usize,
}

/// The single-writer ingestion pipeline.
pub struct Pipeline<'m, M: EmbeddingModel> {
    graph: ConceptGraph,
    filter: SkillFilter<'m, M>,
    checkpoint_every: usize,
    graph_path: PathBuf,
}

impl<'m, M: EmbeddingModel> Pipeline<'m, M> {
    pub fn new(
        model: &'m M,
        topk: usize,
        checkpoint_every: usize,
        graph_path: PathBuf,
    ) -> Self {
        Self {
            graph: ConceptGraph::new(),
            filter: SkillFilter::new(model, topk),
            checkpoint_every: checkpoint_every.max(1),
            graph_path,
        }
    }

    /// Resume from an existing graph instead of starting empty.
    pub fn with_graph(mut self, graph: ConceptGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    /// Ingest one record. Returns how many skill edges were merged.
    pub fn process_record(&mut self, record: &Record) -> Result<usize> {
        let title = record.title.to_lowercase();
        self.graph.add_node(title.clone(), NodeKind::Title);

        let doc = record.doc();
        let doc = match requirements_offset(&record.description) {
            Some(offset) => doc.slice_from(offset),
            None => doc,
        };

        let candidates = self.filter.process(&doc);
        let mut merged = 0;
        for candidate in candidates {
            let skill = candidate.text.trim().to_lowercase();
            if skill.is_empty() {
                continue;
            }
            self.graph.add_node(skill.clone(), NodeKind::Skill);
            self.graph.add_edge(&title, &skill, candidate.weight)?;
            merged += 1;
        }
        Ok(merged)
    }

    /// Drive a full ingestion run. Malformed records are reported to
    /// stderr and skipped; a failed checkpoint write is fatal (the
    /// previous checkpoint on disk stays intact either way). A final
    /// snapshot is always written, even for an empty input.
    pub fn run<I>(&mut self, records: I, verbose: bool) -> Result<PipelineStats>
    where
        I: Iterator<Item = (usize, Result<Record>)>,
    {
        let mut stats = PipelineStats::default();

        for (lineno, result) in records {
            match result {
                Ok(record) => {
                    self.process_record(&record)?;
                    stats.processed += 1;

                    if stats.processed % self.checkpoint_every == 0 {
                        store::save(&self.graph, &self.graph_path)?;
                        stats.checkpoints += 1;
                        if verbose {
                            eprintln!(
                                "✓ Checkpoint after {} records: {} nodes, {} edges",
                                stats.processed,
                                self.graph.node_count(),
                                self.graph.edge_count()
                            );
                        }
                    }
                }
                Err(e) => {
                    stats.skipped += 1;
                    eprintln!("⚠️  Skipping record at line {}: {:#}", lineno, e);
                }
            }
        }

        store::save(&self.graph, &self.graph_path)?;
        stats.checkpoints += 1;
        Ok(stats)
    }
}

/// Char offset of the first case-sensitive `require` in the description,
/// scanned with newlines treated as spaces (matching how the description
/// is prepared upstream for annotation). Token and entity offsets count
/// chars, so the byte index from the search is converted before use.
fn requirements_offset(description: &str) -> Option<usize> {
    let scan = description.replace('\n', " ");
    let byte = scan.find(REQUIREMENTS_STEM)?;
    Some(scan[..byte].chars().count())
}

/// Query-surface entry point: case-normalize the key, then dispatch to
/// the first-hop or second-hop ranking.
pub fn query(
    graph: &ConceptGraph,
    name: &str,
    count: usize,
    mode: QueryMode,
) -> Result<Vec<Neighbor>, crate::error::GraphError> {
    let key = name.to_lowercase();
    match mode {
        QueryMode::Nearest => graph.nearest_neighbors(&key, count),
        QueryMode::Next => graph.next_neighbors(&key, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::ingest::parse_record;
    use crate::scoring::{EmbedError, Similar};

    /// Model with nothing to say: every candidate scores 0, so ranking
    /// falls back to admission order and the label weights drive edges.
    struct SilentModel;

    impl EmbeddingModel for SilentModel {
        fn most_similar(&self, _w: &str, _n: usize) -> Result<Vec<Similar>, EmbedError> {
            Ok(vec![])
        }
        fn similarity(&self, _a: &str, _b: &str) -> Result<f64, EmbedError> {
            Ok(0.0)
        }
    }

    fn graph_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("graph.bin")
    }

    fn record(json: &str) -> Record {
        parse_record(json).unwrap()
    }

    #[test]
    fn test_process_record_adds_title_and_skill_edges() {
        let dir = tempfile::tempdir().unwrap();
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 100, graph_path(&dir));

        let rec = record(
            r#"{
                "title": "Software Developer",
                "description": "requires Java and SQL",
                "tokens": [
                    {"text": "Java", "pos": "PROPN", "start": 9},
                    {"text": "SQL", "pos": "PROPN", "start": 18}
                ],
                "entities": [
                    {"text": "Java", "label": "PRODUCT", "start": 9},
                    {"text": "SQL", "label": "ORG", "start": 18}
                ]
            }"#,
        );

        let merged = pipeline.process_record(&rec).unwrap();
        assert_eq!(merged, 2);

        let g = pipeline.graph();
        assert_eq!(g.node_kind("software developer"), Some(NodeKind::Title));
        assert_eq!(g.node_kind("java"), Some(NodeKind::Skill));
        assert_eq!(g.edge_weight("software developer", "java"), Some(0.8));
        assert_eq!(g.edge_weight("software developer", "sql"), Some(0.7));
    }

    #[test]
    fn test_process_record_max_merges_across_records() {
        let dir = tempfile::tempdir().unwrap();
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 100, graph_path(&dir));

        let strong = record(
            r#"{"title":"Dev","description":"requires Java",
               "tokens":[{"text":"Java","pos":"PROPN","start":9}],
               "entities":[{"text":"Java","label":"PRODUCT","start":9}]}"#,
        );
        let weak = record(
            r#"{"title":"Dev","description":"requires Java",
               "tokens":[{"text":"Java","pos":"PROPN","start":9}],
               "entities":[{"text":"Java","label":"EVENT","start":9}]}"#,
        );

        pipeline.process_record(&weak).unwrap();
        assert_eq!(pipeline.graph().edge_weight("dev", "java"), Some(0.3));
        pipeline.process_record(&strong).unwrap();
        assert_eq!(pipeline.graph().edge_weight("dev", "java"), Some(0.8));
        // Weaker observation afterwards does not shrink it back
        pipeline.process_record(&weak).unwrap();
        assert_eq!(pipeline.graph().edge_weight("dev", "java"), Some(0.8));
    }

    #[test]
    fn test_process_record_no_entities_title_only() {
        let dir = tempfile::tempdir().unwrap();
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 100, graph_path(&dir));

        let rec = record(r#"{"title":"Barista","description":"makes coffee"}"#);
        assert_eq!(pipeline.process_record(&rec).unwrap(), 0);
        assert_eq!(pipeline.graph().node_count(), 1);
        assert_eq!(pipeline.graph().edge_count(), 0);
    }

    #[test]
    fn test_process_record_requirements_slicing() {
        let dir = tempfile::tempdir().unwrap();
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 100, graph_path(&dir));

        // "require" first occurs at offset 13; "Perks" sits before it and
        // must not become a skill, "Java" after it must.
        let rec = record(
            r#"{
                "title": "Dev",
                "description": "Perks galore required skill Java",
                "tokens": [
                    {"text": "Perks", "pos": "NOUN", "start": 0},
                    {"text": "skill", "pos": "NOUN", "start": 22},
                    {"text": "Java", "pos": "PROPN", "start": 28}
                ],
                "entities": [
                    {"text": "Perks", "label": "PRODUCT", "start": 0},
                    {"text": "Java", "label": "PRODUCT", "start": 28}
                ]
            }"#,
        );

        pipeline.process_record(&rec).unwrap();
        let g = pipeline.graph();
        assert!(g.contains("java"));
        assert!(!g.contains("perks"));
    }

    #[test]
    fn test_requirements_offset() {
        assert_eq!(requirements_offset("we require java"), Some(3));
        assert_eq!(requirements_offset("Requirements: java"), None); // case-sensitive
        assert_eq!(requirements_offset("nothing here"), None);
        // Newlines scan as spaces; offsets are unaffected
        assert_eq!(requirements_offset("perks\nrequired java"), Some(6));
        // Multibyte text before the stem: chars counted, not bytes
        assert_eq!(requirements_offset("€€€€€€€€€€require java"), Some(10));
    }

    #[test]
    fn test_process_record_requirements_slicing_multibyte() {
        let dir = tempfile::tempdir().unwrap();
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 100, graph_path(&dir));

        // Ten euro signs occupy 30 bytes but only 10 chars, so "require"
        // sits at char 10 and "Java" at char 18. The annotated offsets
        // count chars; the skill after the stem must survive slicing.
        let rec = record(
            r#"{
                "title": "Dev",
                "description": "€€€€€€€€€€require Java",
                "tokens": [{"text": "Java", "pos": "PROPN", "start": 18}],
                "entities": [{"text": "Java", "label": "PRODUCT", "start": 18}]
            }"#,
        );

        pipeline.process_record(&rec).unwrap();
        assert!(pipeline.graph().contains("java"));
    }

    #[test]
    fn test_run_skips_bad_records_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = graph_path(&dir);
        let model = SilentModel;
        let mut pipeline = Pipeline::new(&model, 10, 1, path.clone());

        let lines = vec![
            (
                1,
                parse_record(r#"{"title":"Dev","description":"requires code"}"#),
            ),
            (2, parse_record("garbage")),
            (
                3,
                parse_record(r#"{"title":"Chef","description":"cooks food"}"#),
            ),
        ];

        let stats = pipeline.run(lines.into_iter(), false).unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 1);
        // checkpoint_every = 1: one per record plus the final snapshot
        assert_eq!(stats.checkpoints, 3);

        let loaded = store::load(&path).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.node_kind("dev"), Some(NodeKind::Title));
        assert_eq!(loaded.node_kind("chef"), Some(NodeKind::Title));
    }

    #[test]
    fn test_with_graph_resumes_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = graph_path(&dir);
        let model = SilentModel;

        let weak = record(
            r#"{"title":"Dev","description":"requires Java",
               "tokens":[{"text":"Java","pos":"PROPN","start":9}],
               "entities":[{"text":"Java","label":"EVENT","start":9}]}"#,
        );
        let strong = record(
            r#"{"title":"Dev","description":"requires Java",
               "tokens":[{"text":"Java","pos":"PROPN","start":9}],
               "entities":[{"text":"Java","label":"PRODUCT","start":9}]}"#,
        );

        let mut first = Pipeline::new(&model, 10, 100, path.clone());
        first.run([(1, Ok(weak))].into_iter(), false).unwrap();

        // A later run picks up where the checkpoint left off and keeps
        // max-merging into the same edges.
        let existing = store::load(&path).unwrap();
        let mut second = Pipeline::new(&model, 10, 100, path.clone()).with_graph(existing);
        second.run([(1, Ok(strong))].into_iter(), false).unwrap();

        let loaded = store::load(&path).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_weight("dev", "java"), Some(0.8));
    }

    #[test]
    fn test_query_case_normalizes_and_dispatches() {
        let mut g = ConceptGraph::new();
        g.add_node("dev", NodeKind::Title);
        g.add_node("java", NodeKind::Skill);
        g.add_node("architect", NodeKind::Title);
        g.add_edge("dev", "java", 0.8).unwrap();
        g.add_edge("architect", "java", 0.6).unwrap();

        let nearest = query(&g, "DEV", 5, QueryMode::Nearest).unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].key, "java");

        let next = query(&g, "Dev", 5, QueryMode::Next).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].key, "architect");
        assert_eq!(next[0].score, 0.8 + 0.6);

        assert_eq!(
            query(&g, "ghost", 1, QueryMode::Nearest).unwrap_err(),
            GraphError::UnknownNode("ghost".into())
        );
    }
}
