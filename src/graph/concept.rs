//! The concept graph: titles and skills as nodes, observed associations
//! as weighted undirected edges.
//!
//! The graph is deliberately narrow - two node kinds in an alternating
//! relationship, no deletion, and exactly two read queries (first-hop and
//! second-hop neighbors). Uses petgraph for storage plus a key -> NodeIndex
//! side map for string lookup.
//!
//! Ordering guarantees (load-bearing for reproducible output):
//! - Neighbor ranking sorts by edge weight descending; ties break by
//!   ascending `EdgeIndex`, i.e. edge insertion order. Indices are never
//!   invalidated because the graph has no removals.
//! - `next_neighbors` keeps one candidate per two-hop path. The same
//!   destination node can appear several times when reachable through
//!   several intermediates; frequently reachable nodes are favored by
//!   path count as well as weight. Do not deduplicate.

use std::cmp::Ordering;
use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::types::NodeKind;

/// Node payload: the lower-cased key plus its fixed kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub key: String,
    pub kind: NodeKind,
}

/// One ranked query result. `score` is the edge weight for first-hop
/// queries and the cumulative path weight for second-hop queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub key: String,
    pub kind: NodeKind,
    pub score: f64,
}

/// Kind assignment for batch node insertion: one kind for every key, or
/// one kind per key (lengths must match).
#[derive(Debug, Clone, Copy)]
pub enum KindSpec<'a> {
    Same(NodeKind),
    Each(&'a [NodeKind]),
}

/// Serializable whole-graph snapshot.
///
/// Nodes and edges are stored in insertion order and edge endpoints as
/// raw node indices, so a load/store round trip reproduces not just the
/// structure but the tie-break behavior of the rebuilt graph.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    nodes: Vec<ConceptNode>,
    edges: Vec<(u32, u32, f64)>,
}

/// Typed, weighted, undirected concept graph.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    graph: UnGraph<ConceptNode, f64>,
    index: HashMap<String, NodeIndex>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Insert a node. No-op if the key already exists - the stored kind
    /// is kept even if `kind` differs (caller contract: kinds are fixed
    /// at creation; re-inserting with another kind is undefined behavior
    /// and is not reconciled here).
    pub fn add_node(&mut self, key: impl Into<String>, kind: NodeKind) {
        let key = key.into();
        if self.index.contains_key(&key) {
            return;
        }
        let idx = self.graph.add_node(ConceptNode { key: key.clone(), kind });
        self.index.insert(key, idx);
    }

    /// Batch insert. A per-key kind list with the wrong length is rejected
    /// before any mutation, so the call is all-or-nothing.
    pub fn add_nodes<S>(&mut self, keys: &[S], kinds: KindSpec<'_>) -> Result<(), GraphError>
    where
        S: AsRef<str>,
    {
        if let KindSpec::Each(list) = kinds {
            if list.len() != keys.len() {
                return Err(GraphError::KindCountMismatch {
                    keys: keys.len(),
                    kinds: list.len(),
                });
            }
        }
        for (i, key) in keys.iter().enumerate() {
            let kind = match kinds {
                KindSpec::Same(k) => k,
                KindSpec::Each(list) => list[i],
            };
            self.add_node(key.as_ref(), kind);
        }
        Ok(())
    }

    /// Insert or max-merge an edge: an existing edge keeps the larger of
    /// the stored and new weight ("strongest observed association wins").
    ///
    /// Both endpoints must already exist. Self-loops (`a == b`) are
    /// storable but excluded from every query result. Weights are
    /// expected non-negative; the merge rule itself does not care.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) -> Result<(), GraphError> {
        let ia = self.lookup(a)?;
        let ib = self.lookup(b)?;

        match self.graph.find_edge(ia, ib) {
            Some(edge) => {
                let stored = &mut self.graph[edge];
                if weight > *stored {
                    *stored = weight;
                }
            }
            None => {
                self.graph.add_edge(ia, ib, weight);
            }
        }
        Ok(())
    }

    /// Up to `k` directly adjacent nodes, ranked by edge weight
    /// descending. An isolated node yields an empty list; a missing key
    /// is an error.
    pub fn nearest_neighbors(&self, key: &str, k: usize) -> Result<Vec<Neighbor>, GraphError> {
        let idx = self.lookup(key)?;
        let mut ranked = self.ranked_adjacent(idx);
        ranked.truncate(k);
        Ok(ranked
            .into_iter()
            .map(|(n, w)| self.neighbor(n, w))
            .collect())
    }

    /// Up to `k` second-hop nodes, ranked by cumulative two-hop path
    /// weight. Every path contributes its own candidate: a node reachable
    /// through multiple intermediates appears once per path.
    pub fn next_neighbors(&self, key: &str, k: usize) -> Result<Vec<Neighbor>, GraphError> {
        let idx = self.lookup(key)?;

        // Walk first-hop neighbors in ranked order so that equal path
        // scores surface in a stable, documented order after the stable
        // sort below.
        let mut candidates: Vec<(NodeIndex, f64)> = Vec::new();
        for (v, w1) in self.ranked_adjacent(idx) {
            for (u, w2) in self.ranked_adjacent(v) {
                if u == idx {
                    continue;
                }
                candidates.push((u, w1 + w2));
            }
        }

        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates.truncate(k);
        Ok(candidates
            .into_iter()
            .map(|(n, w)| self.neighbor(n, w))
            .collect())
    }

    /// Kind of a node, if present.
    pub fn node_kind(&self, key: &str) -> Option<NodeKind> {
        self.index.get(key).map(|&idx| self.graph[idx].kind)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Stored weight of the edge between `a` and `b`, if any.
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = *self.index.get(a)?;
        let ib = *self.index.get(b)?;
        let edge = self.graph.find_edge(ia, ib)?;
        Some(self.graph[edge])
    }

    /// Capture the whole graph in insertion order for persistence.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self
                .graph
                .node_indices()
                .map(|i| self.graph[i].clone())
                .collect(),
            edges: self
                .graph
                .edge_indices()
                .map(|e| {
                    let (a, b) = self.graph.edge_endpoints(e).expect("edge has endpoints");
                    (a.index() as u32, b.index() as u32, self.graph[e])
                })
                .collect(),
        }
    }

    /// Rebuild a graph from a snapshot. Nodes and edges are re-inserted
    /// in snapshot order, so indices (and therefore tie-breaks) match the
    /// graph that was saved.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut graph = ConceptGraph::new();
        for node in snapshot.nodes {
            graph.add_node(node.key, node.kind);
        }
        for (a, b, weight) in snapshot.edges {
            graph.graph.add_edge(
                NodeIndex::new(a as usize),
                NodeIndex::new(b as usize),
                weight,
            );
        }
        graph
    }

    fn lookup(&self, key: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))
    }

    /// Adjacent nodes with edge weights, sorted weight-descending with
    /// insertion-order (ascending EdgeIndex) tie-break. Self-loops are
    /// dropped here, which keeps them out of both query paths.
    fn ranked_adjacent(&self, idx: NodeIndex) -> Vec<(NodeIndex, f64)> {
        let mut adjacent: Vec<_> = self
            .graph
            .edges(idx)
            .filter_map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                if other == idx {
                    return None; // self-loop
                }
                Some((e.id(), other, *e.weight()))
            })
            .collect();

        adjacent.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        adjacent.into_iter().map(|(_, n, w)| (n, w)).collect()
    }

    fn neighbor(&self, idx: NodeIndex, score: f64) -> Neighbor {
        let node = &self.graph[idx];
        Neighbor {
            key: node.key.clone(),
            kind: node.kind,
            score,
        }
    }
}
