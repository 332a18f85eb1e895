//! Durable graph checkpoints.
//!
//! The whole graph is serialized as one bincode blob. Saving writes a
//! sibling `<path>.tmp` file and renames it over the target, so a crash
//! mid-write can never corrupt the previous checkpoint: the old blob
//! stays intact until the new one is fully on disk.
//!
//! Checkpoints are full-structure snapshots, not incremental. Callers
//! serialize checkpointing against graph mutation (the pipeline is the
//! single writer).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::concept::{ConceptGraph, Snapshot};

/// Save the graph to `path`, replacing any existing checkpoint.
pub fn save(graph: &ConceptGraph, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(&graph.to_snapshot())
        .context("Failed to serialize graph snapshot")?;

    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes)
        .with_context(|| format!("Failed to write checkpoint: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace checkpoint: {}", path.display()))?;

    Ok(())
}

/// Load a graph from a checkpoint written by [`save`].
pub fn load(path: &Path) -> Result<ConceptGraph> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read checkpoint: {}", path.display()))?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)
        .with_context(|| format!("Failed to decode checkpoint: {}", path.display()))?;
    Ok(ConceptGraph::from_snapshot(snapshot))
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
