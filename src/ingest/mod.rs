//! JSONL record ingestion.
//!
//! One JSON object per line, each with at least `title` and `description`
//! strings. Annotations from the external linguistic annotator ride along
//! in optional `tokens` / `entities` arrays; every other field is
//! ignored. A malformed line is an error for that line only - the reader
//! keeps going and the caller decides how to report the skip.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::types::{AnnotatedDoc, EntitySpan, Token};

/// One parsed job-posting record.
#[derive(Debug, Clone)]
pub struct Record {
    pub title: String,
    pub description: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
}

impl Record {
    /// The record's annotations as a scorer-ready document.
    pub fn doc(&self) -> AnnotatedDoc {
        AnnotatedDoc::new(self.tokens.clone(), self.entities.clone())
    }
}

/// Raw line shape. Required fields are optional here so that a missing
/// field becomes a reportable per-record error instead of a serde panic
/// path we cannot attach line context to.
#[derive(Debug, Deserialize)]
struct RawRecord {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tokens: Vec<Token>,
    #[serde(default)]
    entities: Vec<EntitySpan>,
}

/// Parse one JSONL line into a record. Empty `title`/`description` count
/// as missing.
pub fn parse_record(line: &str) -> Result<Record> {
    let raw: RawRecord = serde_json::from_str(line).context("Invalid JSON")?;

    let title = match raw.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => bail!("Missing or empty 'title'"),
    };
    let description = match raw.description {
        Some(d) if !d.trim().is_empty() => d,
        _ => bail!("Missing or empty 'description'"),
    };

    Ok(Record {
        title,
        description,
        tokens: raw.tokens,
        entities: raw.entities,
    })
}

/// Streaming reader over a JSONL file. Yields `(line_number, result)` so
/// the caller can report skips with their position; blank lines are
/// passed over silently.
pub struct RecordReader {
    lines: Lines<BufReader<File>>,
    lineno: usize,
}

impl RecordReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open records: {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            lineno: 0,
        })
    }
}

impl Iterator for RecordReader {
    type Item = (usize, Result<Record>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.lineno += 1;
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some((self.lineno, parse_record(&line))),
                Err(e) => return Some((self.lineno, Err(e).context("Failed to read line"))),
            }
        }
    }
}
