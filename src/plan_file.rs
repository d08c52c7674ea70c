//! File and command-line forms of a composition plan.
//!
//! A [`PlanFile`] is the JSON description of a commit, with fragments named
//! by path instead of carried inline:
//!
//! ```json
//! {
//!   "remove": [2, 4],
//!   "fragments": [
//!     { "anchor": 0, "file": "cover.pdf" },
//!     { "anchor": 3, "slot": 1, "file": "appendix.pdf" }
//!   ],
//!   "order": [
//!     { "kind": "insert", "anchor": 0 },
//!     { "kind": "page", "number": 1 },
//!     { "kind": "page", "number": 3 },
//!     { "kind": "insert", "anchor": 3, "slot": 1 }
//!   ]
//! }
//! ```
//!
//! Relative fragment paths are resolved against the plan file's directory.
//! The same pieces can be given on the command line with [`parse_pages`],
//! [`parse_order`] and [`parse_insert`].

use folio_core::{CompositionPlan, FragmentBlob};
use folio_types::{InsertionKey, PlanItem};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plan file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {what} '{input}': {reason}")]
    Syntax {
        what: &'static str,
        input: String,
        reason: String,
    },
}

/// One fragment document placed at an insertion key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEntry {
    pub anchor: u32,
    #[serde(default)]
    pub slot: u32,
    pub file: PathBuf,
}

impl FragmentEntry {
    pub fn key(&self) -> InsertionKey {
        InsertionKey::new(self.anchor, self.slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanFile {
    pub remove: Vec<u32>,
    pub fragments: Vec<FragmentEntry>,
    pub order: Vec<PlanItem>,
}

impl PlanFile {
    /// Reads a plan file. Fragment paths stay relative until
    /// [`into_plan`](Self::into_plan).
    pub fn load(path: &Path) -> Result<Self, PlanFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads every fragment from disk and builds the plan. Entries sharing a
    /// key keep their file order.
    pub fn into_plan(self, base: &Path) -> Result<CompositionPlan, PlanFileError> {
        let mut builder = CompositionPlan::builder().remove_all(self.remove);
        for entry in &self.fragments {
            let path = if entry.file.is_absolute() {
                entry.file.clone()
            } else {
                base.join(&entry.file)
            };
            builder = builder.insert_at(entry.key(), read_fragment(&path)?);
        }
        Ok(builder.order(self.order).build())
    }
}

/// Reads a fragment document, labelled with its file name.
pub fn read_fragment(path: &Path) -> Result<FragmentBlob, PlanFileError> {
    let bytes = std::fs::read(path).map_err(|source| PlanFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FragmentBlob::new(label, bytes))
}

fn syntax(what: &'static str, input: &str, reason: impl Into<String>) -> PlanFileError {
    PlanFileError::Syntax { what, input: input.to_string(), reason: reason.into() }
}

fn parse_number(what: &'static str, input: &str) -> Result<u32, PlanFileError> {
    input
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| syntax(what, input, e.to_string()))
}

/// Highest page number a range may end on. Ranges are expanded eagerly.
pub const MAX_RANGE_END: u32 = u16::MAX as u32;

/// Parses `"2,4,7-9"` into page numbers. Ranges are inclusive and end at or
/// before [`MAX_RANGE_END`].
pub fn parse_pages(input: &str) -> Result<Vec<u32>, PlanFileError> {
    let mut pages = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_number("page range", start)?;
                let end = parse_number("page range", end)?;
                if start > end {
                    return Err(syntax("page range", part, "start is after end"));
                }
                if end > MAX_RANGE_END {
                    return Err(syntax(
                        "page range",
                        part,
                        format!("ends after page {}", MAX_RANGE_END),
                    ));
                }
                pages.extend(start..=end);
            }
            None => pages.push(parse_number("page number", part)?),
        }
    }
    Ok(pages)
}

/// Parses an insertion key, `"3"` or `"3.1"` (anchor, slot).
pub fn parse_key(input: &str) -> Result<InsertionKey, PlanFileError> {
    match input.trim().split_once('.') {
        Some((anchor, slot)) => Ok(InsertionKey::new(
            parse_number("fragment anchor", anchor)?,
            parse_number("fragment slot", slot)?,
        )),
        None => Ok(InsertionKey::after(parse_number("fragment anchor", input)?)),
    }
}

/// Parses an explicit order such as `"1,3,i1.0,2"`: bare numbers are
/// original pages, `i<key>` places a fragment group.
pub fn parse_order(input: &str) -> Result<Vec<PlanItem>, PlanFileError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.strip_prefix('i') {
            Some(key) => parse_key(key).map(PlanItem::insert),
            None => parse_number("order item", item).map(PlanItem::page),
        })
        .collect()
}

/// Parses `"<key>=<file>"`, e.g. `"1=cover.pdf"` or `"2.1=scan.pdf"`.
pub fn parse_insert(input: &str) -> Result<(InsertionKey, PathBuf), PlanFileError> {
    let (key, file) = input
        .split_once('=')
        .ok_or_else(|| syntax("insertion", input, "expected <anchor>[.<slot>]=<file>"))?;
    if file.is_empty() {
        return Err(syntax("insertion", input, "missing file"));
    }
    Ok((parse_key(key)?, PathBuf::from(file)))
}
