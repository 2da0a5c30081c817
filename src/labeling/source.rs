//! Where static label maps come from: label files and document metadata.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::hash::BuildHasher;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::{ClassOrder, LabelMap};
use crate::corpus::BaseCorpus;

#[derive(Debug, Error)]
pub enum LabelFileError {
    #[error("failed to read label file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `<title> <label>`, got {content:?}")]
    Malformed { line: usize, content: String },
}

/// Parses `<title> <label>` pairs, one per line. Blank lines are skipped and a
/// title that appears twice keeps its last label.
///
/// # Errors
/// Returns [`LabelFileError::Malformed`] for a non-blank line that does not
/// hold exactly two whitespace-separated fields.
pub fn parse_labels<R: BufRead>(reader: R) -> Result<LabelMap, LabelFileError> {
    let mut labels = LabelMap::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(title), Some(label), None) => {
                labels.insert(title.to_string(), label.to_string());
            }
            _ => {
                return Err(LabelFileError::Malformed {
                    line: number + 1,
                    content: trimmed.to_string(),
                });
            }
        }
    }
    Ok(labels)
}

/// Reads a label file from disk.
///
/// # Errors
/// Propagates I/O failures and malformed lines.
pub fn read_labels(path: impl AsRef<Path>) -> Result<LabelMap, LabelFileError> {
    let path = path.as_ref();
    let labels = parse_labels(BufReader::new(File::open(path)?))?;
    info!(path = %path.display(), labels = labels.len(), "label file loaded");
    Ok(labels)
}

/// Derives coarse labels from a per-document metadata field.
///
/// The field is read as a path and its final component is looked up in
/// `groups` (fine label to coarse label). Classes are numbered in the order
/// their first document appears. Documents with a missing field or an
/// unmapped value stay unlabeled.
#[must_use]
pub fn labels_from_metadata<S: BuildHasher>(
    corpus: &BaseCorpus,
    field: &str,
    groups: &HashMap<String, String, S>,
) -> (LabelMap, ClassOrder) {
    let mut labels = LabelMap::new();
    let mut order = ClassOrder::new();
    let mut skipped = 0usize;

    for (title, metadatum) in corpus.titles().iter().zip(corpus.metadata()) {
        let coarse = metadatum
            .get(field)
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| Path::new(raw).file_name())
            .and_then(OsStr::to_str)
            .and_then(|fine| groups.get(fine));
        if let Some(label) = coarse {
            order.insert(label);
            labels.insert(title.clone(), label.clone());
        } else {
            skipped += 1;
        }
    }

    debug!(
        labeled = labels.len(),
        skipped,
        classes = order.len(),
        field,
        "labels derived from metadata"
    );
    (labels, order)
}
