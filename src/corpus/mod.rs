//! Corpus data holders: the unlabeled base corpus and its classified view.

pub mod base;
pub mod classified;
pub mod docwords;
mod label_store;

use thiserror::Error;

pub use base::{BaseCorpus, Metadata};
pub use classified::ClassifiedCorpus;
pub use docwords::DocWords;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorpusError {
    #[error("unknown document title: {0}")]
    UnknownTitle(String),
    #[error("document index {index} out of range for {num_docs} documents")]
    UnknownDocument { index: usize, num_docs: usize },
    #[error("labels of a batch corpus are fixed at construction")]
    StaticLabels,
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("document-word matrix must be column-compressed (one column per document)")]
    NotColumnMajor,
    #[error("document-word matrix holds an invalid count at ({row}, {col}): {value}")]
    InvalidCount { row: usize, col: usize, value: String },
    #[error("duplicate document title: {0}")]
    DuplicateTitle(String),
    #[error("invalid class order: {0}")]
    InvalidClassOrder(String),
}
