#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Class-labeled corpora for anchor-based topic inference.
//!
//! A [`BaseCorpus`] holds the unlabeled document-word matrix. A
//! [`ClassifiedDataset`] wraps it with class labels and produces the
//! word co-occurrence matrix Q, either in one batch or while labels arrive one
//! document at a time.

pub mod config;
pub mod cooccurrence;
pub mod corpus;
pub mod dataset;
pub mod labeling;
pub mod observability;

pub use config::{ConfigError, Settings};
pub use corpus::{BaseCorpus, ClassifiedCorpus, CorpusError, DocWords, Metadata};
pub use dataset::{ClassifiedDataset, CooccurrenceStrategy, LabelingStrategy};
pub use labeling::{ClassOrder, LabelFileError, LabelMap, LabelWeight};
