//! Unlabeled corpus as produced by the import pipeline.

use rustc_hash::FxHashMap;
use sprs::CsMat;

use super::{CorpusError, DocWords};

/// Free-form per-document metadata (source directory, timestamps, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Vocabulary, document-word counts, titles and metadata of a corpus.
#[derive(Debug, Clone)]
pub struct BaseCorpus {
    pub(crate) vocab: Vec<String>,
    pub(crate) docwords: DocWords,
    pub(crate) titles: Vec<String>,
    pub(crate) metadata: Vec<Metadata>,
    pub(crate) title_index: FxHashMap<String, usize>,
}

impl BaseCorpus {
    /// Wraps a `vocab x docs` CSC count matrix.
    ///
    /// An empty `metadata` vector is expanded to one empty map per document.
    ///
    /// # Errors
    /// Returns [`CorpusError`] when shapes disagree, the matrix is not CSC,
    /// an entry is negative, or a title repeats.
    pub fn new(
        vocab: Vec<String>,
        docwords: CsMat<f64>,
        titles: Vec<String>,
        metadata: Vec<Metadata>,
    ) -> Result<Self, CorpusError> {
        let docwords = DocWords::from_csc(docwords)?;
        Self::assemble(vocab, docwords, titles, metadata)
    }

    /// Builds a corpus from sparse `(word index, count)` lists, one per
    /// document. Repeated word indices within a document are summed.
    ///
    /// # Errors
    /// Same conditions as [`BaseCorpus::new`], plus word indices outside the
    /// vocabulary.
    pub fn from_documents(
        vocab: Vec<String>,
        documents: Vec<Vec<(usize, f64)>>,
        titles: Vec<String>,
        metadata: Vec<Metadata>,
    ) -> Result<Self, CorpusError> {
        let mut columns = Vec::with_capacity(documents.len());
        for (col, mut document) in documents.into_iter().enumerate() {
            document.sort_by_key(|&(row, _)| row);
            let mut column: Vec<(usize, f64)> = Vec::with_capacity(document.len());
            for (row, value) in document {
                if row >= vocab.len() {
                    return Err(CorpusError::ShapeMismatch(format!(
                        "document {col} references word {row} but the vocabulary has {} entries",
                        vocab.len()
                    )));
                }
                if value.is_sign_negative() || !value.is_finite() {
                    return Err(CorpusError::InvalidCount {
                        row,
                        col,
                        value: value.to_string(),
                    });
                }
                if let Some(last) = column.last_mut().filter(|last| last.0 == row) {
                    last.1 += value;
                } else {
                    column.push((row, value));
                }
            }
            columns.push(column);
        }
        let docwords = DocWords::from_columns(vocab.len(), &columns);
        Self::assemble(vocab, docwords, titles, metadata)
    }

    fn assemble(
        vocab: Vec<String>,
        docwords: DocWords,
        titles: Vec<String>,
        mut metadata: Vec<Metadata>,
    ) -> Result<Self, CorpusError> {
        if docwords.rows() != vocab.len() {
            return Err(CorpusError::ShapeMismatch(format!(
                "matrix has {} rows but the vocabulary has {} entries",
                docwords.rows(),
                vocab.len()
            )));
        }
        if docwords.cols() != titles.len() {
            return Err(CorpusError::ShapeMismatch(format!(
                "matrix has {} columns but there are {} titles",
                docwords.cols(),
                titles.len()
            )));
        }
        if metadata.is_empty() {
            metadata = vec![Metadata::new(); titles.len()];
        } else if metadata.len() != titles.len() {
            return Err(CorpusError::ShapeMismatch(format!(
                "{} metadata entries for {} titles",
                metadata.len(),
                titles.len()
            )));
        }

        let mut title_index = FxHashMap::default();
        for (index, title) in titles.iter().enumerate() {
            if title_index.insert(title.clone(), index).is_some() {
                return Err(CorpusError::DuplicateTitle(title.clone()));
            }
        }

        Ok(Self {
            vocab,
            docwords,
            titles,
            metadata,
            title_index,
        })
    }

    #[must_use]
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    #[must_use]
    pub fn docwords(&self) -> &DocWords {
        &self.docwords
    }

    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    #[must_use]
    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    #[must_use]
    pub fn num_docs(&self) -> usize {
        self.titles.len()
    }

    /// Column index of the document called `title`.
    #[must_use]
    pub fn doc_index(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }
}
