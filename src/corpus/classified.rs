//! Corpus extended with class pseudo-tokens and a label map.

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{BaseCorpus, CorpusError, DocWords, Metadata};
use crate::labeling::{ClassOrder, LabelMap};

/// Corpus whose vocabulary ends with one pseudo-token per class.
///
/// Rows `0..orig_vocab_size` of the document-word matrix are real words and
/// never change. Rows past that are pseudo-rows carrying label evidence.
#[derive(Debug, Clone)]
pub struct ClassifiedCorpus {
    pub(crate) vocab: Vec<String>,
    pub(crate) orig_vocab_size: usize,
    pub(crate) docwords: DocWords,
    pub(crate) titles: Vec<String>,
    pub(crate) metadata: Vec<Metadata>,
    pub(crate) title_index: FxHashMap<String, usize>,
    pub(crate) labels: LabelMap,
    pub(crate) class_order: ClassOrder,
    tokens: FxHashMap<usize, Vec<usize>>,
}

impl ClassifiedCorpus {
    /// Static, fully supervised corpus. Every labeled document gets a binary
    /// indicator in its class pseudo-row; unlabeled documents get nothing.
    ///
    /// Labels for titles that are not in the corpus are kept in the label map
    /// but do not touch the matrix.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidClassOrder`] when a label is missing
    /// from `class_order`.
    pub fn batch(
        base: BaseCorpus,
        labels: LabelMap,
        class_order: ClassOrder,
    ) -> Result<Self, CorpusError> {
        check_labels_are_ordered(&labels, &class_order)?;
        let mut corpus = Self::plain(base, labels, class_order)?;
        let orig = corpus.orig_vocab_size;
        corpus
            .vocab
            .extend(corpus.class_order.ordered_classes().iter().cloned());

        let columns: Vec<Vec<(usize, f64)>> = (0..corpus.num_docs())
            .map(|doc| {
                let mut column = corpus.docwords.column(doc);
                if let Some(class) = corpus.class_of(doc) {
                    column.push((orig + class, 1.0));
                }
                column
            })
            .collect();
        corpus.docwords = DocWords::from_columns(corpus.vocab.len(), &columns);

        debug!(
            classes = corpus.class_order.len(),
            labeled = corpus.labels.len(),
            "batch corpus built"
        );
        Ok(corpus)
    }

    /// Corpus with no classes yet; labels arrive one document at a time.
    #[must_use]
    pub fn incremental(base: BaseCorpus) -> Self {
        let BaseCorpus {
            vocab,
            docwords,
            titles,
            metadata,
            title_index,
        } = base;
        Self {
            orig_vocab_size: vocab.len(),
            vocab,
            docwords,
            titles,
            metadata,
            title_index,
            labels: LabelMap::new(),
            class_order: ClassOrder::new(),
            tokens: FxHashMap::default(),
        }
    }

    /// Keeps the base vocabulary and matrix as they are and only records
    /// labels. Used where supervision is folded in after the fact.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidClassOrder`] when a label is missing
    /// from `class_order`.
    pub fn plain(
        base: BaseCorpus,
        labels: LabelMap,
        class_order: ClassOrder,
    ) -> Result<Self, CorpusError> {
        check_labels_are_ordered(&labels, &class_order)?;
        let mut corpus = Self::incremental(base);
        corpus.labels = labels;
        corpus.class_order = class_order;
        Ok(corpus)
    }

    #[must_use]
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of real words, i.e. the index of the first pseudo-token.
    #[must_use]
    pub fn orig_vocab_size(&self) -> usize {
        self.orig_vocab_size
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

    #[must_use]
    pub fn doc_index(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    #[must_use]
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    #[must_use]
    pub fn class_order(&self) -> &ClassOrder {
        &self.class_order
    }

    #[must_use]
    pub fn ordered_classes(&self) -> &[String] {
        self.class_order.ordered_classes()
    }

    /// Class index of document `doc`, if it carries a label.
    #[must_use]
    pub fn class_of(&self, doc: usize) -> Option<usize> {
        self.titles
            .get(doc)
            .and_then(|title| self.labels.get(title))
            .and_then(|label| self.class_order.index_of(label))
    }

    /// Real-word token count of document `doc`.
    #[must_use]
    pub fn real_token_count(&self, doc: usize) -> f64 {
        self.docwords.column_sum_below(doc, self.orig_vocab_size)
    }

    /// Real-word tokens of document `doc`, each word index repeated by its
    /// count and shuffled with `rng` the first time this document is asked
    /// for. Later calls return the same permutation whatever `rng` is passed.
    ///
    /// # Errors
    /// Returns [`CorpusError::UnknownDocument`] when `doc` is out of range.
    pub fn doc_tokens<R: Rng + ?Sized>(
        &mut self,
        doc: usize,
        rng: &mut R,
    ) -> Result<&[usize], CorpusError> {
        if doc >= self.num_docs() {
            return Err(CorpusError::UnknownDocument {
                index: doc,
                num_docs: self.num_docs(),
            });
        }
        let orig = self.orig_vocab_size;
        let docwords = &self.docwords;
        let tokens = self.tokens.entry(doc).or_insert_with(|| {
            let mut tokens = Vec::new();
            for (row, count) in docwords.column(doc) {
                if row < orig {
                    tokens.extend(std::iter::repeat_n(row, token_repeats(count)));
                }
            }
            tokens.shuffle(rng);
            tokens
        });
        Ok(tokens.as_slice())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn token_repeats(count: f64) -> usize {
    count.round().max(0.0) as usize
}

fn check_labels_are_ordered(
    labels: &LabelMap,
    class_order: &ClassOrder,
) -> Result<(), CorpusError> {
    if let Some(label) = labels.values().find(|label| !class_order.contains(label)) {
        return Err(CorpusError::InvalidClassOrder(format!(
            "label '{label}' has no class index"
        )));
    }
    Ok(())
}
