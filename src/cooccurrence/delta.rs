//! Incremental Q: keep the last full Q and patch it per relabeled document.

use std::collections::BTreeSet;

use ndarray::Array2;
use tracing::{debug, info};

use super::{contribution, full};
use crate::config::Settings;
use crate::corpus::ClassifiedCorpus;

/// Cached Q plus the documents relabeled since it was last brought up to date.
///
/// Pending documents already have their new label in the label map but still
/// carry their old pseudo-rows in the document-word matrix; [`refresh`]
/// applies them.
///
/// [`refresh`]: DeltaState::refresh
#[derive(Debug, Clone, Default)]
pub struct DeltaState {
    prev_q: Option<Array2<f64>>,
    pending: BTreeSet<usize>,
}

impl DeltaState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a document whose label changed within the existing classes.
    pub(crate) fn queue(&mut self, doc: usize) {
        self.pending.insert(doc);
    }

    /// Drops the cache after the vocabulary grew. The caller has rebuilt every
    /// column from the label map, so nothing stays pending.
    pub(crate) fn discard(&mut self) {
        self.prev_q = None;
        self.pending.clear();
    }

    #[must_use]
    pub fn has_cache(&self) -> bool {
        self.prev_q.is_some()
    }

    /// Cached Q when nothing is pending, i.e. when it reflects the corpus.
    #[must_use]
    pub fn current(&self) -> Option<&Array2<f64>> {
        if self.pending.is_empty() {
            self.prev_q.as_ref()
        } else {
            None
        }
    }

    /// Documents waiting to be folded into the cached Q.
    #[must_use]
    pub fn pending(&self) -> &BTreeSet<usize> {
        &self.pending
    }

    /// Brings the cached Q up to date with the corpus and borrows it.
    ///
    /// Without a cache this runs a full pass first. Pending documents are then
    /// handled by subtracting their contribution under the old pseudo-rows,
    /// patching their columns and adding the new contribution back.
    pub(crate) fn refresh(
        &mut self,
        corpus: &mut ClassifiedCorpus,
        settings: &Settings,
    ) -> &Array2<f64> {
        let real_rows = corpus.orig_vocab_size();
        let q = self.prev_q.get_or_insert_with(|| {
            info!(
                vocab_size = corpus.vocab_size(),
                num_docs = corpus.num_docs(),
                "no cached co-occurrences, running full pass"
            );
            full(corpus.docwords(), real_rows)
        });

        if !self.pending.is_empty() {
            let docs: Vec<usize> = std::mem::take(&mut self.pending).into_iter().collect();
            #[allow(clippy::cast_precision_loss)]
            let num_docs = corpus.num_docs() as f64;

            let before = contribution(corpus.docwords(), real_rows, &docs);
            q.scaled_add(-1.0 / num_docs, &before);

            corpus.patch_columns(docs.iter().copied(), settings);

            let after = contribution(corpus.docwords(), real_rows, &docs);
            q.scaled_add(1.0 / num_docs, &after);

            debug!(documents = docs.len(), "co-occurrences patched incrementally");
        }
        q
    }
}
