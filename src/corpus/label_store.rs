//! Keeps the pseudo-rows of a [`ClassifiedCorpus`] in step with its label map.
//!
//! A label that introduces a new class grows the vocabulary by one
//! pseudo-token and forces a rebuild of the whole matrix. Any other label
//! only touches the column of the relabeled document.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{ClassifiedCorpus, CorpusError, DocWords};
use crate::config::Settings;

/// Outcome of recording a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LabelUpdate {
    pub(crate) doc: usize,
    pub(crate) class: usize,
    pub(crate) new_class: bool,
}

impl ClassifiedCorpus {
    /// Records `title -> label` in the label map and class order. The matrix
    /// is left as it is.
    pub(crate) fn assign_label(
        &mut self,
        title: &str,
        label: &str,
    ) -> Result<LabelUpdate, CorpusError> {
        let doc = self
            .doc_index(title)
            .ok_or_else(|| CorpusError::UnknownTitle(title.to_string()))?;
        self.labels.insert(title.to_string(), label.to_string());
        let (class, new_class) = self.class_order.insert(label);
        Ok(LabelUpdate {
            doc,
            class,
            new_class,
        })
    }

    /// Appends the pseudo-token of the newest class to the vocabulary.
    pub(crate) fn push_class_token(&mut self, label: &str) {
        debug_assert_eq!(self.vocab.len(), self.orig_vocab_size + self.class_order.len() - 1);
        self.vocab.push(label.to_string());
    }

    /// Rebuilds the matrix at the current vocabulary size: real rows are
    /// copied, every pseudo-row starts at the smoothing constant and every
    /// labeled document is then resolved.
    pub(crate) fn rebuild_pseudo_rows(&mut self, settings: &Settings) {
        let columns: Vec<Vec<(usize, f64)>> = (0..self.num_docs())
            .map(|doc| self.resolved_column(doc, settings))
            .collect();
        self.docwords = DocWords::from_columns(self.vocab.len(), &columns);
        info!(
            vocab_size = self.vocab.len(),
            classes = self.class_order.len(),
            labeled = self.labels.len(),
            nnz = self.docwords.nnz(),
            "document-word matrix rebuilt for new class"
        );
    }

    /// Re-resolves the pseudo-rows of `docs` from the label map.
    pub(crate) fn patch_columns<I>(&mut self, docs: I, settings: &Settings)
    where
        I: IntoIterator<Item = usize>,
    {
        let replacements: BTreeMap<usize, Vec<(usize, f64)>> = docs
            .into_iter()
            .map(|doc| (doc, self.resolved_column(doc, settings)))
            .collect();
        if replacements.is_empty() {
            return;
        }
        debug!(documents = replacements.len(), "patching document columns");
        self.docwords.replace_columns(&replacements);
    }

    /// Column of `doc` as the labeling rules say it should look: real rows
    /// unchanged, then either the label weight in the assigned class row or
    /// the smoothing constant across every pseudo-row.
    fn resolved_column(&self, doc: usize, settings: &Settings) -> Vec<(usize, f64)> {
        let orig = self.orig_vocab_size;
        let mut column: Vec<(usize, f64)> = self
            .docwords
            .column(doc)
            .into_iter()
            .filter(|&(row, _)| row < orig)
            .collect();

        match self.class_of(doc) {
            Some(class) => {
                let real_count: f64 = column.iter().map(|&(_, value)| value).sum();
                let weight = settings.label_weight().weight(real_count, self.num_docs());
                column.push((orig + class, weight));
            }
            None => {
                let smoothing = settings.smoothing();
                column.extend((0..self.class_order.len()).map(|class| (orig + class, smoothing)));
            }
        }
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::BaseCorpus;
    use crate::labeling::LabelWeight;

    fn corpus() -> ClassifiedCorpus {
        let base = BaseCorpus::from_documents(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![(0, 2.0), (1, 1.0)], vec![(2, 5.0)], vec![(1, 1.0)]],
            vec!["doc1".into(), "doc2".into(), "doc3".into()],
            Vec::new(),
        )
        .expect("valid corpus");
        ClassifiedCorpus::incremental(base)
    }

    fn settings() -> Settings {
        Settings::new(0.25, LabelWeight::ScaledByDocLength(2.0)).expect("valid settings")
    }

    #[test]
    fn assign_label_reports_new_and_existing_classes() {
        let mut corpus = corpus();
        let first = corpus.assign_label("doc1", "A").expect("doc1 exists");
        let second = corpus.assign_label("doc3", "A").expect("doc3 exists");

        assert_eq!(
            first,
            LabelUpdate {
                doc: 0,
                class: 0,
                new_class: true
            }
        );
        assert_eq!(
            second,
            LabelUpdate {
                doc: 2,
                class: 0,
                new_class: false
            }
        );
        assert_eq!(
            corpus.assign_label("nope", "A"),
            Err(CorpusError::UnknownTitle("nope".to_string()))
        );
        assert!(!corpus.labels().contains_key("nope"));
    }

    #[test]
    fn rebuild_smooths_unlabeled_and_weights_labeled_columns() {
        let mut corpus = corpus();
        let settings = settings();
        for (title, label) in [("doc1", "A"), ("doc2", "B")] {
            let update = corpus.assign_label(title, label).expect("title exists");
            assert!(update.new_class);
            corpus.push_class_token(label);
            corpus.rebuild_pseudo_rows(&settings);
        }

        assert_eq!(corpus.vocab(), &["a", "b", "c", "A", "B"]);
        // doc1: 3 real tokens, doc:2 weight
        assert_eq!(corpus.docwords().column(0), vec![(0, 2.0), (1, 1.0), (3, 6.0)]);
        assert_eq!(corpus.docwords().column(1), vec![(2, 5.0), (4, 10.0)]);
        assert_eq!(corpus.docwords().column(2), vec![(1, 1.0), (3, 0.25), (4, 0.25)]);
    }

    #[test]
    fn patch_moves_a_document_between_existing_classes() {
        let mut corpus = corpus();
        let settings = settings();
        for (title, label) in [("doc1", "A"), ("doc2", "B")] {
            corpus.assign_label(title, label).expect("title exists");
            corpus.push_class_token(label);
            corpus.rebuild_pseudo_rows(&settings);
        }

        let update = corpus.assign_label("doc1", "B").expect("doc1 exists");
        assert!(!update.new_class);
        corpus.patch_columns([update.doc], &settings);

        assert_eq!(corpus.docwords().column(0), vec![(0, 2.0), (1, 1.0), (4, 6.0)]);
        assert_eq!(corpus.docwords().column(1), vec![(2, 5.0), (4, 10.0)]);
    }
}
