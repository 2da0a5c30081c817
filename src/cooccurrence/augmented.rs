//! Supervised anchor words: the unsupervised Q with one extra column per class
//! holding, for each word, the label distribution of the labeled documents
//! that contain it.

use ndarray::{Array2, s};
use tracing::info;

use crate::corpus::ClassifiedCorpus;

/// Holds the unsupervised Q computed once, before any label arrives.
#[derive(Debug, Clone)]
pub struct SupervisedAnchorAugmenter {
    base_q: Array2<f64>,
}

impl SupervisedAnchorAugmenter {
    /// Precomputes the unsupervised Q of `corpus`. The document-word matrix of
    /// a corpus used with this strategy must not carry pseudo-rows.
    #[must_use]
    pub fn new(corpus: &ClassifiedCorpus) -> Self {
        debug_assert_eq!(corpus.vocab_size(), corpus.orig_vocab_size());
        Self {
            base_q: super::full(corpus.docwords(), corpus.orig_vocab_size()),
        }
    }

    /// The precomputed `V x V` matrix.
    #[must_use]
    pub fn base(&self) -> &Array2<f64> {
        &self.base_q
    }

    /// Base Q with `K` class columns appended, `V x (V + K)`.
    ///
    /// Entry `(i, V + c)` is the share of labeled documents containing word
    /// `i` whose label is class `c`. Words that no labeled document contains
    /// get zeros.
    #[must_use]
    pub fn augment(&self, corpus: &ClassifiedCorpus) -> Array2<f64> {
        let (rows, width) = self.base_q.dim();
        let classes = corpus.class_order().len();
        let mut q = Array2::<f64>::zeros((rows, width + classes));
        q.slice_mut(s![.., ..width]).assign(&self.base_q);
        if classes == 0 {
            return q;
        }

        let mut totals = vec![0usize; rows];
        for doc in 0..corpus.num_docs() {
            let Some(class) = corpus.class_of(doc) else {
                continue;
            };
            for (word, count) in corpus.docwords().column(doc) {
                if word < rows && count > 0.0 {
                    q[[word, width + class]] += 1.0;
                    totals[word] += 1;
                }
            }
        }

        for (word, &total) in totals.iter().enumerate() {
            if total > 0 {
                #[allow(clippy::cast_precision_loss)]
                let scale = 1.0 / total as f64;
                q.slice_mut(s![word, width..]).mapv_inplace(|tally| tally * scale);
            }
        }

        info!(
            vocab_size = rows,
            classes,
            labeled = corpus.labels().len(),
            "supervised anchor columns recomputed"
        );
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::BaseCorpus;
    use crate::labeling::{ClassOrder, LabelMap};

    fn corpus(labels: &[(&str, &str)]) -> ClassifiedCorpus {
        let base = BaseCorpus::from_documents(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![(0, 2.0), (1, 1.0)],
                vec![(0, 1.0), (2, 1.0)],
                vec![(0, 1.0), (1, 3.0)],
                vec![(2, 2.0)],
            ],
            vec!["d0".into(), "d1".into(), "d2".into(), "d3".into()],
            Vec::new(),
        )
        .expect("valid corpus");
        let labels: LabelMap = labels
            .iter()
            .map(|(title, label)| ((*title).to_string(), (*label).to_string()))
            .collect();
        let order = ClassOrder::lexicographic(&labels);
        ClassifiedCorpus::plain(base, labels, order).expect("valid labels")
    }

    #[test]
    fn appends_normalized_class_tallies() {
        let corpus = corpus(&[("d0", "neg"), ("d1", "pos"), ("d2", "pos")]);
        let augmenter = SupervisedAnchorAugmenter::new(&corpus);
        let q = augmenter.augment(&corpus);

        assert_eq!(q.dim(), (3, 5));
        assert_eq!(q.slice(s![.., ..3]), augmenter.base().view());
        // word a: d0 (neg), d1 (pos), d2 (pos)
        assert!((q[[0, 3]] - 1.0 / 3.0).abs() < 1e-12);
        assert!((q[[0, 4]] - 2.0 / 3.0).abs() < 1e-12);
        // word c: d1 (pos) only, d3 is unlabeled
        assert!(q[[2, 3]].abs() < f64::EPSILON);
        assert!((q[[2, 4]] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn words_without_labeled_documents_get_zero_columns() {
        let corpus = corpus(&[("d3", "only")]);
        let q = SupervisedAnchorAugmenter::new(&corpus).augment(&corpus);

        assert_eq!(q.dim(), (3, 4));
        assert!(q[[0, 3]].abs() < f64::EPSILON);
        assert!((q[[2, 3]] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_classes_leaves_the_base_matrix() {
        let corpus = corpus(&[]);
        let augmenter = SupervisedAnchorAugmenter::new(&corpus);
        assert_eq!(&augmenter.augment(&corpus), augmenter.base());
    }
}
