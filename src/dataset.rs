//! Labeled dataset handed to topic inference: one corpus, a labeling strategy
//! and a co-occurrence strategy, fixed at construction.

use ndarray::Array2;
use rand::Rng;
use tracing::debug;

use crate::config::Settings;
use crate::cooccurrence::{self, DeltaState, SupervisedAnchorAugmenter};
use crate::corpus::{BaseCorpus, ClassifiedCorpus, CorpusError, DocWords, Metadata};
use crate::labeling::{ClassOrder, LabelMap};

/// How `label_document` changes the corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelingStrategy {
    /// Labels are fixed at construction.
    Static,
    /// Labels are written into class pseudo-rows: a new class rebuilds the
    /// matrix, a known class patches one column.
    PseudoRows(Settings),
    /// Only the label map and class order are updated.
    LabelMapOnly,
}

/// How Q is derived from the corpus.
#[derive(Debug, Clone)]
pub enum CooccurrenceStrategy {
    /// Recompute from scratch on every access after a change.
    Full,
    /// Patch a cached Q with the contribution of relabeled documents.
    Delta(DeltaState),
    /// Precomputed unsupervised Q plus per-class tally columns.
    Augmented(SupervisedAnchorAugmenter),
}

/// Classified corpus together with its labeling and co-occurrence strategies.
///
/// Not meant to be shared between threads while labeling; every mutating
/// operation takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ClassifiedDataset {
    corpus: ClassifiedCorpus,
    labeling: LabelingStrategy,
    cooccurrence: CooccurrenceStrategy,
    // Q of the full and augmented strategies; the delta strategy keeps its own
    cooccurrences: Option<Array2<f64>>,
}

impl ClassifiedDataset {
    /// Fully supervised corpus with binary class indicators and full Q.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidClassOrder`] when a label has no index
    /// in `class_order`.
    pub fn batch(
        base: BaseCorpus,
        labels: LabelMap,
        class_order: ClassOrder,
    ) -> Result<Self, CorpusError> {
        Ok(Self::assemble(
            ClassifiedCorpus::batch(base, labels, class_order)?,
            LabelingStrategy::Static,
            CooccurrenceStrategy::Full,
        ))
    }

    /// Online labeling with full recomputation of Q.
    #[must_use]
    pub fn incremental(base: BaseCorpus, settings: &Settings) -> Self {
        Self::assemble(
            ClassifiedCorpus::incremental(base),
            LabelingStrategy::PseudoRows(*settings),
            CooccurrenceStrategy::Full,
        )
    }

    /// Online labeling with delta updates of a cached Q.
    #[must_use]
    pub fn quick_incremental(base: BaseCorpus, settings: &Settings) -> Self {
        Self::assemble(
            ClassifiedCorpus::incremental(base),
            LabelingStrategy::PseudoRows(*settings),
            CooccurrenceStrategy::Delta(DeltaState::new()),
        )
    }

    /// Static supervised anchor words.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidClassOrder`] when a label has no index
    /// in `class_order`.
    pub fn supervised_anchor(
        base: BaseCorpus,
        labels: LabelMap,
        class_order: ClassOrder,
    ) -> Result<Self, CorpusError> {
        let corpus = ClassifiedCorpus::plain(base, labels, class_order)?;
        let augmenter = SupervisedAnchorAugmenter::new(&corpus);
        Ok(Self::assemble(
            corpus,
            LabelingStrategy::Static,
            CooccurrenceStrategy::Augmented(augmenter),
        ))
    }

    /// Supervised anchor words with labels arriving online.
    #[must_use]
    pub fn incremental_supervised_anchor(base: BaseCorpus) -> Self {
        let corpus = ClassifiedCorpus::incremental(base);
        let augmenter = SupervisedAnchorAugmenter::new(&corpus);
        Self::assemble(
            corpus,
            LabelingStrategy::LabelMapOnly,
            CooccurrenceStrategy::Augmented(augmenter),
        )
    }

    fn assemble(
        corpus: ClassifiedCorpus,
        labeling: LabelingStrategy,
        cooccurrence: CooccurrenceStrategy,
    ) -> Self {
        Self {
            corpus,
            labeling,
            cooccurrence,
            cooccurrences: None,
        }
    }

    /// Labels the document called `title`, overwriting any previous label.
    ///
    /// With pseudo-row labeling, a label that introduces a new class rebuilds
    /// the document-word matrix; otherwise only the document's column changes.
    /// Under the delta strategy that column change is deferred to the next
    /// [`compute_cooccurrences`](Self::compute_cooccurrences). Any cached Q
    /// is invalidated.
    ///
    /// # Errors
    /// Returns [`CorpusError::StaticLabels`] for batch datasets and
    /// [`CorpusError::UnknownTitle`] when no document has this title. Neither
    /// changes any state.
    pub fn label_document(&mut self, title: &str, label: &str) -> Result<(), CorpusError> {
        let settings = match self.labeling {
            LabelingStrategy::Static => return Err(CorpusError::StaticLabels),
            LabelingStrategy::PseudoRows(settings) => Some(settings),
            LabelingStrategy::LabelMapOnly => None,
        };
        let update = self.corpus.assign_label(title, label)?;
        debug!(
            title,
            label,
            class = update.class,
            new_class = update.new_class,
            "document labeled"
        );

        if let Some(settings) = settings {
            if update.new_class {
                self.corpus.push_class_token(label);
                self.corpus.rebuild_pseudo_rows(&settings);
                if let CooccurrenceStrategy::Delta(state) = &mut self.cooccurrence {
                    state.discard();
                }
            } else if let CooccurrenceStrategy::Delta(state) = &mut self.cooccurrence {
                state.queue(update.doc);
            } else {
                self.corpus.patch_columns([update.doc], &settings);
            }
        }

        self.cooccurrences = None;
        Ok(())
    }

    /// Brings Q up to date with the current labels and borrows it. The full
    /// and augmented strategies recompute from scratch; the delta strategy
    /// folds in pending relabels.
    pub fn compute_cooccurrences(&mut self) -> &Array2<f64> {
        self.cooccurrences = None;
        self.cooccurrences()
    }

    /// Q, computing it first if a label changed since the last computation.
    pub fn cooccurrences(&mut self) -> &Array2<f64> {
        let settings = self.pseudo_row_settings();
        match &mut self.cooccurrence {
            CooccurrenceStrategy::Full => &*self.cooccurrences.get_or_insert_with(|| {
                cooccurrence::full(self.corpus.docwords(), self.corpus.orig_vocab_size())
            }),
            CooccurrenceStrategy::Delta(state) => state.refresh(&mut self.corpus, &settings),
            CooccurrenceStrategy::Augmented(augmenter) => {
                &*self.cooccurrences.get_or_insert_with(|| augmenter.augment(&self.corpus))
            }
        }
    }

    /// Q as last computed, or `None` after a label change.
    #[must_use]
    pub fn cached_cooccurrences(&self) -> Option<&Array2<f64>> {
        match &self.cooccurrence {
            CooccurrenceStrategy::Delta(state) => state.current(),
            CooccurrenceStrategy::Full | CooccurrenceStrategy::Augmented(_) => {
                self.cooccurrences.as_ref()
            }
        }
    }

    /// Settings used to resolve pseudo-rows; delta updates only run with
    /// pseudo-row labeling.
    fn pseudo_row_settings(&self) -> Settings {
        match self.labeling {
            LabelingStrategy::PseudoRows(settings) => settings,
            LabelingStrategy::Static | LabelingStrategy::LabelMapOnly => Settings::default(),
        }
    }

    /// Shuffled real-word tokens of document `doc`; see
    /// [`ClassifiedCorpus::doc_tokens`].
    ///
    /// # Errors
    /// Returns [`CorpusError::UnknownDocument`] when `doc` is out of range.
    pub fn doc_tokens<R: Rng + ?Sized>(
        &mut self,
        doc: usize,
        rng: &mut R,
    ) -> Result<&[usize], CorpusError> {
        self.corpus.doc_tokens(doc, rng)
    }

    #[must_use]
    pub fn corpus(&self) -> &ClassifiedCorpus {
        &self.corpus
    }

    #[must_use]
    pub fn labeling_strategy(&self) -> &LabelingStrategy {
        &self.labeling
    }

    #[must_use]
    pub fn cooccurrence_strategy(&self) -> &CooccurrenceStrategy {
        &self.cooccurrence
    }

    #[must_use]
    pub fn class_order(&self) -> &ClassOrder {
        self.corpus.class_order()
    }

    #[must_use]
    pub fn ordered_classes(&self) -> &[String] {
        self.corpus.ordered_classes()
    }

    #[must_use]
    pub fn labels(&self) -> &LabelMap {
        self.corpus.labels()
    }

    #[must_use]
    pub fn vocab(&self) -> &[String] {
        self.corpus.vocab()
    }

    #[must_use]
    pub fn orig_vocab_size(&self) -> usize {
        self.corpus.orig_vocab_size()
    }

    /// Document-word matrix. Under the delta strategy, columns of documents
    /// relabeled since the last computation still hold their old pseudo-rows.
    #[must_use]
    pub fn docwords(&self) -> &DocWords {
        self.corpus.docwords()
    }

    #[must_use]
    pub fn titles(&self) -> &[String] {
        self.corpus.titles()
    }

    #[must_use]
    pub fn metadata(&self) -> &[Metadata] {
        self.corpus.metadata()
    }

    #[must_use]
    pub fn num_docs(&self) -> usize {
        self.corpus.num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::LabelWeight;

    fn base() -> BaseCorpus {
        BaseCorpus::from_documents(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![(0, 2.0), (1, 1.0)],
                vec![(1, 1.0), (2, 2.0)],
                vec![(0, 1.0), (2, 1.0)],
            ],
            vec!["doc1".into(), "doc2".into(), "doc3".into()],
            Vec::new(),
        )
        .expect("valid corpus")
    }

    fn settings() -> Settings {
        Settings::new(0.5, LabelWeight::Fixed(2.0)).expect("valid settings")
    }

    #[test]
    fn batch_datasets_reject_label_changes() {
        let labels: LabelMap = [("doc1".to_string(), "A".to_string())].into_iter().collect();
        let order = ClassOrder::lexicographic(&labels);
        let mut dataset = ClassifiedDataset::batch(base(), labels, order).expect("valid batch");

        assert_eq!(dataset.label_document("doc2", "A"), Err(CorpusError::StaticLabels));
        assert_eq!(dataset.labels().len(), 1);
    }

    #[test]
    fn unknown_titles_leave_the_dataset_untouched() {
        let mut dataset = ClassifiedDataset::incremental(base(), &settings());
        dataset.compute_cooccurrences();

        let error = dataset.label_document("missing", "A").expect_err("unknown title");

        assert_eq!(error, CorpusError::UnknownTitle("missing".to_string()));
        assert!(dataset.class_order().is_empty());
        assert!(dataset.cached_cooccurrences().is_some());
    }

    #[test]
    fn labeling_invalidates_the_cached_matrix() {
        let mut dataset = ClassifiedDataset::incremental(base(), &settings());
        let before = dataset.cooccurrences().clone();
        assert_eq!(before.dim(), (3, 3));

        dataset.label_document("doc1", "A").expect("doc1 exists");
        assert!(dataset.cached_cooccurrences().is_none());
        assert_eq!(dataset.cooccurrences().dim(), (4, 4));
    }

    #[test]
    fn patch_path_moves_the_pseudo_row_weight() {
        let mut dataset = ClassifiedDataset::incremental(base(), &settings());
        dataset.label_document("doc1", "A").expect("doc1 exists");
        dataset.label_document("doc2", "B").expect("doc2 exists");
        dataset.label_document("doc1", "B").expect("doc1 exists");

        let docwords = dataset.docwords();
        assert!(docwords.get(3, 0).abs() < f64::EPSILON);
        assert!((docwords.get(4, 0) - 2.0).abs() < f64::EPSILON);
        assert!((docwords.get(3, 2) - 0.5).abs() < f64::EPSILON);
        assert!((docwords.get(4, 2) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn delta_matrix_is_borrowed_from_the_delta_state() {
        let mut dataset = ClassifiedDataset::quick_incremental(base(), &settings());
        dataset.label_document("doc1", "A").expect("doc1 exists");
        dataset.label_document("doc2", "A").expect("doc2 exists");
        let q: *const Array2<f64> = dataset.compute_cooccurrences();

        assert!(dataset.cooccurrences.is_none());
        let CooccurrenceStrategy::Delta(state) = dataset.cooccurrence_strategy() else {
            panic!("quick incremental datasets use delta updates");
        };
        assert!(state.current().is_some_and(|cached| std::ptr::eq(cached, q)));

        dataset.label_document("doc3", "A").expect("doc3 exists");
        assert!(dataset.cached_cooccurrences().is_none());
        dataset.compute_cooccurrences();
        assert!(dataset.cached_cooccurrences().is_some());
    }

    #[test]
    fn label_map_only_never_touches_the_matrix() {
        let mut dataset = ClassifiedDataset::incremental_supervised_anchor(base());
        let nnz = dataset.docwords().nnz();

        dataset.label_document("doc1", "A").expect("doc1 exists");
        dataset.label_document("doc3", "B").expect("doc3 exists");

        assert_eq!(dataset.docwords().nnz(), nnz);
        assert_eq!(dataset.vocab().len(), 3);
        assert_eq!(dataset.cooccurrences().dim(), (3, 5));
    }
}
