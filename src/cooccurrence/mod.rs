//! Word-by-word co-occurrence matrix (Q) construction.
//!
//! Each document `d` with real-word token count `n_d >= 2` contributes
//! `(h_d h_dᵀ - diag(h_d)) / (n_d (n_d - 1))`, where `h_d` is its column of the
//! document-word matrix. Q is the sum of contributions divided by the number
//! of documents. Full recomputation and the per-document delta updates both go
//! through [`contribution`], so they apply the same diagonal correction.

pub mod augmented;
pub mod delta;

use ndarray::Array2;
use sprs::CsMat;
use tracing::debug;

use crate::corpus::DocWords;

pub use augmented::SupervisedAnchorAugmenter;
pub use delta::DeltaState;

/// Q over every document of `docwords`, computed from scratch.
///
/// `real_rows` is the number of leading rows holding real words; only those
/// count towards a document's length.
#[must_use]
pub fn full(docwords: &DocWords, real_rows: usize) -> Array2<f64> {
    let num_docs = docwords.cols();
    let docs: Vec<usize> = (0..num_docs).collect();
    let mut q = contribution(docwords, real_rows, &docs);
    if num_docs > 0 {
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / num_docs as f64;
        q.mapv_inplace(|value| value * scale);
    }
    debug!(
        vocab_size = docwords.rows(),
        num_docs,
        nnz = docwords.nnz(),
        "full co-occurrence pass"
    );
    q
}

/// Unscaled contribution ("mini-Q") of the documents in `docs`.
///
/// Dividing the result by the corpus document count gives exactly the share
/// those documents have in [`full`].
#[must_use]
pub fn contribution(docwords: &DocWords, real_rows: usize, docs: &[usize]) -> Array2<f64> {
    let vocab_size = docwords.rows();
    let mut q = Array2::<f64>::zeros((vocab_size, vocab_size));
    let (h_tilde, h_hat) = normalized_columns(docwords, real_rows, docs);
    if h_tilde.cols() > 0 {
        let gram = &h_tilde * &h_tilde.transpose_view();
        for (&value, (row, col)) in gram.iter() {
            q[[row, col]] += value;
        }
    }
    for (word, correction) in h_hat.into_iter().enumerate() {
        q[[word, word]] -= correction;
    }
    q
}

/// Compact sub-matrix of the selected documents, each column scaled by
/// `1 / sqrt(n (n - 1))`, plus the per-word diagonal correction
/// `sum_d value / (n (n - 1))`. Documents with fewer than two real tokens are
/// dropped.
fn normalized_columns(
    docwords: &DocWords,
    real_rows: usize,
    docs: &[usize],
) -> (CsMat<f64>, Vec<f64>) {
    let mut h_hat = vec![0.0; docwords.rows()];
    let mut indptr = vec![0];
    let mut indices = Vec::new();
    let mut data = Vec::new();

    for &doc in docs {
        let count = docwords.column_sum_below(doc, real_rows);
        if count < 2.0 {
            continue;
        }
        let norm = count * (count - 1.0);
        let sqrt_norm = norm.sqrt();
        for (row, value) in docwords.column(doc) {
            h_hat[row] += value / norm;
            indices.push(row);
            data.push(value / sqrt_norm);
        }
        indptr.push(indices.len());
    }

    let shape = (docwords.rows(), indptr.len() - 1);
    (CsMat::new_csc(shape, indptr, indices, data), h_hat)
}
