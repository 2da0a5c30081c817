//! Column-compressed document-word matrix: one column per document, one row
//! per vocabulary entry.

use std::collections::BTreeMap;
use std::ops::Range;

use sprs::CsMat;

use super::CorpusError;

/// Sparse `vocab_size x num_docs` count matrix.
///
/// Entries are non-negative and explicit zeros are never stored.
#[derive(Debug, Clone)]
pub struct DocWords {
    matrix: CsMat<f64>,
}

impl DocWords {
    /// Builds the matrix from per-document `(row, value)` lists. Each list must
    /// be sorted by row without repeats.
    pub(crate) fn from_columns(rows: usize, columns: &[Vec<(usize, f64)>]) -> Self {
        let mut indptr = Vec::with_capacity(columns.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for column in columns {
            debug_assert!(column.windows(2).all(|pair| pair[0].0 < pair[1].0));
            for &(row, value) in column {
                if value != 0.0 {
                    indices.push(row);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            matrix: CsMat::new_csc((rows, columns.len()), indptr, indices, data),
        }
    }

    /// Wraps an existing CSC matrix.
    ///
    /// # Errors
    /// Returns [`CorpusError::NotColumnMajor`] for a CSR matrix and
    /// [`CorpusError::InvalidCount`] for negative or non-finite entries.
    pub fn from_csc(matrix: CsMat<f64>) -> Result<Self, CorpusError> {
        if !matrix.is_csc() {
            return Err(CorpusError::NotColumnMajor);
        }
        for (&value, (row, col)) in matrix.iter() {
            if value.is_sign_negative() || !value.is_finite() {
                return Err(CorpusError::InvalidCount {
                    row,
                    col,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self { matrix })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    #[must_use]
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    #[must_use]
    pub fn as_csmat(&self) -> &CsMat<f64> {
        &self.matrix
    }

    /// Stored value at `(row, col)`, zero when absent.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col).copied().unwrap_or(0.0)
    }

    /// Non-zero `(row, value)` pairs of one document, sorted by row.
    #[must_use]
    pub fn column(&self, col: usize) -> Vec<(usize, f64)> {
        self.matrix
            .outer_view(col)
            .map(|view| view.iter().map(|(row, &value)| (row, value)).collect())
            .unwrap_or_default()
    }

    /// Sum of the entries of `col` whose row is below `row_limit`.
    #[must_use]
    pub fn column_sum_below(&self, col: usize, row_limit: usize) -> f64 {
        self.matrix
            .outer_view(col)
            .map(|view| {
                view.iter()
                    .filter(|(row, _)| *row < row_limit)
                    .map(|(_, &value)| value)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Replaces the listed columns, keeping every other column untouched.
    ///
    /// Untouched runs of columns are copied in bulk and only the replaced
    /// columns are re-encoded. Keys past the last column are ignored.
    pub(crate) fn replace_columns(&mut self, replacements: &BTreeMap<usize, Vec<(usize, f64)>>) {
        let cols = self.cols();
        if replacements.range(..cols).next().is_none() {
            return;
        }
        let added: usize = replacements.values().map(Vec::len).sum();
        let mut indptr = Vec::with_capacity(cols + 1);
        let mut indices = Vec::with_capacity(self.nnz() + added);
        let mut data = Vec::with_capacity(self.nnz() + added);
        indptr.push(0);

        let mut next = 0;
        for (&col, column) in replacements.range(..cols) {
            self.copy_columns(next..col, &mut indptr, &mut indices, &mut data);
            debug_assert!(column.windows(2).all(|pair| pair[0].0 < pair[1].0));
            for &(row, value) in column {
                if value != 0.0 {
                    indices.push(row);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
            next = col + 1;
        }
        self.copy_columns(next..cols, &mut indptr, &mut indices, &mut data);

        self.matrix = CsMat::new_csc((self.rows(), cols), indptr, indices, data);
    }

    /// Appends the stored entries of `range` and their column offsets.
    fn copy_columns(
        &self,
        range: Range<usize>,
        indptr: &mut Vec<usize>,
        indices: &mut Vec<usize>,
        data: &mut Vec<f64>,
    ) {
        if range.is_empty() {
            return;
        }
        let outer = self.matrix.indptr();
        let start = outer.outer_inds_sz(range.start).start;
        let end = outer.outer_inds_sz(range.end - 1).end;
        let base = indices.len();
        indices.extend_from_slice(&self.matrix.indices()[start..end]);
        data.extend_from_slice(&self.matrix.data()[start..end]);
        indptr.extend(range.map(|col| base + outer.outer_inds_sz(col).end - start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocWords {
        DocWords::from_columns(
            4,
            &[vec![(0, 2.0), (3, 1.0)], vec![], vec![(1, 1.0), (2, 0.0), (3, 4.0)]],
        )
    }

    #[test]
    fn from_columns_skips_explicit_zeros() {
        let docwords = sample();
        assert_eq!(docwords.rows(), 4);
        assert_eq!(docwords.cols(), 3);
        assert_eq!(docwords.nnz(), 4);
        assert_eq!(docwords.column(2), vec![(1, 1.0), (3, 4.0)]);
        assert!(docwords.column(1).is_empty());
    }

    #[test]
    fn column_sum_below_ignores_rows_past_the_limit() {
        let docwords = sample();
        assert!((docwords.column_sum_below(0, 3) - 2.0).abs() < f64::EPSILON);
        assert!((docwords.column_sum_below(2, 4) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn replace_columns_patches_only_the_requested_documents() {
        let mut docwords = sample();
        let replacements: BTreeMap<usize, Vec<(usize, f64)>> =
            [(1, vec![(2, 7.0)])].into_iter().collect();

        docwords.replace_columns(&replacements);

        assert_eq!(docwords.column(0), vec![(0, 2.0), (3, 1.0)]);
        assert_eq!(docwords.column(1), vec![(2, 7.0)]);
        assert!((docwords.get(3, 2) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn replace_columns_splices_first_middle_and_last_columns() {
        let columns = vec![
            vec![(0, 1.0), (2, 2.0)],
            vec![(1, 3.0)],
            vec![],
            vec![(0, 4.0), (1, 5.0), (3, 6.0)],
            vec![(2, 7.0)],
        ];
        let mut docwords = DocWords::from_columns(4, &columns);
        let replacements: BTreeMap<usize, Vec<(usize, f64)>> = [
            (0, vec![(3, 8.0)]),
            (2, vec![(0, 9.0), (1, 0.0), (2, 1.5)]),
            (4, vec![]),
            (9, vec![(0, 1.0)]),
        ]
        .into_iter()
        .collect();

        docwords.replace_columns(&replacements);

        let mut expected = columns;
        expected[0] = vec![(3, 8.0)];
        expected[2] = vec![(0, 9.0), (2, 1.5)];
        expected[4] = vec![];
        assert_eq!(docwords.cols(), 5);
        assert_eq!(docwords.nnz(), 7);
        for (col, column) in expected.iter().enumerate() {
            assert_eq!(&docwords.column(col), column, "column {col}");
        }
    }

    #[test]
    fn from_csc_rejects_row_major_and_negative_input() {
        let csr = CsMat::new((1, 1), vec![0, 1], vec![0], vec![1.0]);
        assert!(matches!(DocWords::from_csc(csr), Err(CorpusError::NotColumnMajor)));

        let negative = CsMat::new_csc((1, 1), vec![0, 1], vec![0], vec![-1.0]);
        assert!(matches!(
            DocWords::from_csc(negative),
            Err(CorpusError::InvalidCount { row: 0, col: 0, .. })
        ));
    }
}
