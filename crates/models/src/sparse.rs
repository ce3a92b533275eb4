//! Compressed sparse row matrix.
//!
//! Just enough of a CSR type for the two models: build once from
//! per-row entries, then read rows. Cells are never mutated after
//! construction.

/// Row-major compressed sparse matrix of `f32`.
///
/// Column indices within a row are strictly increasing. Explicitly stored
/// zeros are kept (they still count towards `row_nnz`).
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl CsrMatrix {
    /// All-empty matrix of the given shape.
    pub fn empty(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            indptr: vec![0; n_rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from one entry list per row.
    ///
    /// Each row is sorted by column; duplicate columns within a row must
    /// already be resolved by the caller. Columns `>= n_cols` are dropped.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f32)>>) -> Self {
        let n_rows = rows.len();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for mut row in rows {
            row.sort_unstable_by_key(|&(col, _)| col);
            row.dedup_by_key(|&mut (col, _)| col);
            for (col, value) in row {
                if col < n_cols {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored cells (explicit zeros included)
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Number of stored cells in one row
    pub fn row_nnz(&self, row: usize) -> usize {
        self.indptr[row + 1] - self.indptr[row]
    }

    /// Column indices and values of one row
    pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Iterate `(col, value)` pairs of one row
    pub fn row_iter(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (cols, values) = self.row(row);
        cols.iter().copied().zip(values.iter().copied())
    }

    /// Value at `(row, col)`, zero when not stored
    pub fn get(&self, row: usize, col: usize) -> f32 {
        let (cols, values) = self.row(row);
        cols.binary_search(&col).map(|pos| values[pos]).unwrap_or(0.0)
    }

    /// Euclidean norm of one row
    pub fn row_norm(&self, row: usize) -> f32 {
        let (_, values) = self.row(row);
        values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Column-major view: for every column, the `(row, value)` pairs stored in it.
    pub fn column_postings(&self) -> Vec<Vec<(usize, f32)>> {
        let mut postings = vec![Vec::new(); self.n_cols];
        for row in 0..self.n_rows {
            for (col, value) in self.row_iter(row) {
                postings[col].push((row, value));
            }
        }
        postings
    }

    /// Dense copy of one row
    pub fn dense_row(&self, row: usize) -> Vec<f32> {
        let mut dense = vec![0.0; self.n_cols];
        for (col, value) in self.row_iter(row) {
            dense[col] = value;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let m = CsrMatrix::from_rows(4, vec![vec![(2, 1.0), (0, 3.0)], vec![], vec![(3, -1.0)]]);

        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row_nnz(0), 2);
        assert_eq!(m.row_nnz(1), 0);
        assert_eq!(m.row(0).0, &[0, 2]);
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.get(2, 3), -1.0);
    }

    #[test]
    fn test_explicit_zero_is_stored() {
        let m = CsrMatrix::from_rows(2, vec![vec![(0, 0.0), (1, 1.0)]]);
        assert_eq!(m.row_nnz(0), 2);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_row_norm_and_postings() {
        let m = CsrMatrix::from_rows(2, vec![vec![(0, 3.0), (1, 4.0)], vec![(1, 2.0)]]);
        assert!((m.row_norm(0) - 5.0).abs() < 1e-6);

        let postings = m.column_postings();
        assert_eq!(postings[0], vec![(0, 3.0)]);
        assert_eq!(postings[1], vec![(0, 4.0), (1, 2.0)]);
        assert_eq!(m.dense_row(1), vec![0.0, 2.0]);
    }

    #[test]
    fn test_empty() {
        let m = CsrMatrix::empty(3, 0);
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.row_nnz(2), 0);
        assert_eq!(m.row_norm(1), 0.0);
    }
}
