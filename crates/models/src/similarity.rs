//! Dense pairwise cosine similarity.
//!
//! Rows of a [`CsrMatrix`] are compared through column postings, so each
//! row only touches the rows it actually shares a column with. Rows are
//! filled in parallel with Rayon; the upper triangle is then mirrored
//! into the lower one so the result is exactly symmetric.

use crate::sparse::CsrMatrix;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView1, Axis};

/// Square similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Array2<f32>,
}

impl SimilarityMatrix {
    /// All-zero `n x n` matrix
    pub fn zeros(n: usize) -> Self {
        Self {
            values: Array2::zeros((n, n)),
        }
    }

    /// Cosine similarity between every pair of rows.
    ///
    /// Rows with a zero norm get similarity 0 with everything. Values are
    /// clamped into [-1, 1] to absorb floating-point overshoot.
    pub fn cosine(matrix: &CsrMatrix) -> Self {
        let n = matrix.n_rows();
        let mut values = Array2::<f32>::zeros((n, n));
        if n == 0 {
            return Self { values };
        }

        let norms: Vec<f32> = (0..n).map(|row| matrix.row_norm(row)).collect();
        let postings = matrix.column_postings();

        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut dots)| {
                if norms[i] == 0.0 {
                    return;
                }
                for (col, value) in matrix.row_iter(i) {
                    for &(j, other) in &postings[col] {
                        dots[j] += value * other;
                    }
                }
                for (j, dot) in dots.iter_mut().enumerate() {
                    *dot = if norms[j] == 0.0 {
                        0.0
                    } else {
                        (*dot / (norms[i] * norms[j])).clamp(-1.0, 1.0)
                    };
                }
            });

        // Mirror the upper triangle
        for i in 0..n {
            for j in (i + 1)..n {
                values[[j, i]] = values[[i, j]];
            }
        }

        Self { values }
    }

    /// Side length
    pub fn n(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[[i, j]]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.values.row(i)
    }

    /// Underlying dense array
    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn zero_diagonal(&mut self) {
        self.values.diag_mut().fill(0.0);
    }

    /// Clear every similarity involving `i`
    pub fn zero_row_and_column(&mut self, i: usize) {
        self.values.row_mut(i).fill(0.0);
        self.values.column_mut(i).fill(0.0);
    }

    /// True when `get(i, j) == get(j, i)` for every pair
    pub fn is_symmetric(&self) -> bool {
        self.values == self.values.t()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CsrMatrix {
        CsrMatrix::from_rows(
            3,
            vec![
                vec![(0, 1.0), (1, 1.0)],
                vec![(0, 1.0), (1, 1.0)],
                vec![(2, 1.0)],
                vec![(0, 1.0), (1, -1.0)],
                vec![],
            ],
        )
    }

    #[test]
    fn test_identical_rows_have_similarity_one() {
        let sim = SimilarityMatrix::cosine(&matrix());
        assert!((sim.get(0, 1) - 1.0).abs() < 1e-6);
        assert_eq!(sim.get(0, 2), 0.0);
    }

    #[test]
    fn test_orthogonal_and_negative() {
        let sim = SimilarityMatrix::cosine(&matrix());
        assert!(sim.get(0, 3).abs() < 1e-6);
        assert!(sim.get(3, 3) > 0.99);
    }

    #[test]
    fn test_empty_row_is_zero() {
        let sim = SimilarityMatrix::cosine(&matrix());
        assert!(sim.row(4).iter().all(|&v| v == 0.0));
        assert!((0..5).all(|i| sim.get(i, 4) == 0.0));
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let sim = SimilarityMatrix::cosine(&matrix());
        assert!(sim.is_symmetric());
        assert_eq!(sim.as_array().dim(), (5, 5));
        assert!(sim.as_array().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_zero_diagonal_and_row_column() {
        let mut sim = SimilarityMatrix::cosine(&matrix());
        sim.zero_diagonal();
        assert!(sim.as_array().diag().iter().all(|&v| v == 0.0));

        sim.zero_row_and_column(0);
        assert_eq!(sim.get(0, 1), 0.0);
        assert_eq!(sim.get(1, 0), 0.0);
        assert!(sim.row(0).iter().all(|&v| v == 0.0));
        assert!(sim.is_symmetric());
    }

    #[test]
    fn test_zeros_and_empty() {
        assert_eq!(SimilarityMatrix::zeros(3).n(), 3);
        assert!(SimilarityMatrix::zeros(3).is_symmetric());
        assert_eq!(SimilarityMatrix::cosine(&CsrMatrix::empty(0, 4)).n(), 0);
    }
}
