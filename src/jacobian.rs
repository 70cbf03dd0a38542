use faer_core::sparse::SparseColMatRef;
use faer_core::Mat;

use crate::pattern::{JacobianPattern, PatternError};

/// Estimated or analytic derivative of `f: R^n -> R^m`.
#[derive(Debug, Clone)]
pub enum Jacobian {
    /// `m == 1`: the gradient, length `n`.
    Gradient(Vec<f64>),
    /// Dense `m x n` matrix. `n == 1` stays a single column.
    Dense(Mat<f64>),
    /// Values on a fixed sparsity pattern.
    Sparse(SparseJacobian),
}

impl Jacobian {
    pub fn nrows(&self) -> usize {
        match self {
            Self::Gradient(_) => 1,
            Self::Dense(mat) => mat.nrows(),
            Self::Sparse(jac) => jac.pattern().nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Self::Gradient(grad) => grad.len(),
            Self::Dense(mat) => mat.ncols(),
            Self::Sparse(jac) => jac.pattern().ncols(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Entry `(row, col)`; structural zeros of a sparse Jacobian read as `0.0`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Self::Gradient(grad) => {
                assert!(row == 0, "row {row} out of range for a gradient");
                grad[col]
            }
            Self::Dense(mat) => mat.read(row, col),
            Self::Sparse(jac) => jac.get(row, col),
        }
    }

    /// Dense `m x n` copy; a gradient becomes a single row.
    pub fn to_dense(&self) -> Mat<f64> {
        match self {
            Self::Gradient(grad) => Mat::from_fn(1, grad.len(), |_, j| grad[j]),
            Self::Dense(mat) => mat.clone(),
            Self::Sparse(jac) => jac.to_dense(),
        }
    }

    pub fn as_gradient(&self) -> Option<&[f64]> {
        match self {
            Self::Gradient(grad) => Some(grad),
            _ => None,
        }
    }

    pub fn as_dense(&self) -> Option<&Mat<f64>> {
        match self {
            Self::Dense(mat) => Some(mat),
            _ => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseJacobian> {
        match self {
            Self::Sparse(jac) => Some(jac),
            _ => None,
        }
    }
}

impl From<SparseJacobian> for Jacobian {
    fn from(jac: SparseJacobian) -> Self {
        Self::Sparse(jac)
    }
}

impl From<Mat<f64>> for Jacobian {
    fn from(mat: Mat<f64>) -> Self {
        Self::Dense(mat)
    }
}

/// Jacobian values stored in column order alongside their pattern.
#[derive(Debug, Clone)]
pub struct SparseJacobian {
    pattern: JacobianPattern,
    values: Vec<f64>,
}

impl SparseJacobian {
    /// `values` must have one entry per structural non-zero, in CSC order.
    pub fn new(pattern: JacobianPattern, values: Vec<f64>) -> Result<Self, PatternError> {
        if values.len() != pattern.nnz() {
            return Err(PatternError::ValuesLen {
                expected: pattern.nnz(),
                actual: values.len(),
            });
        }
        Ok(Self { pattern, values })
    }

    pub fn zeros(pattern: JacobianPattern) -> Self {
        let values = vec![0.0; pattern.nnz()];
        Self { pattern, values }
    }

    /// Builds the pattern and values from zero-based `(row, col, value)`
    /// entries. Repeated positions are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        entries: &[(usize, usize, f64)],
    ) -> Result<Self, PatternError> {
        let positions: Vec<(usize, usize)> =
            entries.iter().map(|&(row, col, _)| (row, col)).collect();
        let pattern = JacobianPattern::from_triplets(nrows, ncols, &positions)?;
        let mut jac = Self::zeros(pattern);
        for &(row, col, value) in entries {
            if let Some(pos) = jac.pattern.position(row, col) {
                jac.values[pos] += value;
            }
        }
        Ok(jac)
    }

    pub fn pattern(&self) -> &JacobianPattern {
        &self.pattern
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Values of the given column, aligned with `row_indices_of_col`.
    pub fn values_of_col(&self, col: usize) -> &[f64] {
        &self.values[self.pattern.col_range(col)]
    }

    /// Mutable values of the given column, aligned with `row_indices_of_col`.
    pub fn values_of_col_mut(&mut self, col: usize) -> &mut [f64] {
        let range = self.pattern.col_range(col);
        &mut self.values[range]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .position(row, col)
            .map_or(0.0, |pos| self.values[pos])
    }

    /// `(row, col, value)` for every structural entry, column by column.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.pattern.ncols()).flat_map(move |col| {
            self.pattern
                .row_indices_of_col(col)
                .iter()
                .zip(self.values_of_col(col))
                .map(move |(&row, &value)| (row, col, value))
        })
    }

    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::<f64>::zeros(self.pattern.nrows(), self.pattern.ncols());
        for (row, col, value) in self.triplets() {
            dense.write(row, col, value);
        }
        dense
    }

    /// Borrowed faer view for use with faer's sparse routines.
    pub fn as_faer(&self) -> SparseColMatRef<'_, usize, f64> {
        SparseColMatRef::<'_, usize, f64>::new(self.pattern.as_symbolic(), self.values.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_get_and_dense() {
        let jac =
            SparseJacobian::from_triplets(2, 3, &[(1, 2, 4.0), (0, 0, 1.0), (1, 2, 0.5)]).unwrap();
        assert_eq!(jac.pattern().nnz(), 2);
        assert_eq!(jac.get(1, 2), 4.5);
        assert_eq!(jac.get(0, 1), 0.0);
        let dense = jac.to_dense();
        assert_eq!(dense.read(0, 0), 1.0);
        assert_eq!(dense.read(1, 2), 4.5);
        assert_eq!(dense.read(1, 0), 0.0);
        let view = jac.as_faer();
        assert_eq!(view.nrows(), 2);
        assert_eq!(view.ncols(), 3);
    }

    #[test]
    fn values_must_match_nnz() {
        let pattern = JacobianPattern::full(2, 2);
        let err = SparseJacobian::new(pattern.clone(), vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, PatternError::ValuesLen { expected: 4, actual: 3 }));

        let mut jac = SparseJacobian::zeros(pattern);
        jac.values_mut()[3] = 7.0;
        assert_eq!(jac.get(1, 1), 7.0);
        assert_eq!(jac.values_of_col(1), &[0.0, 7.0]);
    }

    #[test]
    fn gradient_reads_as_row() {
        let jac = Jacobian::Gradient(vec![1.0, 2.0, 3.0]);
        assert_eq!(jac.shape(), (1, 3));
        assert_eq!(jac.get(0, 2), 3.0);
        let dense = jac.to_dense();
        assert_eq!(dense.nrows(), 1);
        assert_eq!(dense.read(0, 1), 2.0);
    }
}
