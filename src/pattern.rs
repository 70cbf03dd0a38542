use core::fmt;
use core::ops::Range;

use faer_core::sparse::SymbolicSparseColMatRef;
use faer_core::Mat;

/// Which entries of an `m x n` Jacobian may be non-zero, stored column
/// compressed (CSC).
///
/// Rows are zero-based and strictly increasing within a column. Positions
/// absent from the pattern are never estimated and read back as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JacobianPattern {
    nrows: usize,
    ncols: usize,
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
}

/// Reasons a sparsity pattern or its values are rejected.
#[derive(Debug, Clone)]
pub enum PatternError {
    /// `col_ptrs` must hold `ncols + 1` offsets.
    ColPtrLen { expected: usize, actual: usize },
    /// The first column offset must be zero.
    ColPtrStart { value: usize },
    /// Column `col` ends before it starts.
    ColPtrNotMonotonic { col: usize, prev: usize, next: usize },
    /// The last offset disagrees with the number of row indices.
    ColPtrOutOfBounds { last: usize, row_indices_len: usize },
    RowIndexOutOfBounds { col: usize, row: usize, nrows: usize },
    /// Rows of column `col` are unsorted or repeated.
    RowIndexNotSorted { col: usize, prev: usize, next: usize },
    TripletOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// Values and structural non-zeros differ in number.
    ValuesLen { expected: usize, actual: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColPtrLen { expected, actual } => {
                write!(f, "expected {expected} column offsets, got {actual}")
            }
            Self::ColPtrStart { value } => write!(f, "first column offset is {value}, not 0"),
            Self::ColPtrNotMonotonic { col, prev, next } => {
                write!(f, "column {col} has offsets {prev}..{next}")
            }
            Self::ColPtrOutOfBounds {
                last,
                row_indices_len,
            } => write!(
                f,
                "last column offset {last} but {row_indices_len} row indices"
            ),
            Self::RowIndexOutOfBounds { col, row, nrows } => {
                write!(f, "column {col} references row {row} of a {nrows}-row pattern")
            }
            Self::RowIndexNotSorted { col, prev, next } => {
                write!(f, "column {col} lists row {next} after row {prev}")
            }
            Self::TripletOutOfBounds {
                row,
                col,
                nrows,
                ncols,
            } => write!(f, "entry ({row}, {col}) lies outside a {nrows}x{ncols} matrix"),
            Self::ValuesLen { expected, actual } => {
                write!(f, "{actual} values for {expected} structural non-zeros")
            }
        }
    }
}

impl std::error::Error for PatternError {}

impl JacobianPattern {
    /// Validates CSC arrays and wraps them.
    ///
    /// `col_ptrs` has `ncols + 1` non-decreasing offsets from `0` to
    /// `row_indices.len()`; each column's rows are strictly increasing and
    /// below `nrows`.
    pub fn new(
        nrows: usize,
        ncols: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
    ) -> Result<Self, PatternError> {
        if col_ptrs.len() != ncols + 1 {
            return Err(PatternError::ColPtrLen {
                expected: ncols + 1,
                actual: col_ptrs.len(),
            });
        }
        if col_ptrs[0] != 0 {
            return Err(PatternError::ColPtrStart { value: col_ptrs[0] });
        }
        if let Some(col) = col_ptrs.windows(2).position(|w| w[0] > w[1]) {
            return Err(PatternError::ColPtrNotMonotonic {
                col,
                prev: col_ptrs[col],
                next: col_ptrs[col + 1],
            });
        }
        if col_ptrs[ncols] != row_indices.len() {
            return Err(PatternError::ColPtrOutOfBounds {
                last: col_ptrs[ncols],
                row_indices_len: row_indices.len(),
            });
        }

        for (col, span) in col_ptrs.windows(2).enumerate() {
            let rows = &row_indices[span[0]..span[1]];
            if let Some(&row) = rows.iter().find(|&&row| row >= nrows) {
                return Err(PatternError::RowIndexOutOfBounds { col, row, nrows });
            }
            if let Some(pair) = rows.windows(2).find(|pair| pair[0] >= pair[1]) {
                return Err(PatternError::RowIndexNotSorted {
                    col,
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
        })
    }

    /// Builds a pattern from zero-based `(row, col)` entries in any order.
    ///
    /// Duplicates are merged.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        entries: &[(usize, usize)],
    ) -> Result<Self, PatternError> {
        let mut cols: Vec<Vec<usize>> = vec![Vec::new(); ncols];
        for &(row, col) in entries {
            if row >= nrows || col >= ncols {
                return Err(PatternError::TripletOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
            cols[col].push(row);
        }
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        let mut row_indices = Vec::with_capacity(entries.len());
        col_ptrs.push(0);
        for mut col_rows in cols {
            col_rows.sort_unstable();
            col_rows.dedup();
            row_indices.extend_from_slice(&col_rows);
            col_ptrs.push(row_indices.len());
        }
        Self::new(nrows, ncols, col_ptrs, row_indices)
    }

    /// Pattern of the non-zero entries of a dense matrix.
    pub fn from_dense(structure: &Mat<f64>) -> Self {
        let nrows = structure.nrows();
        let ncols = structure.ncols();
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        let mut row_indices = Vec::new();
        col_ptrs.push(0);
        for col in 0..ncols {
            for row in 0..nrows {
                if structure.read(row, col) != 0.0 {
                    row_indices.push(row);
                }
            }
            col_ptrs.push(row_indices.len());
        }
        Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
        }
    }

    /// Pattern with every entry structurally non-zero.
    pub fn full(nrows: usize, ncols: usize) -> Self {
        let col_ptrs = (0..=ncols).map(|col| col * nrows).collect();
        let row_indices = (0..ncols).flat_map(|_| 0..nrows).collect();
        Self {
            nrows,
            ncols,
            col_ptrs,
            row_indices,
        }
    }

    /// Function outputs `m`.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Variables `n`.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    pub fn col_ptrs(&self) -> &[usize] {
        &self.col_ptrs
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// Offsets of column `col` in `row_indices` (and in aligned values).
    pub fn col_range(&self, col: usize) -> Range<usize> {
        self.col_ptrs[col]..self.col_ptrs[col + 1]
    }

    /// Structural rows of column `col`, increasing.
    pub fn row_indices_of_col(&self, col: usize) -> &[usize] {
        &self.row_indices[self.col_range(col)]
    }

    /// Offset of entry `(row, col)` in CSC order, if it is structural.
    pub fn position(&self, row: usize, col: usize) -> Option<usize> {
        if col >= self.ncols {
            return None;
        }
        let start = self.col_ptrs[col];
        self.row_indices_of_col(col)
            .binary_search(&row)
            .ok()
            .map(|offset| start + offset)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.position(row, col).is_some()
    }

    pub(crate) fn as_symbolic(&self) -> SymbolicSparseColMatRef<'_, usize> {
        // SAFETY: the invariants checked in `new` are the ones faer requires.
        unsafe {
            SymbolicSparseColMatRef::new_unchecked(
                self.nrows,
                self.ncols,
                &self.col_ptrs,
                None,
                &self.row_indices,
            )
        }
    }
}
