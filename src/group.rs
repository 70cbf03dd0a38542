//! Column grouping for sparse finite differencing.
//!
//! Two columns may share a group when no row has a structural non-zero in
//! both, so one perturbation of the whole group still separates their
//! contributions. Groups are built with the greedy sequential algorithm of
//! Curtis, Powell and Reid (1974): columns are visited in a given order and
//! each one takes the lowest group id not already used by an earlier column
//! sharing one of its rows.

use faer_core::Mat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::DiffError;
use crate::pattern::JacobianPattern;

/// Sparsity structure of a Jacobian as the caller holds it.
#[derive(Debug, Clone)]
pub enum Structure {
    /// Dense matrix; every non-zero entry is structural.
    Dense(Mat<f64>),
    Sparse(JacobianPattern),
}

impl Structure {
    pub fn nrows(&self) -> usize {
        match self {
            Self::Dense(mat) => mat.nrows(),
            Self::Sparse(pattern) => pattern.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Self::Dense(mat) => mat.ncols(),
            Self::Sparse(pattern) => pattern.ncols(),
        }
    }

    /// Column-compressed form of the structure.
    pub fn to_pattern(&self) -> JacobianPattern {
        match self {
            Self::Dense(mat) => JacobianPattern::from_dense(mat),
            Self::Sparse(pattern) => pattern.clone(),
        }
    }
}

impl From<JacobianPattern> for Structure {
    fn from(pattern: JacobianPattern) -> Self {
        Self::Sparse(pattern)
    }
}

impl From<Mat<f64>> for Structure {
    fn from(mat: Mat<f64>) -> Self {
        Self::Dense(mat)
    }
}

/// Order in which columns are visited while grouping.
///
/// The order changes how many groups are found, never their validity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Fresh random permutation per call.
    #[default]
    Random,
    /// Random permutation from a fixed seed, reproducible across runs.
    Seeded(u64),
    /// Caller-supplied permutation of `0..n`.
    Explicit(Vec<usize>),
}

impl GroupOrder {
    fn permutation(&self, n: usize) -> Result<Vec<usize>, DiffError> {
        match self {
            Self::Random => {
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(&mut rand::thread_rng());
                Ok(order)
            }
            Self::Seeded(seed) => {
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(&mut StdRng::seed_from_u64(*seed));
                Ok(order)
            }
            Self::Explicit(order) => {
                if order.len() != n {
                    return Err(DiffError::len_mismatch("column order", n, order.len()));
                }
                let mut seen = vec![false; n];
                for &col in order {
                    if col >= n {
                        return Err(DiffError::InvalidOrder {
                            reason: format!("column {col} out of range for {n} columns"),
                        });
                    }
                    if seen[col] {
                        return Err(DiffError::InvalidOrder {
                            reason: format!("column {col} appears twice"),
                        });
                    }
                    seen[col] = true;
                }
                Ok(order.clone())
            }
        }
    }
}

/// Group id of every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups {
    ids: Vec<usize>,
    n_groups: usize,
}

impl Groups {
    /// Wraps precomputed group ids, one per column.
    pub fn new(ids: Vec<usize>) -> Self {
        let n_groups = ids.iter().max().map_or(0, |&max| max + 1);
        Self { ids, n_groups }
    }

    /// Every column in its own group; sparse differencing then does as many
    /// evaluations as dense differencing.
    pub fn singletons(n: usize) -> Self {
        Self::new((0..n).collect())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of group ids in use, `max(id) + 1`.
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.ids
    }

    pub fn group_of(&self, col: usize) -> usize {
        self.ids[col]
    }

    /// Columns of each group, in increasing column order.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_groups];
        for (col, &group) in self.ids.iter().enumerate() {
            members[group].push(col);
        }
        members
    }

    /// Checks that no two columns of a group share a structural row and that
    /// every id below `n_groups` is used.
    pub fn validate(&self, pattern: &JacobianPattern) -> Result<(), DiffError> {
        if self.ids.len() != pattern.ncols() {
            return Err(DiffError::len_mismatch(
                "groups",
                pattern.ncols(),
                self.ids.len(),
            ));
        }
        // Last group that claimed each row.
        let mut owner: Vec<Option<usize>> = vec![None; pattern.nrows()];
        for (group, cols) in self.members().iter().enumerate() {
            if cols.is_empty() {
                return Err(DiffError::InvalidGroups {
                    group,
                    reason: "no columns".to_string(),
                });
            }
            for &col in cols {
                for &row in pattern.row_indices_of_col(col) {
                    if owner[row] == Some(group) {
                        return Err(DiffError::InvalidGroups {
                            group,
                            reason: format!("column {col} shares row {row}"),
                        });
                    }
                    owner[row] = Some(group);
                }
            }
        }
        Ok(())
    }
}

/// Groups the columns of `structure` for sparse differencing.
pub fn group_columns(structure: &Structure, order: &GroupOrder) -> Result<Groups, DiffError> {
    let n = structure.ncols();
    let order = order.permutation(n)?;
    let ids = match structure {
        Structure::Dense(mat) => group_dense(mat, &order),
        Structure::Sparse(pattern) => group_sparse(pattern, &order),
    };
    let groups = Groups::new(ids);
    log::debug!(
        "grouped {n} columns into {} groups ({} rows)",
        groups.n_groups(),
        structure.nrows()
    );
    Ok(groups)
}

/// First-fit assignment shared by the dense and sparse paths.
///
/// `row_groups[row]` lists the groups already present in a row;
/// `stamp[group] == col` marks a group as taken for the current column.
struct Colouring {
    ids: Vec<usize>,
    row_groups: Vec<Vec<usize>>,
    stamp: Vec<usize>,
}

impl Colouring {
    fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            ids: vec![usize::MAX; ncols],
            row_groups: vec![Vec::new(); nrows],
            stamp: Vec::new(),
        }
    }

    fn assign(&mut self, col: usize, rows: &[usize]) {
        for &row in rows {
            for &group in &self.row_groups[row] {
                self.stamp[group] = col;
            }
        }
        let group = self
            .stamp
            .iter()
            .position(|&s| s != col)
            .unwrap_or(self.stamp.len());
        if group == self.stamp.len() {
            self.stamp.push(usize::MAX);
        }
        for &row in rows {
            self.row_groups[row].push(group);
        }
        self.ids[col] = group;
    }
}

fn group_dense(structure: &Mat<f64>, order: &[usize]) -> Vec<usize> {
    let nrows = structure.nrows();
    let mut colouring = Colouring::new(nrows, structure.ncols());
    let mut rows = Vec::with_capacity(nrows);
    for &col in order {
        rows.clear();
        rows.extend((0..nrows).filter(|&row| structure.read(row, col) != 0.0));
        colouring.assign(col, &rows);
    }
    colouring.ids
}

fn group_sparse(pattern: &JacobianPattern, order: &[usize]) -> Vec<usize> {
    let mut colouring = Colouring::new(pattern.nrows(), pattern.ncols());
    for &col in order {
        colouring.assign(col, pattern.row_indices_of_col(col));
    }
    colouring.ids
}
