use crate::approx::{approx_derivative, DiffOptions, Function, Sparsity};
use crate::bounds::Bounds;
use crate::error::DiffError;
use crate::group::GroupOrder;
use crate::jacobian::{Jacobian, SparseJacobian};
use crate::report::{CheckReport, EntryError};

/// Analytic Jacobian of a `Function`.
pub trait JacobianFunction {
    /// Jacobian at `x`: an `m x n` matrix, a sparse Jacobian, or a gradient
    /// when `m == 1`.
    fn jacobian(&mut self, x: &[f64]) -> Jacobian;
}

impl<J> JacobianFunction for J
where
    J: FnMut(&[f64]) -> Jacobian,
{
    fn jacobian(&mut self, x: &[f64]) -> Jacobian {
        self(x)
    }
}

/// Options for `check_derivative`.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions<'a> {
    /// Region the function may be evaluated in.
    pub bounds: Bounds,
    /// Estimate with sparse differencing when the analytic Jacobian is sparse.
    pub sparse_diff: bool,
    /// Structure and groups for sparse differencing. When absent the analytic
    /// Jacobian's pattern is used and its columns grouped in `order`.
    pub sparsity: Option<&'a Sparsity>,
    /// Column order used when groups must be computed.
    pub order: GroupOrder,
    /// Print the worst entries after the check.
    pub verbose: bool,
}

/// Compares `jac` against a finite difference estimate of `fun` at `x0`.
///
/// Returns the largest entry error, relative for estimates larger than one
/// in magnitude and absolute otherwise. Values around `1e-6` or lower mean
/// `jac` is very likely correct.
pub fn check_derivative<F, J>(
    fun: &mut F,
    jac: &mut J,
    x0: &[f64],
    options: &CheckOptions<'_>,
) -> Result<f64, DiffError>
where
    F: Function + ?Sized,
    J: JacobianFunction + ?Sized,
{
    Ok(check_derivative_report(fun, jac, x0, options)?.accuracy)
}

/// Like `check_derivative`, also returning the worst entries.
pub fn check_derivative_report<F, J>(
    fun: &mut F,
    jac: &mut J,
    x0: &[f64],
    options: &CheckOptions<'_>,
) -> Result<CheckReport, DiffError>
where
    F: Function + ?Sized,
    J: JacobianFunction + ?Sized,
{
    let analytic = jac.jacobian(x0);

    let report = match (&analytic, options.sparse_diff) {
        (Jacobian::Sparse(analytic), true) => {
            let derived;
            let sparsity = match options.sparsity {
                Some(sparsity) => sparsity,
                None => {
                    derived = Sparsity::grouped(analytic.pattern().clone(), &options.order)?;
                    &derived
                }
            };
            let diff_options = DiffOptions {
                bounds: options.bounds.clone(),
                sparsity: Some(sparsity),
                ..DiffOptions::default()
            };
            match approx_derivative(fun, x0, &diff_options)? {
                Jacobian::Sparse(estimate) => compare_sparse(analytic, &estimate)?,
                estimate => compare_dense(&Jacobian::Sparse(analytic.clone()), &estimate)?,
            }
        }
        _ => {
            let diff_options = DiffOptions {
                bounds: options.bounds.clone(),
                ..DiffOptions::default()
            };
            let estimate = approx_derivative(fun, x0, &diff_options)?;
            compare_dense(&analytic, &estimate)?
        }
    };

    log::debug!(
        "derivative check: accuracy={:.3e} compared={} sparse={}",
        report.accuracy,
        report.compared,
        report.sparse
    );
    if options.verbose {
        report.emit_table();
    }
    Ok(report)
}

fn compare_dense(analytic: &Jacobian, estimate: &Jacobian) -> Result<CheckReport, DiffError> {
    if analytic.shape() != estimate.shape() {
        return Err(DiffError::shape_mismatch(
            "analytic jacobian",
            estimate.shape(),
            analytic.shape(),
        ));
    }
    let analytic = analytic.to_dense();
    let (m, n) = estimate.shape();
    let entries = (0..n).flat_map(|col| (0..m).map(move |row| (row, col)));
    let entries = entries.map(|(row, col)| {
        EntryError::new(row, col, analytic.read(row, col), estimate.get(row, col))
    });
    Ok(CheckReport::from_entries(entries, false))
}

/// Compares over the union of both patterns; positions outside a pattern
/// read as zero.
fn compare_sparse(
    analytic: &SparseJacobian,
    estimate: &SparseJacobian,
) -> Result<CheckReport, DiffError> {
    let a = analytic.pattern();
    let e = estimate.pattern();
    if a.shape() != e.shape() {
        return Err(DiffError::shape_mismatch("analytic jacobian", e.shape(), a.shape()));
    }

    let mut entries = Vec::with_capacity(a.nnz().max(e.nnz()));
    for col in 0..a.ncols() {
        for (&row, &value) in a.row_indices_of_col(col).iter().zip(analytic.values_of_col(col)) {
            entries.push(EntryError::new(row, col, value, estimate.get(row, col)));
        }
        for (&row, &value) in e.row_indices_of_col(col).iter().zip(estimate.values_of_col(col)) {
            if !a.contains(row, col) {
                entries.push(EntryError::new(row, col, 0.0, value));
            }
        }
    }
    Ok(CheckReport::from_entries(entries, true))
}
