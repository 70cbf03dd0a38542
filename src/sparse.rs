use crate::approx::{Evaluator, Function};
use crate::error::DiffError;
use crate::group::Groups;
use crate::jacobian::SparseJacobian;
use crate::pattern::JacobianPattern;
use crate::step::{Method, StepPlan};

/// Estimates the structural entries of the Jacobian one column group at a
/// time.
///
/// Columns of a group never share a structural row, so each row of the
/// group's difference belongs to exactly one perturbed column. Costs one
/// evaluation per group for 2-point and two for 3-point, whatever `n` is.
pub(crate) fn sparse_difference<F: Function + ?Sized>(
    eval: &mut Evaluator<'_, F>,
    x0: &[f64],
    f0: &[f64],
    plan: &StepPlan,
    pattern: &JacobianPattern,
    groups: &Groups,
    method: Method,
) -> Result<SparseJacobian, DiffError> {
    let m = f0.len();
    let n = x0.len();
    if pattern.shape() != (m, n) {
        return Err(DiffError::shape_mismatch(
            "sparsity structure",
            (m, n),
            pattern.shape(),
        ));
    }
    if groups.len() != n {
        return Err(DiffError::len_mismatch("groups", n, groups.len()));
    }

    let mut jac = SparseJacobian::zeros(pattern.clone());
    let mut dx = vec![0.0; n];

    for (group, cols) in groups.members().into_iter().enumerate() {
        if cols.is_empty() {
            continue;
        }
        log::trace!("group {group}: {} columns", cols.len());

        match method {
            Method::TwoPoint => {
                let mut x = x0.to_vec();
                for &j in &cols {
                    x[j] += plan.h[j];
                    dx[j] = x[j] - x0[j];
                }
                let f = eval.eval(&x)?;
                for &j in &cols {
                    scatter(&mut jac, pattern, j, |row| (f[row] - f0[row]) / dx[j]);
                }
            }
            Method::ThreePoint => {
                let mut x1 = x0.to_vec();
                let mut x2 = x0.to_vec();
                for &j in &cols {
                    let h = plan.h[j];
                    if plan.one_sided[j] {
                        x1[j] += h;
                        x2[j] += 2.0 * h;
                        dx[j] = x2[j] - x0[j];
                    } else {
                        x1[j] -= h;
                        x2[j] += h;
                        dx[j] = x2[j] - x1[j];
                    }
                }
                let f1 = eval.eval(&x1)?;
                let f2 = eval.eval(&x2)?;
                for &j in &cols {
                    if plan.one_sided[j] {
                        scatter(&mut jac, pattern, j, |row| {
                            (-3.0 * f0[row] + 4.0 * f1[row] - f2[row]) / dx[j]
                        });
                    } else {
                        scatter(&mut jac, pattern, j, |row| (f2[row] - f1[row]) / dx[j]);
                    }
                }
            }
        }
    }

    Ok(jac)
}

fn scatter(
    jac: &mut SparseJacobian,
    pattern: &JacobianPattern,
    col: usize,
    entry: impl Fn(usize) -> f64,
) {
    let rows = pattern.row_indices_of_col(col);
    for (value, &row) in jac.values_of_col_mut(col).iter_mut().zip(rows) {
        *value = entry(row);
    }
}
