use faer_core::Mat;

use crate::approx::{Evaluator, Function};
use crate::error::DiffError;
use crate::jacobian::Jacobian;
use crate::step::{Method, StepPlan};

/// Estimates the full Jacobian by perturbing one variable at a time.
///
/// The divisor is the realised offset `x[i] - x0[i]`, not the nominal step,
/// so round-off in forming `x` does not leak into the quotient.
pub(crate) fn dense_difference<F: Function + ?Sized>(
    eval: &mut Evaluator<'_, F>,
    x0: &[f64],
    f0: &[f64],
    plan: &StepPlan,
    method: Method,
) -> Result<Jacobian, DiffError> {
    let m = f0.len();
    let n = x0.len();
    let mut jac = Mat::<f64>::zeros(m, n);

    for i in 0..n {
        let h = plan.h[i];
        let (df, dx) = match method {
            Method::TwoPoint => {
                let mut x = x0.to_vec();
                x[i] += h;
                let dx = x[i] - x0[i];
                let f = eval.eval(&x)?;
                let df: Vec<f64> = f.iter().zip(f0).map(|(f, f0)| f - f0).collect();
                (df, dx)
            }
            Method::ThreePoint if plan.one_sided[i] => {
                let mut x1 = x0.to_vec();
                let mut x2 = x0.to_vec();
                x1[i] += h;
                x2[i] += 2.0 * h;
                let dx = x2[i] - x0[i];
                let f1 = eval.eval(&x1)?;
                let f2 = eval.eval(&x2)?;
                let df = (0..m)
                    .map(|k| -3.0 * f0[k] + 4.0 * f1[k] - f2[k])
                    .collect();
                (df, dx)
            }
            Method::ThreePoint => {
                let mut x1 = x0.to_vec();
                let mut x2 = x0.to_vec();
                x1[i] -= h;
                x2[i] += h;
                let dx = x2[i] - x1[i];
                let f1 = eval.eval(&x1)?;
                let f2 = eval.eval(&x2)?;
                let df = f2.iter().zip(&f1).map(|(f2, f1)| f2 - f1).collect();
                (df, dx)
            }
        };
        for (row, df) in df.into_iter().enumerate() {
            jac.write(row, i, df / dx);
        }
    }

    if m == 1 {
        let grad = (0..n).map(|col| jac.read(0, col)).collect();
        return Ok(Jacobian::Gradient(grad));
    }
    Ok(Jacobian::Dense(jac))
}
