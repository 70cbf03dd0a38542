//! Finite difference Jacobians under box constraints, with sparse column
//! grouping and a derivative checker.
//!
//! For `f: R^n -> R^m` this crate estimates the `m x n` Jacobian
//! `J[i, j] = d f_i / d x_j` at a point `x0`.
//!
//! How it works (high level):
//! - Turn a relative step into an absolute one, `rel * sign(x0) * max(1, |x0|)`.
//! - Fit the difference scheme into the bounds: flip or shrink steps, and fall
//!   back from central to one-sided 3-point formulas next to a bound.
//! - Dense: perturb one variable per evaluation.
//! - Sparse: group columns that share no structural row (Curtis-Powell-Reid)
//!   and perturb a whole group per evaluation.
//!
//! Calling it:
//! - Pass any `FnMut(&[f64]) -> Vec<f64>` (or implement `Function`) to
//!   `approx_derivative` with `DiffOptions`.
//! - For sparse Jacobians build a `JacobianPattern`, group it once with
//!   `group_columns`, and reuse the resulting `Sparsity`.
//! - Use `check_derivative` to validate a hand-written Jacobian.
//!
//! Example:
//! ```rust
//! use s_numdiff_rs::{approx_derivative, DiffOptions, Jacobian};
//!
//! let (c1, c2) = (1.0, 2.0);
//! let mut f = move |x: &[f64]| vec![x[0] * (c1 * x[1]).sin(), x[0] * (c2 * x[1]).cos()];
//! let x0 = [1.0, 0.5 * std::f64::consts::PI];
//! let jac = approx_derivative(&mut f, &x0, &DiffOptions::default()).unwrap();
//! assert!(matches!(jac, Jacobian::Dense(_)));
//! assert!((jac.get(0, 0) - 1.0).abs() < 1e-9);
//! assert!((jac.get(1, 0) + 1.0).abs() < 1e-9);
//! assert!(jac.get(0, 1).abs() < 1e-9);
//! ```

mod approx;
mod bounds;
mod check;
mod dense;
mod error;
mod group;
mod jacobian;
mod pattern;
mod report;
mod sparse;
mod step;

pub use approx::{approx_derivative, DiffOptions, Function, ScalarFunction, Sparsity};
pub use bounds::{check_feasible, prepare_bounds, Bounds, Broadcast};
pub use check::{check_derivative, check_derivative_report, CheckOptions, JacobianFunction};
pub use error::DiffError;
pub use group::{group_columns, GroupOrder, Groups, Structure};
pub use jacobian::{Jacobian, SparseJacobian};
pub use pattern::{JacobianPattern, PatternError};
pub use report::{CheckReport, EntryError, WORST_ENTRIES};
pub use step::{absolute_step, adjust_scheme_to_bounds, Method, Scheme, StepPlan};
