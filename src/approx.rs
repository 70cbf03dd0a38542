use crate::bounds::{check_feasible, prepare_bounds, Bounds, Broadcast};
use crate::dense::dense_difference;
use crate::error::DiffError;
use crate::group::{group_columns, GroupOrder, Groups, Structure};
use crate::jacobian::Jacobian;
use crate::sparse::sparse_difference;
use crate::step::{absolute_step, adjust_scheme_to_bounds, Method};

/// Vector-valued function `f: R^n -> R^m` to differentiate.
///
/// Extra parameters are captured by the implementor (or the closure).
pub trait Function {
    /// Evaluates `f(x)`. Every call must return the same number of values.
    fn eval(&mut self, x: &[f64]) -> Vec<f64>;
}

impl<F> Function for F
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    fn eval(&mut self, x: &[f64]) -> Vec<f64> {
        self(x)
    }
}

/// Adapts a scalar-valued closure into a `Function` with `m == 1`.
pub struct ScalarFunction<F>(pub F);

impl<F> Function for ScalarFunction<F>
where
    F: FnMut(&[f64]) -> f64,
{
    fn eval(&mut self, x: &[f64]) -> Vec<f64> {
        vec![(self.0)(x)]
    }
}

/// Sparsity structure together with a grouping of its columns.
///
/// Computing the groups is the only expensive part of setting up sparse
/// differencing; keep a `Sparsity` around and reuse it across calls.
#[derive(Debug, Clone)]
pub struct Sparsity {
    pub structure: Structure,
    pub groups: Groups,
}

impl Sparsity {
    /// Pairs a structure with groups computed beforehand by `group_columns`.
    pub fn new(structure: impl Into<Structure>, groups: Groups) -> Self {
        Self {
            structure: structure.into(),
            groups,
        }
    }

    /// Groups the columns of `structure` in the given order.
    pub fn grouped(structure: impl Into<Structure>, order: &GroupOrder) -> Result<Self, DiffError> {
        let structure = structure.into();
        let groups = group_columns(&structure, order)?;
        Ok(Self { structure, groups })
    }
}

/// Options for `approx_derivative`.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions<'a> {
    /// Difference formula (3-point by default).
    pub method: Method,
    /// Relative step, scalar or per variable. Defaults to `EPS^(1/2)` for
    /// 2-point and `EPS^(1/3)` for 3-point. Its sign is ignored by 3-point.
    pub rel_step: Option<Broadcast>,
    /// `f(x0)` if already known; saves one evaluation.
    pub f0: Option<&'a [f64]>,
    /// Region the function may be evaluated in.
    pub bounds: Bounds,
    /// Use grouped sparse differencing; the result is then `Jacobian::Sparse`.
    pub sparsity: Option<&'a Sparsity>,
}

/// Counts evaluations and checks every output against the length of `f0`.
pub(crate) struct Evaluator<'f, F: ?Sized> {
    fun: &'f mut F,
    m: usize,
    evaluations: usize,
}

impl<'f, F: Function + ?Sized> Evaluator<'f, F> {
    fn new(fun: &'f mut F) -> Self {
        Self {
            fun,
            m: 0,
            evaluations: 0,
        }
    }

    pub(crate) fn eval(&mut self, x: &[f64]) -> Result<Vec<f64>, DiffError> {
        let f = self.fun.eval(x);
        self.evaluations += 1;
        if f.len() != self.m {
            return Err(DiffError::FunctionOutput {
                expected: self.m,
                actual: f.len(),
            });
        }
        Ok(f)
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations
    }
}

/// Finite difference approximation of the Jacobian of `fun` at `x0`.
///
/// Entry `(i, j)` of the result is `d f_i / d x_j`. With `m == 1` a dense
/// result is returned as `Jacobian::Gradient`; with sparsity it is always
/// `Jacobian::Sparse`.
///
/// Steps are shrunk, flipped or switched to one-sided formulas so that the
/// function is never evaluated outside `options.bounds`. Input errors are
/// reported before `fun` is called.
///
/// ```
/// use s_numdiff_rs::{approx_derivative, Bounds, DiffOptions, Method};
///
/// let mut f = |x: &[f64]| vec![x[0] * x[0] + x[1], x[0] * x[1].exp()];
/// let options = DiffOptions {
///     method: "2-point".parse::<Method>().unwrap(),
///     bounds: Bounds::new(0.0, 10.0),
///     ..DiffOptions::default()
/// };
/// let jac = approx_derivative(&mut f, &[1.0, 0.0], &options).unwrap();
/// assert!((jac.get(0, 0) - 2.0).abs() < 1e-6);
/// assert!((jac.get(1, 1) - 1.0).abs() < 1e-6);
/// ```
pub fn approx_derivative<F: Function + ?Sized>(
    fun: &mut F,
    x0: &[f64],
    options: &DiffOptions<'_>,
) -> Result<Jacobian, DiffError> {
    let n = x0.len();
    let method = options.method;

    let (lb, ub) = prepare_bounds(&options.bounds, n)?;
    check_feasible(x0, &lb, &ub)?;
    let rel_step = options
        .rel_step
        .as_ref()
        .map(|step| step.expand(n, "rel_step"))
        .transpose()?;
    if let Some(sparsity) = options.sparsity {
        if sparsity.structure.ncols() != n {
            return Err(DiffError::len_mismatch(
                "sparsity structure columns",
                n,
                sparsity.structure.ncols(),
            ));
        }
        if sparsity.groups.len() != n {
            return Err(DiffError::len_mismatch("groups", n, sparsity.groups.len()));
        }
    }

    let mut eval = Evaluator::new(fun);
    let f0 = match options.f0 {
        Some(f0) => f0.to_vec(),
        None => {
            let f0 = eval.fun.eval(x0);
            eval.evaluations += 1;
            f0
        }
    };
    eval.m = f0.len();

    let h = absolute_step(rel_step.as_deref(), x0, method);
    let plan = adjust_scheme_to_bounds(x0, &h, 1, method.scheme(), &lb, &ub);

    let jac = match options.sparsity {
        None => dense_difference(&mut eval, x0, &f0, &plan, method)?,
        Some(sparsity) => {
            let pattern = sparsity.structure.to_pattern();
            Jacobian::Sparse(sparse_difference(
                &mut eval,
                x0,
                &f0,
                &plan,
                &pattern,
                &sparsity.groups,
                method,
            )?)
        }
    };

    log::debug!(
        "{method} jacobian: n={n} m={} one_sided={} sparse={} evaluations={}",
        eval.m,
        plan.one_sided_count(),
        options.sparsity.is_some(),
        eval.evaluations()
    );
    Ok(jac)
}
