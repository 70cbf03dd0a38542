use crate::error::DiffError;

/// A per-variable quantity given either once for all variables or per variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Broadcast {
    /// Expands to a vector of length `n`.
    pub fn expand(&self, n: usize, what: &'static str) -> Result<Vec<f64>, DiffError> {
        match self {
            Self::Scalar(value) => Ok(vec![*value; n]),
            Self::Vector(values) if values.len() == n => Ok(values.clone()),
            Self::Vector(values) => Err(DiffError::len_mismatch(what, n, values.len())),
        }
    }
}

impl From<f64> for Broadcast {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Broadcast {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

impl From<&[f64]> for Broadcast {
    fn from(values: &[f64]) -> Self {
        Self::Vector(values.to_vec())
    }
}

/// Box constraints `lower <= x <= upper`; infinite entries are unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Broadcast,
    pub upper: Broadcast,
}

impl Bounds {
    pub fn new(lower: impl Into<Broadcast>, upper: impl Into<Broadcast>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Expands `bounds` into lower and upper vectors of length `n`.
pub fn prepare_bounds(bounds: &Bounds, n: usize) -> Result<(Vec<f64>, Vec<f64>), DiffError> {
    let lb = bounds.lower.expand(n, "lower bound")?;
    let ub = bounds.upper.expand(n, "upper bound")?;
    Ok((lb, ub))
}

/// Fails on the first coordinate of `x0` outside `[lb, ub]`.
pub fn check_feasible(x0: &[f64], lb: &[f64], ub: &[f64]) -> Result<(), DiffError> {
    for (index, ((&value, &lower), &upper)) in x0.iter().zip(lb).zip(ub).enumerate() {
        if value < lower || value > upper {
            return Err(DiffError::BoundViolation {
                index,
                value,
                lower,
                upper,
            });
        }
    }
    Ok(())
}

pub(crate) fn is_unbounded(lb: &[f64], ub: &[f64]) -> bool {
    lb.iter()
        .zip(ub)
        .all(|(&l, &u)| l == f64::NEG_INFINITY && u == f64::INFINITY)
}
