use core::fmt;

use crate::pattern::PatternError;

/// Errors raised while planning, estimating or checking derivatives.
///
/// Everything except `FunctionOutput` is detected before the user function
/// is called.
#[derive(Debug, Clone)]
pub enum DiffError {
    /// The method string is not `"2-point"` or `"3-point"`.
    InvalidMethod { method: String },
    /// A vector argument has the wrong length.
    Shape {
        what: &'static str,
        expected: String,
        actual: String,
    },
    /// `x0` lies outside its bounds.
    BoundViolation {
        index: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },
    /// The user function returned a vector of unexpected length.
    FunctionOutput { expected: usize, actual: usize },
    /// An explicit column order is not a permutation.
    InvalidOrder { reason: String },
    /// A grouping leaves a group id without members or violates the pattern.
    InvalidGroups { group: usize, reason: String },
    /// The sparsity structure is invalid.
    Pattern(PatternError),
}

impl DiffError {
    pub(crate) fn len_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::Shape {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn shape_mismatch(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::Shape {
            what,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod { method } => {
                write!(f, "method must be '2-point' or '3-point' (got '{method}')")
            }
            Self::Shape {
                what,
                expected,
                actual,
            } => write!(f, "{what} has shape {actual}, expected {expected}"),
            Self::BoundViolation {
                index,
                value,
                lower,
                upper,
            } => write!(
                f,
                "x0[{index}] = {value} violates bounds [{lower}, {upper}]"
            ),
            Self::FunctionOutput { expected, actual } => write!(
                f,
                "function returned {actual} values, expected {expected}"
            ),
            Self::InvalidOrder { reason } => write!(f, "invalid column order: {reason}"),
            Self::InvalidGroups { group, reason } => {
                write!(f, "invalid group {group}: {reason}")
            }
            Self::Pattern(err) => write!(f, "invalid sparsity structure: {err}"),
        }
    }
}

impl std::error::Error for DiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for DiffError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}
