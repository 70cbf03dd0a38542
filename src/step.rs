//! Step selection: relative to absolute steps, then fitting the scheme into
//! the bounds.

use core::fmt;
use core::str::FromStr;

use crate::bounds::is_unbounded;
use crate::error::DiffError;

/// Finite difference formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// First-order forward or backward difference.
    TwoPoint,
    /// Central difference in the interior, second-order one-sided near a bound.
    #[default]
    ThreePoint,
}

impl Method {
    /// `EPS^(1/2)` for 2-point, `EPS^(1/3)` for 3-point.
    ///
    /// Roughly balances truncation against round-off error for each formula.
    pub fn default_rel_step(self) -> f64 {
        match self {
            Self::TwoPoint => f64::EPSILON.sqrt(),
            Self::ThreePoint => f64::EPSILON.cbrt(),
        }
    }

    /// Scheme the step planner starts from.
    pub fn scheme(self) -> Scheme {
        match self {
            Self::TwoPoint => Scheme::OneSided,
            Self::ThreePoint => Scheme::TwoSided,
        }
    }
}

impl FromStr for Method {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2-point" => Ok(Self::TwoPoint),
            "3-point" => Ok(Self::ThreePoint),
            other => Err(DiffError::InvalidMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoPoint => f.write_str("2-point"),
            Self::ThreePoint => f.write_str("3-point"),
        }
    }
}

/// Whether a formula needs steps on one side of `x0` or on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    OneSided,
    TwoSided,
}

/// Adjusted steps and the per-variable one-sided flags.
///
/// For `Scheme::OneSided` every flag is set; for `Scheme::TwoSided` a set
/// flag means the variable fell back to a one-sided formula near a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    pub h: Vec<f64>,
    pub one_sided: Vec<bool>,
}

impl StepPlan {
    pub fn one_sided_count(&self) -> usize {
        self.one_sided.iter().filter(|&&flag| flag).count()
    }
}

/// Absolute step `rel_step * sign(x0) * max(1, |x0|)` with `sign(0) = +1`.
///
/// `rel_step` must have the length of `x0` when given; otherwise the
/// method's default relative step is used.
pub fn absolute_step(rel_step: Option<&[f64]>, x0: &[f64], method: Method) -> Vec<f64> {
    let default = method.default_rel_step();
    x0.iter()
        .enumerate()
        .map(|(i, &x)| {
            let rel = rel_step.map_or(default, |steps| steps[i]);
            let sign = if x >= 0.0 { 1.0 } else { -1.0 };
            rel * sign * x.abs().max(1.0)
        })
        .collect()
}

/// Fits the difference scheme into `[lb, ub]`.
///
/// `num_steps` is how many multiples of `h` the scheme takes in one
/// direction. Steps only shrink when flipping the sign or falling back to a
/// one-sided formula cannot fit a full step.
pub fn adjust_scheme_to_bounds(
    x0: &[f64],
    h: &[f64],
    num_steps: usize,
    scheme: Scheme,
    lb: &[f64],
    ub: &[f64],
) -> StepPlan {
    let n = x0.len();
    let (mut h_adjusted, one_sided) = match scheme {
        Scheme::OneSided => (h.to_vec(), vec![true; n]),
        Scheme::TwoSided => (h.iter().map(|v| v.abs()).collect::<Vec<_>>(), vec![false; n]),
    };
    let mut plan = StepPlan {
        h: Vec::new(),
        one_sided,
    };
    if is_unbounded(lb, ub) {
        plan.h = h_adjusted;
        return plan;
    }

    let steps = num_steps as f64;
    for i in 0..n {
        let lower_dist = x0[i] - lb[i];
        let upper_dist = ub[i] - x0[i];
        let h_i = h_adjusted[i];
        let h_total = h_i * steps;

        match scheme {
            Scheme::OneSided => {
                let x = x0[i] + h_total;
                let violated = x < lb[i] || x > ub[i];
                let fitting = h_total.abs() <= lower_dist.max(upper_dist);
                if violated && fitting {
                    h_adjusted[i] = -h_i;
                } else if !fitting {
                    h_adjusted[i] = if upper_dist >= lower_dist {
                        upper_dist / steps
                    } else {
                        -lower_dist / steps
                    };
                }
            }
            Scheme::TwoSided => {
                let central = lower_dist >= h_total && upper_dist >= h_total;
                if central {
                    continue;
                }
                // Half the room, since the one-sided formula reaches 2h.
                h_adjusted[i] = if upper_dist >= lower_dist {
                    h_i.min(0.5 * upper_dist / steps)
                } else {
                    -h_i.min(0.5 * lower_dist / steps)
                };
                plan.one_sided[i] = true;

                let min_dist = upper_dist.min(lower_dist) / steps;
                if h_adjusted[i].abs() <= min_dist {
                    h_adjusted[i] = min_dist;
                    plan.one_sided[i] = false;
                }
            }
        }
    }

    plan.h = h_adjusted;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const INF: f64 = f64::INFINITY;

    fn inside(x: f64, lb: f64, ub: f64) -> bool {
        let slack = 4.0 * f64::EPSILON * x.abs().max(1.0);
        x >= lb - slack && x <= ub + slack
    }

    #[test]
    fn parses_method_names() {
        assert_eq!("2-point".parse::<Method>().unwrap(), Method::TwoPoint);
        assert_eq!("3-point".parse::<Method>().unwrap(), Method::ThreePoint);
        let err = "5-point".parse::<Method>().unwrap_err();
        assert!(matches!(err, DiffError::InvalidMethod { .. }));
        assert_eq!(Method::TwoPoint.to_string(), "2-point");
    }

    #[test]
    fn absolute_step_scales_with_magnitude() {
        let h = absolute_step(None, &[0.0, -0.5, 100.0, -100.0], Method::TwoPoint);
        let rel = f64::EPSILON.sqrt();
        assert_eq!(h[0], rel);
        assert_eq!(h[1], -rel);
        assert_eq!(h[2], 100.0 * rel);
        assert_eq!(h[3], -100.0 * rel);

        let h = absolute_step(Some(&[1e-3, 1e-2]), &[2.0, 0.0], Method::ThreePoint);
        assert_eq!(h, vec![2e-3, 1e-2]);
    }

    #[test]
    fn unbounded_keeps_steps() {
        let plan = adjust_scheme_to_bounds(
            &[1.0, -1.0],
            &[0.1, -0.1],
            1,
            Scheme::OneSided,
            &[-INF; 2],
            &[INF; 2],
        );
        assert_eq!(plan.h, vec![0.1, -0.1]);
        assert_eq!(plan.one_sided, vec![true, true]);

        let plan = adjust_scheme_to_bounds(
            &[1.0, -1.0],
            &[0.1, -0.1],
            1,
            Scheme::TwoSided,
            &[-INF; 2],
            &[INF; 2],
        );
        assert_eq!(plan.h, vec![0.1, 0.1]);
        assert_eq!(plan.one_sided, vec![false, false]);
    }

    #[test]
    fn one_sided_flips_away_from_bound() {
        let plan = adjust_scheme_to_bounds(&[1.0], &[0.25], 1, Scheme::OneSided, &[0.0], &[1.0]);
        assert_eq!(plan.h, vec![-0.25]);
    }

    #[test]
    fn one_sided_clamps_when_nothing_fits() {
        let plan = adjust_scheme_to_bounds(&[0.25], &[2.0], 2, Scheme::OneSided, &[0.0], &[1.0]);
        assert_eq!(plan.h, vec![0.375]);
        let plan = adjust_scheme_to_bounds(&[0.75], &[2.0], 1, Scheme::OneSided, &[0.0], &[1.0]);
        assert_eq!(plan.h, vec![-0.75]);
    }

    #[test]
    fn two_sided_falls_back_near_bound() {
        let plan = adjust_scheme_to_bounds(&[1.0], &[0.25], 1, Scheme::TwoSided, &[-INF], &[1.0]);
        assert_eq!(plan.h, vec![-0.25]);
        assert_eq!(plan.one_sided, vec![true]);

        let plan = adjust_scheme_to_bounds(&[0.0], &[0.25], 1, Scheme::TwoSided, &[0.0], &[0.25]);
        assert_eq!(plan.h, vec![0.125]);
        assert_eq!(plan.one_sided, vec![true]);
    }

    #[test]
    fn two_sided_recovers_smaller_central_step() {
        // Lower room 0.375, upper room 0.5: the forward fallback shrinks to
        // 0.25, at which point a central step of 0.375 fits.
        let plan =
            adjust_scheme_to_bounds(&[0.375], &[1.0], 1, Scheme::TwoSided, &[0.0], &[0.875]);
        assert_eq!(plan.h, vec![0.375]);
        assert_eq!(plan.one_sided, vec![false]);
    }

    #[test]
    fn negative_three_point_step_ignores_sign() {
        let plan = adjust_scheme_to_bounds(&[-3.0], &[-0.5], 1, Scheme::TwoSided, &[-10.0], &[10.0]);
        assert_eq!(plan.h, vec![0.5]);
        assert_eq!(plan.one_sided, vec![false]);
    }

    #[test]
    fn evaluation_points_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let choices = [INF, 1e-9, 1e-6, 1e-3, 0.5, 2.0];
        for _ in 0..2000 {
            let n = 4;
            let mut x0 = Vec::with_capacity(n);
            let mut lb = Vec::with_capacity(n);
            let mut ub = Vec::with_capacity(n);
            for _ in 0..n {
                let x: f64 = rng.gen_range(-5.0..5.0);
                let below = choices[rng.gen_range(0..choices.len())];
                let above = choices[rng.gen_range(0..choices.len())];
                let below = if rng.gen_bool(0.2) { 0.0 } else { below };
                let above = if rng.gen_bool(0.2) { 0.0 } else { above };
                x0.push(x);
                lb.push(x - below);
                ub.push(x + above);
            }
            let rel: f64 = rng.gen_range(1e-8..1.0);

            for method in [Method::TwoPoint, Method::ThreePoint] {
                let h = absolute_step(Some(&[rel; 4]), &x0, method);
                let plan = adjust_scheme_to_bounds(&x0, &h, 1, method.scheme(), &lb, &ub);
                for i in 0..n {
                    let points = match (method, plan.one_sided[i]) {
                        (Method::TwoPoint, _) => vec![x0[i] + plan.h[i]],
                        (Method::ThreePoint, true) => {
                            vec![x0[i] + plan.h[i], x0[i] + 2.0 * plan.h[i]]
                        }
                        (Method::ThreePoint, false) => {
                            vec![x0[i] - plan.h[i], x0[i] + plan.h[i]]
                        }
                    };
                    for x in points {
                        assert!(
                            inside(x, lb[i], ub[i]),
                            "{method} step {} at {} leaves [{}, {}]",
                            plan.h[i],
                            x0[i],
                            lb[i],
                            ub[i]
                        );
                    }
                }
            }
        }
    }
}
