//! Numerical limits of one-variable slices of an expression.
//!
//! The function is sampled on a geometric sequence approaching the point (|t| = 10^k
//! towards infinity, a + 10^-k towards a finite point, from the right). The tail of that
//! sequence decides the result: a stable tail converges, a fast geometrically shrinking
//! difference is extrapolated with Aitken's delta-squared step when the correction is
//! small, and a tail that keeps growing in one direction diverges.
use crate::symbolic::symbolic_engine::Expr;
use std::fmt;

/// Where the variable goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitPoint {
    PosInfinity,
    NegInfinity,
    /// approached from the right
    Finite(f64),
}

impl fmt::Display for LimitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitPoint::PosInfinity => write!(f, "oo"),
            LimitPoint::NegInfinity => write!(f, "-oo"),
            LimitPoint::Finite(a) => write!(f, "{}", a),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    Finite(f64),
    PositiveInfinity,
    NegativeInfinity,
    /// oscillating, undefined, or not settled along the sequence
    DoesNotExist,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(v) => write!(f, "{}", v),
            Limit::PositiveInfinity => write!(f, "oo"),
            Limit::NegativeInfinity => write!(f, "-oo"),
            Limit::DoesNotExist => write!(f, "does not exist"),
        }
    }
}

// samples used to judge the tail of the sequence
const TAIL: usize = 6;
const CONVERGED: f64 = 1e-9;
const SNAP: f64 = 1e-7;
// Aitken extrapolation is trusted only for a tail this fast and a correction this small
const AITKEN_MAX_RATIO: f64 = 0.5;
const AITKEN_MAX_CORRECTION: f64 = 1e-3;
// values the variables that are not taken to the limit are held at
const HELD_VALUES: [f64; 4] = [0.0, 1.0, -1.0, 2.0];

fn approach_sequence(point: LimitPoint) -> Vec<f64> {
    match point {
        LimitPoint::PosInfinity => (2..=16).map(|k| 10f64.powi(k)).collect(),
        LimitPoint::NegInfinity => (2..=16).map(|k| -(10f64.powi(k))).collect(),
        LimitPoint::Finite(a) => (1..=12).map(|k| a + 10f64.powi(-k)).collect(),
    }
}

/// Estimates `lim f(t)` as `t` approaches `point`.
pub fn limit_of(f: impl Fn(f64) -> f64, point: LimitPoint) -> Limit {
    let values: Vec<f64> = approach_sequence(point).into_iter().map(f).collect();
    let tail = &values[values.len() - TAIL..];

    if tail.iter().any(|v| v.is_nan()) {
        return Limit::DoesNotExist;
    }
    if tail.iter().all(|v| *v == f64::INFINITY) {
        return Limit::PositiveInfinity;
    }
    if tail.iter().all(|v| *v == f64::NEG_INFINITY) {
        return Limit::NegativeInfinity;
    }
    if tail.iter().any(|v| v.is_infinite()) {
        // overflowed part of the way: trust the direction of the last finite values
        let last = tail[TAIL - 1];
        let finite: Vec<f64> = tail.iter().copied().filter(|v| v.is_finite()).collect();
        let growing = finite.windows(2).all(|w| w[1].abs() >= w[0].abs());
        return match (growing, last) {
            (true, v) if v == f64::INFINITY => Limit::PositiveInfinity,
            (true, v) if v == f64::NEG_INFINITY => Limit::NegativeInfinity,
            _ => Limit::DoesNotExist,
        };
    }

    let diffs: Vec<f64> = tail.windows(2).map(|w| w[1] - w[0]).collect();
    let scale = tail[TAIL - 1].abs().max(1.0);
    let last_diff = diffs[diffs.len() - 1];
    if last_diff.abs() <= CONVERGED * scale && diffs[diffs.len() - 2].abs() <= 1e-6 * scale {
        return Limit::Finite(snap(tail[TAIL - 1]));
    }

    let ratios: Vec<f64> = diffs
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0])
        .collect();
    if ratios.len() < 2 {
        return Limit::DoesNotExist;
    }
    let r = ratios[ratios.len() - 1];
    let r_prev = ratios[ratios.len() - 2];
    let steady = (r - r_prev).abs() <= 0.1 * r.abs().max(1e-3);
    let same_sign = diffs.iter().all(|d| d.signum() == last_diff.signum());

    if steady && r.abs() < AITKEN_MAX_RATIO {
        // geometric tail: L = v + d * r / (1 - r)
        let correction = last_diff * r / (1.0 - r);
        if correction.abs() <= AITKEN_MAX_CORRECTION * scale {
            return Limit::Finite(snap(tail[TAIL - 1] + correction));
        }
        return Limit::DoesNotExist;
    }
    if same_sign && r >= 0.9 {
        return if last_diff > 0.0 {
            Limit::PositiveInfinity
        } else {
            Limit::NegativeInfinity
        };
    }
    Limit::DoesNotExist
}

fn same_limit(a: Limit, b: Limit) -> bool {
    match (a, b) {
        (Limit::Finite(u), Limit::Finite(v)) => (u - v).abs() <= SNAP * u.abs().max(v.abs()).max(1.0),
        (Limit::DoesNotExist, _) | (_, Limit::DoesNotExist) => false,
        _ => a == b,
    }
}

fn snap(value: f64) -> f64 {
    if value.abs() < SNAP {
        return 0.0;
    }
    let rounded = value.round();
    if (value - rounded).abs() < SNAP * value.abs().max(1.0) {
        rounded
    } else {
        value
    }
}

impl Expr {
    /// Limit of the expression as `var` approaches `point`.
    ///
    /// Every other variable is held constant and the slice is taken at several held
    /// values. The limit exists only when all those slices agree, so `x*y` as x -> oo
    /// gives `DoesNotExist` while `x**2 + y**2` goes to `oo`.
    pub fn limit(&self, var: &str, point: LimitPoint) -> Limit {
        let others: Vec<String> = self
            .all_arguments_are_variables()
            .into_iter()
            .filter(|name| name != var)
            .collect();
        let held: &[f64] = if others.is_empty() { &HELD_VALUES[..1] } else { &HELD_VALUES };
        let mut slices = held.iter().map(|value| {
            let slice = others
                .iter()
                .fold(self.clone(), |slice, name| slice.set_variable(name, *value))
                .simplify();
            match slice.compile(&[var]) {
                Ok(lambda) => limit_of(|t| lambda.eval(&[t]), point),
                Err(_) => Limit::DoesNotExist,
            }
        });
        let Some(first) = slices.next() else {
            return Limit::DoesNotExist;
        };
        if slices.all(|other| same_limit(first, other)) {
            first
        } else {
            Limit::DoesNotExist
        }
    }

    /// Iterated limit `lim y->b+ (lim x->a+ f)`, the inner limit taken for each `y` of
    /// the outer approach sequence.
    pub fn iterated_limit(&self, x: &str, a: f64, y: &str, b: f64) -> Limit {
        let Ok(lambda) = self.compile(&[x, y]) else {
            return Limit::DoesNotExist;
        };
        let inner = |yv: f64| match limit_of(|xv| lambda.eval(&[xv, yv]), LimitPoint::Finite(a)) {
            Limit::Finite(v) => v,
            Limit::PositiveInfinity => f64::INFINITY,
            Limit::NegativeInfinity => f64::NEG_INFINITY,
            Limit::DoesNotExist => f64::NAN,
        };
        limit_of(inner, LimitPoint::Finite(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;

    fn limit(raw: &str, var: &str, point: LimitPoint) -> Limit {
        parse_expression(raw).unwrap().limit(var, point)
    }

    #[test]
    fn test_limits_at_infinity() {
        assert_eq!(limit("1/x", "x", LimitPoint::PosInfinity), Limit::Finite(0.0));
        assert_eq!(limit("exp(-x)", "x", LimitPoint::PosInfinity), Limit::Finite(0.0));
        assert_eq!(limit("x**2", "x", LimitPoint::NegInfinity), Limit::PositiveInfinity);
        assert_eq!(limit("-x**3", "x", LimitPoint::PosInfinity), Limit::NegativeInfinity);
        assert_eq!(limit("exp(x)", "x", LimitPoint::PosInfinity), Limit::PositiveInfinity);
        assert_eq!(limit("(2*x + 1)/(x + 3)", "x", LimitPoint::PosInfinity), Limit::Finite(2.0));
        assert_eq!(limit("atan(x)", "x", LimitPoint::NegInfinity), Limit::Finite(-std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn test_limits_at_a_finite_point() {
        assert_eq!(limit("1/x", "x", LimitPoint::Finite(0.0)), Limit::PositiveInfinity);
        assert_eq!(limit("sin(x)/x", "x", LimitPoint::Finite(0.0)), Limit::Finite(1.0));
        assert_eq!(limit("exp(-1/x)", "x", LimitPoint::Finite(0.0)), Limit::Finite(0.0));
        assert_eq!(limit("log(x)", "x", LimitPoint::Finite(0.0)), Limit::NegativeInfinity);
        match limit("cos(x) + x", "x", LimitPoint::Finite(1.0)) {
            Limit::Finite(v) => assert_relative_eq!(v, 1.0_f64.cos() + 1.0, epsilon = 1e-8),
            other => panic!("expected a finite limit, got {:?}", other),
        }
    }

    #[test]
    fn test_oscillation_does_not_exist() {
        assert_eq!(limit("sin(x)", "x", LimitPoint::PosInfinity), Limit::DoesNotExist);
    }

    #[test]
    fn test_limit_must_not_depend_on_the_other_variable() {
        assert_eq!(limit("x*y", "x", LimitPoint::PosInfinity), Limit::DoesNotExist);
        assert_eq!(limit("y*exp(x)", "x", LimitPoint::PosInfinity), Limit::DoesNotExist);
        assert_eq!(limit("x*y + exp(-x)", "x", LimitPoint::PosInfinity), Limit::DoesNotExist);
        assert_eq!(limit("x**2 + y**2", "x", LimitPoint::PosInfinity), Limit::PositiveInfinity);
        assert_eq!(limit("x**2 + y**2", "y", LimitPoint::NegInfinity), Limit::PositiveInfinity);
        assert_eq!(limit("1/x + 0*y", "x", LimitPoint::PosInfinity), Limit::Finite(0.0));
        assert_eq!(limit("(2*x + y)/(x + 1)", "x", LimitPoint::PosInfinity), Limit::Finite(2.0));
    }

    #[test]
    fn test_slow_tail_is_not_extrapolated() {
        // 1/log(x) shrinks too slowly for the sampled tail to pin the limit down
        assert_eq!(limit("1/log(x)", "x", LimitPoint::PosInfinity), Limit::DoesNotExist);
    }

    #[test]
    fn test_fast_geometric_tail_is_extrapolated() {
        assert_eq!(limit_of(|t| 3.0 + 1.0 / t.sqrt(), LimitPoint::PosInfinity), Limit::Finite(3.0));
    }

    #[test]
    fn test_iterated_limit_at_origin() {
        let f = parse_expression("x**2 + y**2 + 1").unwrap();
        assert_eq!(f.iterated_limit("x", 0.0, "y", 0.0), Limit::Finite(1.0));
        let g = parse_expression("cos(x) * exp(y)").unwrap();
        assert_eq!(g.iterated_limit("x", 0.0, "y", 0.0), Limit::Finite(1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Limit::PositiveInfinity.to_string(), "oo");
        assert_eq!(Limit::Finite(0.0).to_string(), "0");
        assert_eq!(LimitPoint::NegInfinity.to_string(), "-oo");
    }
}
