//! # Symbolic Expression Simplification Module
//!
//! Bottom-up rewriting of `Expr` trees: constant folding plus a small set of algebraic
//! identities. It exists so that derivatives and substituted expressions print in a
//! readable form (`2*x` rather than `2*x**(2 - 1)*1 + 0`) and so that the analyzer can
//! recognise a partial derivative that is identically zero.
//!
//! ## Rules
//!
//! 1. **Constant Folding**: arithmetic and functions applied to constants are evaluated,
//!    as long as the result is finite (`1/0` stays symbolic and evaluates to Inf later)
//! 2. **Additive identities**: `0 + e`, `e - 0`, `0 - e = -e`, `e - e = 0`, `e + e = 2*e`
//! 3. **Multiplicative identities**: `0*e`, `1*e`, constants moved to the left and merged,
//!    `e*e = e**2`, `e**a * e**b = e**(a + b)`
//! 4. **Division**: `0/e`, `e/1`, `e/e`, `(c1*e)/c2 = (c1/c2)*e`
//! 5. **Powers**: `e**0 = 1`, `e**1 = e`, `1**e = 1`
//!
//! `simplify()` repeats a pass until nothing changes.
use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::PI;

const MAX_PASSES: usize = 16;

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// One bottom-up simplification pass. Children are simplified first, then the rules
    /// of the node itself are applied once.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) => self.clone(),
            Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let lhs = lhs.simplify_();
                let rhs = rhs.simplify_();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b), // (a) + (b) = (a + b)
                    (Expr::Const(0.0), _) => rhs,                           // 0 + x = x
                    (_, Expr::Const(0.0)) => lhs,                           // x + 0 = x
                    _ if lhs == rhs => Expr::Const(2.0) * lhs,              // x + x = 2*x
                    _ => lhs + rhs,
                }
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = lhs.simplify_();
                let rhs = rhs.simplify_();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b), // (a) - (b) = (a - b)
                    (_, Expr::Const(0.0)) => lhs,                           // x - 0 = x
                    (Expr::Const(0.0), _) => (-rhs).simplify_(),            // 0 - x = -x
                    _ if lhs == rhs => Expr::Const(0.0),                    // x - x = 0
                    _ => lhs - rhs,
                }
            }
            Expr::Mul(lhs, rhs) => {
                let lhs = lhs.simplify_();
                let rhs = rhs.simplify_();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b), // (a) * (b) = (a * b)
                    (Expr::Const(0.0), _) | (_, Expr::Const(0.0)) => Expr::Const(0.0), // 0 * x = 0
                    (Expr::Const(1.0), _) => rhs,                           // 1 * x = x
                    (_, Expr::Const(1.0)) => lhs,                           // x * 1 = x
                    // constants go to the left: x * c = c * x
                    (_, Expr::Const(_)) => (rhs * lhs).simplify_(),
                    // c1 * (c2 * x) = (c1 * c2) * x
                    (Expr::Const(c1), Expr::Mul(inner_lhs, inner_rhs)) => {
                        match inner_lhs.as_ref() {
                            Expr::Const(c2) => Expr::Const(c1 * c2) * inner_rhs.as_ref().clone(),
                            _ => lhs * rhs,
                        }
                    }
                    // (c * x) * y = c * (x * y)
                    (Expr::Mul(inner_lhs, inner_rhs), _) if inner_lhs.as_const().is_some() => {
                        inner_lhs.as_ref().clone() * (inner_rhs.as_ref().clone() * rhs).simplify_()
                    }
                    // x^a * x^b = x^(a+b)
                    (Expr::Pow(base1, exp1), Expr::Pow(base2, exp2)) if base1 == base2 => {
                        let new_exp = (exp1.as_ref().clone() + exp2.as_ref().clone()).simplify_();
                        base1.as_ref().clone().pow(new_exp)
                    }
                    _ if lhs == rhs => lhs.pow(Expr::Const(2.0)), // x * x = x**2
                    _ => lhs * rhs,
                }
            }
            Expr::Div(lhs, rhs) => {
                let lhs = lhs.simplify_();
                let rhs = rhs.simplify_();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Expr::Const(a / b), // (a) / (b) = (a / b)
                    (Expr::Const(0.0), _) => Expr::Const(0.0), // 0 / x = 0
                    (_, Expr::Const(1.0)) => lhs,              // x / 1 = x
                    _ if lhs == rhs => Expr::Const(1.0),       // x / x = 1
                    // (c1 * x) / c2 = (c1/c2) * x
                    (Expr::Mul(inner_lhs, inner_rhs), Expr::Const(c2)) if *c2 != 0.0 => {
                        match inner_lhs.as_ref() {
                            Expr::Const(c1) => Expr::Const(c1 / c2) * inner_rhs.as_ref().clone(),
                            _ => lhs / rhs,
                        }
                    }
                    _ => lhs / rhs,
                }
            }
            Expr::Pow(base, exp) => {
                let base = base.simplify_();
                let exp = exp.simplify_();
                match (&base, &exp) {
                    (Expr::Const(a), Expr::Const(b)) => fold(base.clone().pow(exp.clone()), a.powf(*b)),
                    (_, Expr::Const(0.0)) => Expr::Const(1.0), // x^0 = 1
                    (_, Expr::Const(1.0)) => base,             // x^1 = x
                    (Expr::Const(1.0), _) => Expr::Const(1.0), // 1^x = 1
                    _ => base.pow(exp),
                }
            }
            Expr::Exp(e) => simplify_unary(e, Expr::Exp, f64::exp),
            Expr::Ln(e) => simplify_unary(e, Expr::Ln, f64::ln),
            Expr::sin(e) => simplify_unary(e, Expr::sin, f64::sin),
            Expr::cos(e) => simplify_unary(e, Expr::cos, f64::cos),
            Expr::tg(e) => simplify_unary(e, Expr::tg, f64::tan),
            Expr::ctg(e) => simplify_unary(e, Expr::ctg, |v| 1.0 / v.tan()),
            Expr::arcsin(e) => simplify_unary(e, Expr::arcsin, f64::asin),
            Expr::arccos(e) => simplify_unary(e, Expr::arccos, f64::acos),
            Expr::arctg(e) => simplify_unary(e, Expr::arctg, f64::atan),
            Expr::arcctg(e) => simplify_unary(e, Expr::arcctg, |v| PI / 2.0 - v.atan()),
            Expr::Abs(e) => simplify_unary(e, Expr::Abs, f64::abs),
        }
    }

    /// Public interface for expression simplification: repeats `simplify_()` until the
    /// tree stops changing.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let fx = parse_expression("x**2 + y**2")?.diff("x").simplify();
    /// assert_eq!(fx.to_string(), "2*x");
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.simplify_();
        for _ in 1..MAX_PASSES {
            let next = current.simplify_();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// Keeps the symbolic form when folding would produce NaN or Inf.
fn fold(symbolic: Expr, value: f64) -> Expr {
    if value.is_finite() {
        Expr::Const(value)
    } else {
        symbolic
    }
}

fn simplify_unary(arg: &Expr, build: fn(Box<Expr>) -> Expr, eval: impl Fn(f64) -> f64) -> Expr {
    let arg = arg.simplify_();
    match arg {
        Expr::Const(v) => fold(build(Expr::Const(v).boxed()), eval(v)),
        _ => build(arg.boxed()),
    }
}
