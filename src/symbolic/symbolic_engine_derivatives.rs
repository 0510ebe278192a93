//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation and direct evaluation of `Expr` trees.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - analytical partial derivative
//!
//! ### Function evaluation
//! - `eval_expression()` - direct evaluation without compiling a `Lambda`
//!
//! The rules are the usual calculus ones (sum, product, quotient, chain). Powers whose
//! exponent depends on the variable use the general rule
//! d(u^v) = u^v * (v' ln u + v u'/u).
use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::PI;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    /// Other variables are treated as constants, so this is the partial derivative.
    ///
    /// The result is not simplified; call `simplify()` on it before printing.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x**2
    /// let df_dx = f.diff("x").simplify(); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                lhs.diff(var) * rhs.as_ref().clone() + lhs.as_ref().clone() * rhs.diff(var)
            }
            Expr::Div(lhs, rhs) => {
                let numerator =
                    lhs.diff(var) * rhs.as_ref().clone() - rhs.diff(var) * lhs.as_ref().clone();
                numerator / rhs.as_ref().clone().pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) if exp.contains_variable(var) => {
                let (u, v) = (base.as_ref().clone(), exp.as_ref().clone());
                self.clone()
                    * (exp.diff(var) * u.clone().ln() + v * base.diff(var) / u)
            }
            Expr::Pow(base, exp) => {
                exp.as_ref().clone()
                    * base.as_ref().clone().pow(exp.as_ref().clone() - Expr::Const(1.0))
                    * base.diff(var)
            }
            Expr::Exp(expr) => Expr::Exp(expr.clone()) * expr.diff(var),
            Expr::Ln(expr) => expr.diff(var) / expr.as_ref().clone(),
            Expr::sin(expr) => Expr::cos(expr.clone()) * expr.diff(var),
            Expr::cos(expr) => -Expr::sin(expr.clone()) * expr.diff(var),
            Expr::tg(expr) => {
                Expr::Const(1.0) / Expr::cos(expr.clone()).pow(Expr::Const(2.0)) * expr.diff(var)
            }
            Expr::ctg(expr) => {
                Expr::Const(-1.0) / Expr::sin(expr.clone()).pow(Expr::Const(2.0)) * expr.diff(var)
            }
            Expr::arcsin(expr) => {
                expr.diff(var) / one_minus_square(expr).sqrt()
            }
            Expr::arccos(expr) => -expr.diff(var) / one_minus_square(expr).sqrt(),
            Expr::arctg(expr) => expr.diff(var) / one_plus_square(expr),
            Expr::arcctg(expr) => -expr.diff(var) / one_plus_square(expr),
            Expr::Abs(expr) => {
                expr.as_ref().clone() / Expr::Abs(expr.clone()) * expr.diff(var)
            }
        }
    } // end of diff

    /// FUNCTION EVALUATION

    /// Evaluates the expression for the given variable values.
    ///
    /// Returns `None` when the expression mentions a variable that is not in `vars`.
    /// Domain problems are not errors: `log(-1)` is NaN, `1/0` is infinite.
    ///
    /// # Performance
    /// Use `compile()` to get a `Lambda` for repeated evaluation, `eval_expression()` for one-time use
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> Option<f64> {
        let value = match self {
            Expr::Var(name) => {
                let index = vars.iter().position(|v| v == name)?;
                *values.get(index)?
            }
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_expression(vars, values)? + rhs.eval_expression(vars, values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_expression(vars, values)? - rhs.eval_expression(vars, values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_expression(vars, values)? * rhs.eval_expression(vars, values)?,
            Expr::Div(lhs, rhs) => lhs.eval_expression(vars, values)? / rhs.eval_expression(vars, values)?,
            Expr::Pow(base, exp) => base
                .eval_expression(vars, values)?
                .powf(exp.eval_expression(vars, values)?),
            Expr::Exp(expr) => expr.eval_expression(vars, values)?.exp(),
            Expr::Ln(expr) => expr.eval_expression(vars, values)?.ln(),
            Expr::sin(expr) => expr.eval_expression(vars, values)?.sin(),
            Expr::cos(expr) => expr.eval_expression(vars, values)?.cos(),
            Expr::tg(expr) => expr.eval_expression(vars, values)?.tan(),
            Expr::ctg(expr) => 1.0 / expr.eval_expression(vars, values)?.tan(),
            Expr::arcsin(expr) => expr.eval_expression(vars, values)?.asin(),
            Expr::arccos(expr) => expr.eval_expression(vars, values)?.acos(),
            Expr::arctg(expr) => expr.eval_expression(vars, values)?.atan(),
            Expr::arcctg(expr) => PI / 2.0 - expr.eval_expression(vars, values)?.atan(),
            Expr::Abs(expr) => expr.eval_expression(vars, values)?.abs(),
        };
        Some(value)
    } // end of eval_expression
}

fn one_minus_square(expr: &Expr) -> Expr {
    Expr::Const(1.0) - expr.clone().pow(Expr::Const(2.0))
}

fn one_plus_square(expr: &Expr) -> Expr {
    Expr::Const(1.0) + expr.clone().pow(Expr::Const(2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;

    fn at(expr: &Expr, x: f64, y: f64) -> f64 {
        expr.eval_expression(&["x", "y"], &[x, y]).unwrap()
    }

    #[test]
    fn test_diff_polynomial() {
        let f = parse_expression("x**2 + 3*x*y - y**3").unwrap();
        let fx = f.diff("x");
        let fy = f.diff("y");
        assert_relative_eq!(at(&fx, 2.0, 1.0), 7.0, epsilon = 1e-12);
        assert_relative_eq!(at(&fy, 2.0, 1.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_treats_other_variables_as_constants() {
        let f = parse_expression("sin(x) * exp(y)").unwrap();
        let fx = f.diff("x");
        assert_relative_eq!(at(&fx, 0.3, 0.7), 0.3_f64.cos() * 0.7_f64.exp(), epsilon = 1e-12);
        assert_eq!(parse_expression("y**2").unwrap().diff("x").simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_diff_variable_exponent() {
        // d/dx x**x = x**x (ln x + 1)
        let f = parse_expression("x**x").unwrap();
        let fx = f.diff("x");
        let x: f64 = 1.7;
        assert_relative_eq!(at(&fx, x, 0.0), x.powf(x) * (x.ln() + 1.0), epsilon = 1e-10);
        // d/dy 2**y = 2**y ln 2
        let g = parse_expression("2**y").unwrap();
        assert_relative_eq!(
            at(&g.diff("y"), 0.0, 1.5),
            2f64.powf(1.5) * 2f64.ln(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_diff_inverse_trig_and_abs() {
        let f = parse_expression("acot(x)").unwrap();
        assert_relative_eq!(at(&f.diff("x"), 0.5, 0.0), -1.0 / 1.25, epsilon = 1e-12);
        let f = parse_expression("acos(x)").unwrap();
        assert_relative_eq!(
            at(&f.diff("x"), 0.5, 0.0),
            -1.0 / (0.75_f64).sqrt(),
            epsilon = 1e-12
        );
        let f = parse_expression("Abs(x - 1)").unwrap();
        assert_relative_eq!(at(&f.diff("x"), 3.0, 0.0), 1.0);
        assert_relative_eq!(at(&f.diff("x"), -3.0, 0.0), -1.0);
    }

    #[test]
    fn test_eval_expression_missing_variable() {
        let f = parse_expression("x + z").unwrap();
        assert_eq!(f.eval_expression(&["x", "y"], &[1.0, 2.0]), None);
        assert_eq!(f.eval_expression(&["x", "z"], &[1.0, 2.0]), Some(3.0));
    }

    #[test]
    fn test_eval_expression_domain_errors_are_values() {
        let f = parse_expression("1/x").unwrap();
        assert!(at(&f, 0.0, 0.0).is_infinite());
        let f = parse_expression("log(x)").unwrap();
        assert!(at(&f, -1.0, 0.0).is_nan());
        let f = parse_expression("cot(x)").unwrap();
        assert_relative_eq!(at(&f, 0.5, 0.0), 1.0 / 0.5_f64.tan(), epsilon = 1e-12);
    }
}
