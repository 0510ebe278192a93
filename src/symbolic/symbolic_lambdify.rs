//! LAMBDIFICATION - Converting Symbolic Expressions to Executable Functions
//!
//! An `Expr` is compiled once into a `Lambda` tree with variables resolved to argument
//! indices, and `BivariateFunction` wraps the lambda bound to `[x, y]` with numpy-style
//! array evaluation.
use crate::errors::CompileError;
use crate::symbolic::symbolic_engine::Expr;
use ndarray::{Array2, ArrayD, ArrayViewD, ErrorKind, IxDyn, ShapeError, Zip, arr1};
use std::f64::consts::PI;

/// Expression tree with variables replaced by positions in the argument slice.
#[derive(Clone, Debug)]
pub enum Lambda {
    Var(usize),
    Const(f64),
    Add(Box<Lambda>, Box<Lambda>),
    Sub(Box<Lambda>, Box<Lambda>),
    Mul(Box<Lambda>, Box<Lambda>),
    Div(Box<Lambda>, Box<Lambda>),
    Pow(Box<Lambda>, Box<Lambda>),
    Exp(Box<Lambda>),
    Ln(Box<Lambda>),
    Sin(Box<Lambda>),
    Cos(Box<Lambda>),
    Tg(Box<Lambda>),
    Ctg(Box<Lambda>),
    ArcSin(Box<Lambda>),
    ArcCos(Box<Lambda>),
    ArcTg(Box<Lambda>),
    ArcCtg(Box<Lambda>),
    Abs(Box<Lambda>),
}

impl Expr {
    /// Compiles the expression for arguments ordered as `vars`.
    ///
    /// Every free symbol must be listed in `vars`; the ones that are not are reported
    /// together in `CompileError::Substitution`.
    pub fn compile(&self, vars: &[&str]) -> Result<Lambda, CompileError> {
        let unresolved: Vec<String> = self
            .all_arguments_are_variables()
            .into_iter()
            .filter(|name| !vars.contains(&name.as_str()))
            .collect();
        if !unresolved.is_empty() {
            return Err(CompileError::Substitution { unresolved });
        }
        self.compile_node(vars)
            .ok_or_else(|| CompileError::Substitution { unresolved: Vec::new() })
    }

    fn compile_node(&self, vars: &[&str]) -> Option<Lambda> {
        let c = |e: &Expr| e.compile_node(vars).map(Box::new);
        let lambda = match self {
            Expr::Var(name) => Lambda::Var(vars.iter().position(|v| v == name)?),
            Expr::Const(v) => Lambda::Const(*v),
            Expr::Add(a, b) => Lambda::Add(c(a.as_ref())?, c(b.as_ref())?),
            Expr::Sub(a, b) => Lambda::Sub(c(a.as_ref())?, c(b.as_ref())?),
            Expr::Mul(a, b) => Lambda::Mul(c(a.as_ref())?, c(b.as_ref())?),
            Expr::Div(a, b) => Lambda::Div(c(a.as_ref())?, c(b.as_ref())?),
            Expr::Pow(a, b) => Lambda::Pow(c(a.as_ref())?, c(b.as_ref())?),
            Expr::Exp(e) => Lambda::Exp(c(e.as_ref())?),
            Expr::Ln(e) => Lambda::Ln(c(e.as_ref())?),
            Expr::sin(e) => Lambda::Sin(c(e.as_ref())?),
            Expr::cos(e) => Lambda::Cos(c(e.as_ref())?),
            Expr::tg(e) => Lambda::Tg(c(e.as_ref())?),
            Expr::ctg(e) => Lambda::Ctg(c(e.as_ref())?),
            Expr::arcsin(e) => Lambda::ArcSin(c(e.as_ref())?),
            Expr::arccos(e) => Lambda::ArcCos(c(e.as_ref())?),
            Expr::arctg(e) => Lambda::ArcTg(c(e.as_ref())?),
            Expr::arcctg(e) => Lambda::ArcCtg(c(e.as_ref())?),
            Expr::Abs(e) => Lambda::Abs(c(e.as_ref())?),
        };
        Some(lambda)
    }
}

impl Lambda {
    #[inline(always)]
    pub fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Lambda::Var(i) => args[*i],
            Lambda::Const(v) => *v,
            Lambda::Add(a, b) => a.eval(args) + b.eval(args),
            Lambda::Sub(a, b) => a.eval(args) - b.eval(args),
            Lambda::Mul(a, b) => a.eval(args) * b.eval(args),
            Lambda::Div(a, b) => a.eval(args) / b.eval(args),
            Lambda::Pow(a, b) => a.eval(args).powf(b.eval(args)),
            Lambda::Exp(e) => e.eval(args).exp(),
            Lambda::Ln(e) => e.eval(args).ln(),
            Lambda::Sin(e) => e.eval(args).sin(),
            Lambda::Cos(e) => e.eval(args).cos(),
            Lambda::Tg(e) => e.eval(args).tan(),
            Lambda::Ctg(e) => 1.0 / e.eval(args).tan(),
            Lambda::ArcSin(e) => e.eval(args).asin(),
            Lambda::ArcCos(e) => e.eval(args).acos(),
            Lambda::ArcTg(e) => e.eval(args).atan(),
            Lambda::ArcCtg(e) => (PI / 2.0) - e.eval(args).atan(),
            Lambda::Abs(e) => e.eval(args).abs(),
        }
    }
}

/// Result shape of broadcasting two shapes by numpy rules: dimensions are aligned from
/// the right and each pair must be equal or contain a 1.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>, ShapeError> {
    let ndim = a.len().max(b.len());
    let dim_at = |shape: &[usize], i: usize| {
        let offset = ndim - shape.len();
        if i < offset { 1 } else { shape[i - offset] }
    };
    (0..ndim)
        .map(|i| match (dim_at(a, i), dim_at(b, i)) {
            (l, r) if l == r => Ok(l),
            (1, r) => Ok(r),
            (l, 1) => Ok(l),
            _ => Err(ShapeError::from_kind(ErrorKind::IncompatibleShape)),
        })
        .collect()
}

/// Numeric function of `x` and `y`, compiled from a symbolic expression whose only free
/// symbols are `x` and `y`.
///
/// Evaluation is element-wise: division by zero gives Inf, domain errors give NaN, and
/// neither is reported as an error.
#[derive(Clone, Debug)]
pub struct BivariateFunction {
    expr: Expr,
    lambda: Lambda,
}

impl BivariateFunction {
    pub fn new(expr: Expr) -> Result<Self, CompileError> {
        let lambda = expr.compile(&["x", "y"])?;
        Ok(Self { expr, lambda })
    }

    /// The expression this function was compiled from.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates over two arrays broadcast against each other.
    pub fn call(&self, x: ArrayViewD<f64>, y: ArrayViewD<f64>) -> Result<ArrayD<f64>, ShapeError> {
        let shape = broadcast_shape(x.shape(), y.shape())?;
        let incompatible = || ShapeError::from_kind(ErrorKind::IncompatibleShape);
        let xb = x.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;
        let yb = y.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;
        Ok(Zip::from(&xb)
            .and(&yb)
            .map_collect(|&xv, &yv| self.lambda.eval(&[xv, yv])))
    }

    /// Evaluates over a meshgrid pair, through the same array path as `call`.
    pub fn call_grid(&self, xx: &Array2<f64>, yy: &Array2<f64>) -> Result<Array2<f64>, ShapeError> {
        self.call(xx.view().into_dyn(), yy.view().into_dyn())?
            .into_dimensionality()
    }

    /// Scalar evaluation, routed through the array path with shape `(1,)`.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let xs = arr1(&[x]).into_dyn();
        let ys = arr1(&[y]).into_dyn();
        self.call(xs.view(), ys.view())
            .ok()
            .and_then(|values| values.iter().next().copied())
            .unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};

    fn function(raw: &str) -> BivariateFunction {
        BivariateFunction::new(parse_expression(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_compile_reports_all_unresolved_symbols() {
        let expr = parse_expression("x + y + z*w").unwrap();
        match expr.compile(&["x", "y"]) {
            Err(CompileError::Substitution { unresolved }) => {
                assert_eq!(unresolved, vec!["w".to_string(), "z".to_string()])
            }
            other => panic!("expected substitution error, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_eval() {
        let expr = parse_expression("x**2 + 2*x*y + Abs(y)").unwrap();
        let lambda = expr.compile(&["x", "y"]).unwrap();
        assert_eq!(lambda.eval(&[3.0, -1.0]), 9.0 - 6.0 + 1.0);
        assert_eq!(lambda.eval(&[1.0, 1.0]), 4.0);
    }

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[3, 1], &[4]).unwrap(), vec![3, 4]);
        assert_eq!(broadcast_shape(&[1], &[5]).unwrap(), vec![5]);
        assert_eq!(broadcast_shape(&[], &[2, 2]).unwrap(), vec![2, 2]);
        assert!(broadcast_shape(&[3], &[4]).is_err());
    }

    #[test]
    fn test_call_broadcasts_column_against_row() {
        let f = function("x + 10*y");
        let x = Array1::from(vec![0.0, 1.0, 2.0]).into_dyn();
        let y = array![[0.0], [1.0]].into_dyn();
        let z = f.call(x.view(), y.view()).unwrap();
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z[[1, 2]], 12.0);
        assert_eq!(z[[0, 1]], 1.0);
    }

    #[test]
    fn test_call_incompatible_shapes() {
        let f = function("x*y");
        let x = Array1::<f64>::zeros(3).into_dyn();
        let y = Array1::<f64>::zeros(4).into_dyn();
        assert!(f.call(x.view(), y.view()).is_err());
    }

    #[test]
    fn test_scalar_matches_grid() {
        let f = function("sin(x) * cos(y) + exp(-x**2 - y**2)");
        let xx = array![[0.0, 0.5], [0.0, 0.5]];
        let yy = array![[-1.0, -1.0], [2.0, 2.0]];
        let grid = f.call_grid(&xx, &yy).unwrap();
        for ((i, j), value) in grid.indexed_iter() {
            assert_relative_eq!(f.eval(xx[[i, j]], yy[[i, j]]), *value);
        }
    }

    #[test]
    fn test_domain_errors_are_values() {
        let f = function("1/x");
        assert!(f.eval(0.0, 0.0).is_infinite());
        let g = function("-1/x");
        assert_eq!(g.eval(0.0, 1.0), f64::NEG_INFINITY);
        assert!(function("x/x").eval(0.0, 0.0).is_nan());
        let h = function("log(x) + sqrt(y)");
        let values = h.call_grid(&Array2::from_elem((1, 2), -1.0), &Array2::zeros((1, 2))).unwrap();
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_constant_function() {
        let f = function("3");
        assert_eq!(f.eval(1.0, 2.0), 3.0);
        assert_eq!(f.expr(), &Expr::Const(3.0));
    }
}
