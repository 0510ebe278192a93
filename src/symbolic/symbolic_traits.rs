// SYMBOLIC TRAITS //////////////////////////////////////////////////////////////////
// Everything the plotting session asks of a computer algebra backend goes through
// `SymbolicEngine`. The native engine below is built on `Expr`; add other engines here
// as needed.

use crate::errors::{CompileError, ParseError, SolverFailure};
use crate::numerical::NR::{NR, SolveOptions};
use crate::symbolic::parse_expr::parse_expression;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::BivariateFunction;
use crate::symbolic::symbolic_limits::{Limit, LimitPoint};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::time::Instant;
use strum_macros::{Display, EnumString};

pub trait SymbolicEngine {
    fn parse(&self, raw: &str) -> Result<Expr, ParseError>;
    /// Replaces the named symbols by their values. Names absent from `expr` are ignored.
    fn substitute(&self, expr: &Expr, values: &BTreeMap<String, f64>) -> Expr;
    fn diff(&self, expr: &Expr, var: &str) -> Expr;
    fn simplify(&self, expr: &Expr) -> Expr;
    /// Sorted, deduplicated names of the free symbols.
    fn free_symbols(&self, expr: &Expr) -> Vec<String>;
    /// Real solutions of `equations == 0` for `unknowns`, sorted.
    ///
    /// `Ok(vec![])` when there is provably or numerically no solution, `Err` when the
    /// search could not give an answer.
    fn solve(
        &self,
        equations: &[Expr],
        unknowns: &[&str],
        options: &SolveOptions,
    ) -> Result<Vec<Vec<f64>>, SolverFailure>;
    fn limit(&self, expr: &Expr, var: &str, point: LimitPoint) -> Limit;
    /// `lim y->b (lim x->a expr)`
    fn iterated_limit(&self, expr: &Expr, x: &str, a: f64, y: &str, b: f64) -> Limit;
    fn pretty(&self, expr: &Expr) -> String;
    /// Array-evaluable function of x and y.
    fn lambdify(&self, expr: &Expr) -> Result<BivariateFunction, CompileError>;
}

///////////////// IMPLEMENTATION OF THE TRAIT FOR THE NATIVE ENGINE /////////////////////////
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl SymbolicEngine for NativeEngine {
    fn parse(&self, raw: &str) -> Result<Expr, ParseError> {
        parse_expression(raw)
    }
    fn substitute(&self, expr: &Expr, values: &BTreeMap<String, f64>) -> Expr {
        expr.set_variable_from_map(values)
    }
    fn diff(&self, expr: &Expr, var: &str) -> Expr {
        expr.diff(var)
    }
    fn simplify(&self, expr: &Expr) -> Expr {
        expr.simplify()
    }
    fn free_symbols(&self, expr: &Expr) -> Vec<String> {
        expr.all_arguments_are_variables()
    }

    fn solve(
        &self,
        equations: &[Expr],
        unknowns: &[&str],
        options: &SolveOptions,
    ) -> Result<Vec<Vec<f64>>, SolverFailure> {
        let equations: Vec<Expr> = equations.iter().map(|eq| eq.simplify()).collect();
        if equations.iter().any(|eq| eq.is_zero()) {
            // one equation gives no constraint: the solution set is a curve or the plane
            return Err(SolverFailure::NonIsolated);
        }
        if equations.iter().any(|eq| eq.as_const().is_some()) {
            debug!("constant nonzero equation, the system has no solution");
            return Ok(Vec::new());
        }
        let mut NR_instanse = NR::new();
        NR_instanse.set_equation_system(
            equations,
            unknowns.iter().map(|u| u.to_string()).collect(),
            options.tolerance,
            options.max_iterations,
        );
        NR_instanse.set_solver_params(None, Some(Instant::now() + options.timeout));
        if let Err(e) = NR_instanse.eq_generate() {
            warn!("equations could not be compiled for the solver: {}", e);
            return Ok(Vec::new());
        }
        NR_instanse.find_all_roots(&options.seeds)
    }

    fn limit(&self, expr: &Expr, var: &str, point: LimitPoint) -> Limit {
        expr.limit(var, point)
    }
    fn iterated_limit(&self, expr: &Expr, x: &str, a: f64, y: &str, b: f64) -> Limit {
        expr.iterated_limit(x, a, y, b)
    }
    fn pretty(&self, expr: &Expr) -> String {
        expr.to_string()
    }
    fn lambdify(&self, expr: &Expr) -> Result<BivariateFunction, CompileError> {
        BivariateFunction::new(expr.clone())
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
// FACTORY METHODS  ////////////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolicEngineType {
    #[default]
    Native,
    // Add other engines here as needed
}

pub fn get_symbolic_engine(engine_type: SymbolicEngineType) -> &'static dyn SymbolicEngine {
    match engine_type {
        SymbolicEngineType::Native => &NativeEngine,
    }
}

//___________________________________TESTS____________________________________
