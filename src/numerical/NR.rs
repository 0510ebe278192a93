//! Damped Newton-Raphson solver for square systems of symbolic equations.
//!
//! The step is solved by LU; when the Jacobian is singular the minimum-norm least squares
//! step (SVD) is used instead, so a start on a line of solutions still lands on it.
//!
//! Example#
//! ```
//! use RustedContours::numerical::NR::NR;
//! use RustedContours::symbolic::parse_expr::parse_expression;
//! let eqs = vec![parse_expression("x^2+y^2-10").unwrap(), parse_expression("x-y-4").unwrap()];
//! let mut NR_instanse = NR::new();
//! NR_instanse.set_equation_system(eqs, vec!["x".to_string(), "y".to_string()], 1e-10, 100);
//! NR_instanse.eq_generate().unwrap();
//! let solution = NR_instanse.main_loop(&[1.0, 1.0]).unwrap().unwrap();
//! assert!((solution[0] - 3.0).abs() < 1e-8 && (solution[1] + 1.0).abs() < 1e-8);
//! ```
use crate::errors::{CompileError, SolverFailure};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::Lambda;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tabled::{builder::Builder, settings::Style};

/// Settings for a multi-start solve.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// starting points, one vector per start, ordered like the unknowns
    pub seeds: Vec<Vec<f64>>,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// wall-clock budget for all starts together
    pub timeout: Duration,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            seeds: Vec::new(),
            tolerance: 1e-10,
            max_iterations: 100,
            timeout: Duration::from_secs(2),
        }
    }
}

// coordinates this close to zero are reported as exactly zero
const SNAP_TO_ZERO: f64 = 1e-9;
// more distinct roots than this with a singular Jacobian means a continuum of solutions
const CONTINUUM_ROOTS: usize = 3;

pub struct NR {
    pub eq_system: Vec<Expr>,       // vector of equations
    pub values: Vec<String>,        // vector of unknowns
    pub symbolic_jacobian: Vec<Vec<Expr>>,
    pub tolerance: f64,             // tolerance
    pub max_iterations: usize,      // max number of iterations
    pub dumping_factor: f64,        // smallest step fraction tried by the line search
    pub i: usize,                   // iteration counter
    pub jac: DMatrix<f64>,          // jacobian matrix
    pub fun_vector: DVector<f64>,   // vector of functions
    deadline: Option<Instant>,
    residuals: Vec<Lambda>,
    jacobian: Vec<Vec<Lambda>>,
    calc_statistics: HashMap<String, usize>,
}

impl Default for NR {
    fn default() -> Self {
        Self::new()
    }
}

impl NR {
    pub fn new() -> NR {
        NR {
            eq_system: Vec::new(),
            values: Vec::new(),
            symbolic_jacobian: Vec::new(),
            tolerance: 1e-10,
            max_iterations: 100,
            dumping_factor: 1.0 / 64.0,
            i: 0,
            jac: DMatrix::zeros(0, 0),
            fun_vector: DVector::zeros(0),
            deadline: None,
            residuals: Vec::new(),
            jacobian: Vec::new(),
            calc_statistics: HashMap::new(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////////////
    /// Basic method to set the equation system
    pub fn set_equation_system(
        &mut self,
        eq_system: Vec<Expr>,
        unknowns: Vec<String>,
        tolerance: f64,
        max_iterations: usize,
    ) {
        self.eq_system = eq_system;
        self.values = unknowns;
        self.tolerance = tolerance.abs();
        self.max_iterations = max_iterations.max(1);
    }

    pub fn set_solver_params(&mut self, damping_factor: Option<f64>, deadline: Option<Instant>) {
        if let Some(damping_factor) = damping_factor {
            self.dumping_factor = damping_factor.clamp(1e-6, 1.0);
        }
        self.deadline = deadline;
    }

    /// Builds the symbolic Jacobian and compiles residuals and Jacobian entries.
    pub fn eq_generate(&mut self) -> Result<(), CompileError> {
        let args: Vec<&str> = self.values.iter().map(|x| x.as_str()).collect();
        self.symbolic_jacobian = self
            .eq_system
            .iter()
            .map(|eq| args.iter().map(|var| eq.diff(var).simplify()).collect())
            .collect();
        self.residuals = self
            .eq_system
            .iter()
            .map(|eq| eq.compile(&args))
            .collect::<Result<_, _>>()?;
        self.jacobian = self
            .symbolic_jacobian
            .iter()
            .map(|row| row.iter().map(|entry| entry.compile(&args)).collect())
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.residuals.len(),
            self.residuals.iter().map(|f| f.eval(x.as_slice())),
        )
    }

    fn evaluate_jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let n = self.jacobian.len();
        let m = self.values.len();
        DMatrix::from_fn(n, m, |i, j| self.jacobian[i][j].eval(x.as_slice()))
    }
    /////////////////////////////////////////////////////////////////////////////////////////////
    //                ITERATIONS
    /////////////////////////////////////////////////////////////////////////////////////////////
    /// One damped Newton step. `None` when no finite step can be computed at `x`.
    pub fn iteration(&mut self, x: &DVector<f64>) -> Option<DVector<f64>> {
        self.fun_vector = self.residual(x);
        self.jac = self.evaluate_jacobian(x);
        let delta = Self::solve_linear_system(&self.jac, &self.fun_vector)?;
        let start_norm = self.fun_vector.norm();
        // backtracking on the residual norm
        let mut lambda = 1.0;
        loop {
            let candidate = x - lambda * &delta;
            let norm = self.residual(&candidate).norm();
            if norm <= start_norm || lambda <= self.dumping_factor {
                return Some(candidate);
            }
            lambda *= 0.5;
        }
    }

    /// Runs Newton from `initial_guess`.
    ///
    /// `Ok(None)` means this start did not converge; `Err(Timeout)` means the deadline passed.
    pub fn main_loop(&mut self, initial_guess: &[f64]) -> Result<Option<DVector<f64>>, SolverFailure> {
        let mut x = DVector::from_column_slice(initial_guess);
        self.i = 0;
        while self.i < self.max_iterations {
            if self.deadline.is_some_and(|deadline| Instant::now() > deadline) {
                warn!("Newton solver deadline reached after {} iterations", self.i);
                return Err(SolverFailure::Timeout);
            }
            let residual_norm = self.residual(&x).norm();
            if !residual_norm.is_finite() {
                return Ok(None);
            }
            let Some(new_x) = self.iteration(&x) else {
                // no usable step: accept only if we are already sitting on a root
                if residual_norm < self.tolerance {
                    return Ok(Some(x));
                }
                return Ok(None);
            };
            let error = (&new_x - &x).norm();
            x = new_x;
            self.i += 1;
            if error < self.tolerance * x.norm().max(1.0) && self.residual(&x).norm() < self.tolerance.sqrt() {
                return Ok(Some(x));
            }
        }
        debug!("Maximum number of iterations reached. No solution found from {:?}", initial_guess);
        Ok(None)
    }

    /// Multi-start solve: runs `main_loop` from every seed and returns the distinct roots.
    pub fn find_all_roots(&mut self, seeds: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, SolverFailure> {
        let begin = Instant::now();
        let mut roots: Vec<Vec<f64>> = Vec::new();
        let mut singular = 0usize;
        let mut converged = 0usize;
        let mut iterations = 0usize;
        for seed in seeds {
            let outcome = self.main_loop(seed)?;
            iterations += self.i;
            let Some(root) = outcome else { continue };
            converged += 1;
            let root: Vec<f64> = root.iter().map(|v| snap_to_zero(*v)).collect();
            if root.iter().any(|v| !v.is_finite()) {
                continue;
            }
            let duplicate = roots.iter().any(|known| is_same_root(known, &root));
            if !duplicate {
                if self.is_singular_at(&root) {
                    singular += 1;
                }
                roots.push(root);
            }
        }
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        self.calc_statistics.clear();
        self.calc_statistics.insert("seeds".to_string(), seeds.len());
        self.calc_statistics.insert("converged starts".to_string(), converged);
        self.calc_statistics.insert("distinct roots".to_string(), roots.len());
        self.calc_statistics.insert("total iterations".to_string(), iterations);
        self.calc_statistics
            .insert("time elapsed, ms".to_string(), begin.elapsed().as_millis() as usize);
        self.calc_statistics();

        if singular > CONTINUUM_ROOTS {
            return Err(SolverFailure::NonIsolated);
        }
        Ok(roots)
    }

    fn is_singular_at(&self, root: &[f64]) -> bool {
        let jac = self.evaluate_jacobian(&DVector::from_column_slice(root));
        let scale = jac.norm().max(1.0);
        jac.is_square() && jac.clone().lu().determinant().abs() <= 1e-8 * scale * scale
    }

    fn calc_statistics(&self) {
        let stats = self.calc_statistics.clone();
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        debug!("\n \n SOLVER STATISTICS \n \n {}", table.to_string());
    }
    //////////////////////////////////////////////////////////////////////////////////////////////
    //                 LINEAR SYSTEM SOLVERS
    //////////////////////////////////////////////////////////////////////////////////////////////
    /// LU solve of `A x = b`, falling back to the minimum-norm least squares solution
    /// when `A` is singular.
    pub fn solve_linear_system(A: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        let finite = |x: &DVector<f64>| x.iter().all(|v| v.is_finite());
        if let Some(x) = A.clone().lu().solve(b).filter(finite) {
            return Some(x);
        }
        if !A.iter().all(|v| v.is_finite()) {
            return None;
        }
        A.clone().svd(true, true).solve(b, 1e-12).ok().filter(finite)
    }
}

fn snap_to_zero(v: f64) -> f64 {
    if v.abs() < SNAP_TO_ZERO { 0.0 } else { v }
}

fn is_same_root(a: &[f64], b: &[f64]) -> bool {
    let dist = a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum::<f64>().sqrt();
    let scale = a.iter().map(|v| v.abs()).fold(1.0_f64, f64::max);
    dist <= 1e-6 * scale
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     TESTS
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use approx::assert_relative_eq;

    fn solver(equations: &[&str]) -> NR {
        let eqs = equations.iter().map(|e| parse_expression(e).unwrap()).collect();
        let mut NR_instanse = NR::new();
        NR_instanse.set_equation_system(eqs, vec!["x".to_string(), "y".to_string()], 1e-10, 100);
        NR_instanse.eq_generate().unwrap();
        NR_instanse
    }

    #[test]
    fn test_NR_set_equation_sysytem() {
        let mut NR_instanse = solver(&["x^2+y^2-10", "x-y-4"]);
        let solution = NR_instanse.main_loop(&[1.0, 1.0]).unwrap().unwrap();
        assert_relative_eq!(solution[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(solution[1], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_NR_linear_system_converges_in_one_step() {
        let mut NR_instanse = solver(&["2*x", "2*y"]);
        let solution = NR_instanse.main_loop(&[5.0, -3.0]).unwrap().unwrap();
        assert_eq!(solution.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn test_find_all_roots_deduplicates() {
        let mut NR_instanse = solver(&["x^2+y^2-10", "x-y-4"]);
        let seeds = vec![vec![1.0, 1.0], vec![1.1, 0.9], vec![5.0, 5.0], vec![-3.0, 2.0]];
        let roots = NR_instanse.find_all_roots(&seeds).unwrap();
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0][0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(roots[0][1], -3.0, epsilon = 1e-8);
        assert_relative_eq!(roots[1][0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(roots[1][1], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_degenerate_minimum_snaps_to_zero() {
        // gradient of x^4 + y^4, singular Jacobian at the root
        let mut NR_instanse = solver(&["4*x^3", "4*y^3"]);
        let roots = NR_instanse.find_all_roots(&[vec![2.0, -1.0], vec![0.5, 0.5]]).unwrap();
        assert_eq!(roots, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_continuum_of_roots_is_not_isolated() {
        // gradient of (x - y)^2 vanishes on the whole line x = y
        let mut NR_instanse = solver(&["2*(x - y)", "-2*(x - y)"]);
        let seeds: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, -(i as f64) * 0.5]).collect();
        assert_eq!(NR_instanse.find_all_roots(&seeds), Err(SolverFailure::NonIsolated));
    }

    #[test]
    fn test_ring_of_roots_next_to_an_isolated_one_is_not_isolated() {
        // gradient of (x^2 + y^2 - 1)^2: a regular root at the origin and the unit circle
        let mut NR_instanse = solver(&["4*x*(x^2 + y^2 - 1)", "4*y*(x^2 + y^2 - 1)"]);
        let mut seeds = vec![vec![0.0, 0.0]];
        seeds.extend((0..8).map(|k| {
            let angle = k as f64 * std::f64::consts::PI / 4.0 + 0.3;
            vec![1.5 * angle.cos(), 1.5 * angle.sin()]
        }));
        assert_eq!(NR_instanse.find_all_roots(&seeds), Err(SolverFailure::NonIsolated));
    }

    #[test]
    fn test_deadline_in_the_past_times_out() {
        let mut NR_instanse = solver(&["x^2+y^2-10", "x-y-4"]);
        NR_instanse.set_solver_params(None, Some(Instant::now() - Duration::from_millis(1)));
        assert_eq!(NR_instanse.main_loop(&[1.0, 1.0]), Err(SolverFailure::Timeout));
    }

    #[test]
    fn test_solve_linear_system_singular_uses_minimum_norm() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = NR::solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 0.2, epsilon = 1e-10);
        assert_relative_eq!(x[1], 0.4, epsilon = 1e-10);
        let nan = DMatrix::from_element(2, 2, f64::NAN);
        assert!(NR::solve_linear_system(&nan, &b).is_none());
    }
}
