//! Critical points of f(x, y): solve grad f = 0, then classify each root with the
//! second-derivative test on the Hessian determinant H = fxx*fyy - fxy^2.
use crate::errors::SolverFailure;
use crate::numerical::NR::SolveOptions;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_traits::SymbolicEngine;
use itertools::iproduct;
use log::{debug, info};
use ndarray::Array1;
use std::time::Duration;
use strum_macros::{Display, EnumIter};
use tabled::{builder::Builder, settings::Style};

/// `|H|` at or below `HESSIAN_ZERO_TOLERANCE * max(1, |fxx*fyy|, fxy^2)` counts as `H == 0`.
pub const HESSIAN_ZERO_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Classification {
    Minimum,
    Maximum,
    Saddle,
    Indeterminate,
}

pub fn hessian_determinant(fxx: f64, fyy: f64, fxy: f64) -> f64 {
    fxx * fyy - fxy * fxy
}

/// Second-derivative test.
///
/// H > 0 and fxx > 0 is a minimum, H > 0 and fxx <= 0 a maximum, H < 0 a saddle and
/// H == 0 (within tolerance) is indeterminate.
pub fn classify(fxx: f64, fyy: f64, fxy: f64) -> Classification {
    let h = hessian_determinant(fxx, fyy, fxy);
    let scale = 1.0_f64.max((fxx * fyy).abs()).max(fxy * fxy);
    if h.abs() <= HESSIAN_ZERO_TOLERANCE * scale {
        Classification::Indeterminate
    } else if h > 0.0 && fxx > 0.0 {
        Classification::Minimum
    } else if h > 0.0 {
        Classification::Maximum
    } else {
        Classification::Saddle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriticalPoint {
    pub x: f64,
    pub y: f64,
    /// f(x, y)
    pub value: f64,
    pub fxx: f64,
    pub fyy: f64,
    pub fxy: f64,
    pub hessian_det: f64,
    pub classification: Classification,
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// region the solver seeds are spread over, widened by `margin` on each side
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub margin: f64,
    pub seeds_per_axis: usize,
    pub timeout: Duration,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            x_range: (0.0, 10.0),
            y_range: (-5.0, 5.0),
            margin: 0.5,
            seeds_per_axis: 9,
            timeout: Duration::from_secs(2),
            tolerance: 1e-10,
            max_iterations: 100,
        }
    }
}

impl AnalysisOptions {
    /// Grid of starting points over the widened domain, plus the origin.
    pub fn seeds(&self) -> Vec<Vec<f64>> {
        let widen = |(lo, hi): (f64, f64)| {
            let pad = (hi - lo).abs() * self.margin;
            Array1::linspace(lo - pad, hi + pad, self.seeds_per_axis.max(2))
        };
        let xs = widen(self.x_range);
        let ys = widen(self.y_range);
        let mut seeds: Vec<Vec<f64>> = vec![vec![0.0, 0.0]];
        seeds.extend(iproduct!(xs.iter(), ys.iter()).map(|(x, y)| vec![*x, *y]));
        seeds
    }
}

#[derive(Debug, Clone)]
pub struct CriticalPointAnalysis {
    /// simplified partial derivatives
    pub fx: Expr,
    pub fy: Expr,
    pub points: Vec<CriticalPoint>,
    /// why `points` is empty, when the solver gave up
    pub failure: Option<SolverFailure>,
}

/// Finds and classifies the critical points of `expr` in the variables `x` and `y`.
///
/// Solver trouble never surfaces as an error: the analysis carries an empty point list
/// and the reason in `failure`.
pub fn analyze<E: SymbolicEngine + ?Sized>(
    engine: &E,
    expr: &Expr,
    x: &str,
    y: &str,
    options: &AnalysisOptions,
) -> CriticalPointAnalysis {
    let fx = engine.simplify(&engine.diff(expr, x));
    let fy = engine.simplify(&engine.diff(expr, y));
    let solve_options = SolveOptions {
        seeds: options.seeds(),
        tolerance: options.tolerance,
        max_iterations: options.max_iterations,
        timeout: options.timeout,
    };
    let roots = match engine.solve(&[fx.clone(), fy.clone()], &[x, y], &solve_options) {
        Ok(roots) => roots,
        Err(failure) => {
            info!("critical point search stopped: {}", failure);
            return CriticalPointAnalysis { fx, fy, points: Vec::new(), failure: Some(failure) };
        }
    };

    let fxx = engine.simplify(&engine.diff(&fx, x));
    let fyy = engine.simplify(&engine.diff(&fy, y));
    let fxy = engine.simplify(&engine.diff(&fx, y));
    let vars = [x, y];
    let points: Vec<CriticalPoint> = roots
        .iter()
        .filter_map(|root| critical_point_at(expr, [&fxx, &fyy, &fxy], &vars, root))
        .collect();
    info!("{} critical point(s) found", points.len());
    CriticalPointAnalysis { fx, fy, points, failure: None }
}

/// Evaluates f and its second derivatives at a root of the gradient and classifies it.
/// `None` when any of those values is not a finite real number.
fn critical_point_at(
    expr: &Expr,
    [fxx, fyy, fxy]: [&Expr; 3],
    vars: &[&str],
    root: &[f64],
) -> Option<CriticalPoint> {
    let at = |e: &Expr| e.eval_expression(vars, root).unwrap_or(f64::NAN);
    let (value, dxx, dyy, dxy) = (at(expr), at(fxx), at(fyy), at(fxy));
    if [root[0], root[1], value, dxx, dyy, dxy].iter().any(|v| !v.is_finite()) {
        debug!("dropping non-real critical point candidate {:?}", root);
        return None;
    }
    Some(CriticalPoint {
        x: root[0],
        y: root[1],
        value,
        fxx: dxx,
        fyy: dyy,
        fxy: dxy,
        hessian_det: hessian_determinant(dxx, dyy, dxy),
        classification: classify(dxx, dyy, dxy),
    })
}

/// Critical points as a rounded table, one row per point.
pub fn critical_points_table(points: &[CriticalPoint]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["x", "y", "f(x, y)", "fxx", "fyy", "fxy", "H", "type"].map(String::from));
    for p in points {
        builder.push_record([
            format!("{:.6}", p.x),
            format!("{:.6}", p.y),
            format!("{:.6}", p.value),
            format!("{:.4}", p.fxx),
            format!("{:.4}", p.fyy),
            format!("{:.4}", p.fxy),
            format!("{:.4}", p.hessian_det),
            p.classification.to_string(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::parse_expression;
    use crate::symbolic::symbolic_traits::NativeEngine;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn analysis(raw: &str) -> CriticalPointAnalysis {
        let expr = parse_expression(raw).unwrap();
        analyze(&NativeEngine, &expr, "x", "y", &AnalysisOptions::default())
    }

    #[test]
    fn test_classify_rules() {
        assert_eq!(classify(2.0, 2.0, 0.0), Classification::Minimum);
        assert_eq!(classify(-2.0, -2.0, 0.0), Classification::Maximum);
        assert_eq!(classify(2.0, -2.0, 0.0), Classification::Saddle);
        assert_eq!(classify(0.0, 0.0, 1.0), Classification::Saddle);
        assert_eq!(classify(1.0, 1.0, 1.0), Classification::Indeterminate);
        assert_eq!(classify(0.0, 5.0, 0.0), Classification::Indeterminate);
        // H > 0 forces fxx != 0, so "fxx <= 0" only ever sees negative values
        assert_eq!(classify(-1.0, -3.0, 1.0), Classification::Maximum);
    }

    #[test]
    fn test_classify_tolerance_is_relative() {
        // 1e6 * 1e6 - (1e6)^2 + tiny rounding stays indeterminate
        assert_eq!(classify(1e6, 1e6, 1e6 + 1e-6), Classification::Indeterminate);
        assert_eq!(classify(1e-3, 1e-3, 0.0), Classification::Minimum);
    }

    #[test]
    fn test_classification_names() {
        let names: Vec<String> = Classification::iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["Minimum", "Maximum", "Saddle", "Indeterminate"]);
    }

    #[test]
    fn test_paraboloid_has_single_minimum() {
        let result = analysis("x**2 + y**2");
        assert_eq!(result.fx.to_string(), "2*x");
        assert_eq!(result.fy.to_string(), "2*y");
        assert_eq!(result.failure, None);
        assert_eq!(result.points.len(), 1);
        let p = &result.points[0];
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!(p.classification, Classification::Minimum);
        assert_relative_eq!(p.hessian_det, 4.0);
        assert_relative_eq!(p.value, 0.0);
    }

    #[test]
    fn test_hyperbolic_paraboloid_is_saddle() {
        let result = analysis("x**2 - y**2");
        assert_eq!(result.points.len(), 1);
        let p = &result.points[0];
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!(p.classification, Classification::Saddle);
        assert_relative_eq!(p.hessian_det, -4.0);
    }

    #[test]
    fn test_gaussian_maximum() {
        let result = analysis("exp(-x**2 - y**2)");
        let p = result
            .points
            .iter()
            .find(|p| p.x.abs() < 1e-6 && p.y.abs() < 1e-6)
            .expect("maximum at the origin");
        assert_eq!(p.classification, Classification::Maximum);
        assert_relative_eq!(p.value, 1.0);
    }

    #[test]
    fn test_shifted_minimum() {
        let result = analysis("(x - 3)**2 + (y + 1)**2 + 2");
        assert_eq!(result.points.len(), 1);
        let p = &result.points[0];
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-9);
        assert_relative_eq!(p.value, 2.0, epsilon = 1e-9);
        assert_eq!(p.classification, Classification::Minimum);
    }

    #[test]
    fn test_degenerate_point_is_indeterminate() {
        let result = analysis("x**4 + y**4");
        assert_eq!(result.points.len(), 1);
        assert_eq!(result.points[0].classification, Classification::Indeterminate);
    }

    #[test]
    fn test_solver_failure_gives_empty_list() {
        // fy is identically zero
        let result = analysis("x**2");
        assert!(result.points.is_empty());
        assert_eq!(result.failure, Some(SolverFailure::NonIsolated));
        let result = analysis("5");
        assert!(result.points.is_empty());
        assert!(result.failure.is_some());
    }

    #[test]
    fn test_no_real_solutions() {
        // grad = (2x + 1, 1) never vanishes
        let result = analysis("x**2 + x + y");
        assert!(result.points.is_empty());
        assert_eq!(result.failure, None);
    }

    #[test]
    fn test_timeout_gives_empty_list() {
        let expr = parse_expression("sin(x) * cos(y)").unwrap();
        let options = AnalysisOptions { timeout: Duration::ZERO, ..AnalysisOptions::default() };
        let result = analyze(&NativeEngine, &expr, "x", "y", &options);
        assert!(result.points.is_empty());
        assert_eq!(result.failure, Some(SolverFailure::Timeout));
    }

    #[test]
    fn test_table_lists_every_point() {
        let result = analysis("x**2 - y**2");
        let table = critical_points_table(&result.points);
        assert!(table.contains("Saddle"));
        assert!(table.contains("f(x, y)"));
    }

    #[test]
    fn test_ring_of_minima_is_not_isolated() {
        let expr = parse_expression("(x**2 + y**2 - 1)**2").unwrap();
        let options =
            AnalysisOptions { x_range: (-2.0, 2.0), y_range: (-2.0, 2.0), ..AnalysisOptions::default() };
        let result = analyze(&NativeEngine, &expr, "x", "y", &options);
        assert_eq!(result.failure, Some(SolverFailure::NonIsolated));
        assert!(result.points.is_empty());
    }

    #[test]
    fn test_candidate_outside_the_domain_is_dropped() {
        let engine = NativeEngine;
        let expr = parse_expression("log(x - 1) + y**2").unwrap();
        let second = |a: &str, b: &str| engine.simplify(&engine.diff(&engine.diff(&expr, a), b));
        let (fxx, fyy, fxy) = (second("x", "x"), second("y", "y"), second("x", "y"));
        let vars = ["x", "y"];
        // log(-1) is not real
        assert_eq!(critical_point_at(&expr, [&fxx, &fyy, &fxy], &vars, &[0.0, 0.0]), None);
        assert_eq!(critical_point_at(&expr, [&fxx, &fyy, &fxy], &vars, &[f64::NAN, 0.0]), None);
        let p = critical_point_at(&expr, [&fxx, &fyy, &fxy], &vars, &[2.0, 0.0]).unwrap();
        assert_relative_eq!(p.value, 0.0);
        assert_relative_eq!(p.fxx, -1.0);
        assert_relative_eq!(p.fyy, 2.0);
        assert_eq!(p.classification, Classification::Saddle);
    }
}
