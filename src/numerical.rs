///  Damped Newton-Raphson for square systems of symbolic equations, with multi-start
///  root search
///  Example#1
/// ```
/// use RustedContours::numerical::NR::NR;
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// let eqs = vec![parse_expression("2*x - 4").unwrap(), parse_expression("y + 1").unwrap()];
/// let mut NR_instanse = NR::new();
/// NR_instanse.set_equation_system(eqs, vec!["x".to_string(), "y".to_string()], 1e-10, 100);
/// NR_instanse.eq_generate().unwrap();
/// let roots = NR_instanse.find_all_roots(&[vec![0.0, 0.0], vec![10.0, 10.0]]).unwrap();
/// assert_eq!(roots, vec![vec![2.0, -1.0]]);
/// ```
pub mod NR;
/// stationary points of f(x, y) and their classification by the second-derivative test
/// Example#
/// ```
/// use RustedContours::numerical::critical_points::{analyze, AnalysisOptions, Classification};
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// use RustedContours::symbolic::symbolic_traits::NativeEngine;
/// let f = parse_expression("x**2 - y**2").unwrap();
/// let analysis = analyze(&NativeEngine, &f, "x", "y", &AnalysisOptions::default());
/// assert_eq!(analysis.points[0].classification, Classification::Saddle);
/// ```
pub mod critical_points;
/// evaluating a function of x and y on a rectangular grid
pub mod sampler;
