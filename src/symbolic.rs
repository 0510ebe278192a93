#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// let parsed_expression = parse_expression("np.sin(x) * y**2").unwrap();
/// assert_eq!(parsed_expression.to_string(), "sin(x)*y**2");
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the expression tree shared by the whole crate
/// 2) substitutes numbers for symbols
/// 3) turns a symbolic expression into a string expression for printing and control results
pub mod symbolic_engine;
/// analytical derivatives and pointwise evaluation
///# Example#
/// ```
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// let f = parse_expression("x**2 + 3*x*y").unwrap();
/// let df_dy = f.diff("y").simplify();
/// assert_eq!(df_dy.eval_expression(&["x", "y"], &[2.0, 0.0]), Some(6.0));
/// ```
pub mod symbolic_engine_derivatives;
/// turning a symbolic expression into a function evaluated over ndarray arrays
///# Example#
/// ```
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// use RustedContours::symbolic::symbolic_lambdify::BivariateFunction;
/// let f = BivariateFunction::new(parse_expression("1/x").unwrap()).unwrap();
/// assert!(f.eval(0.0, 1.0).is_infinite());
/// ```
pub mod symbolic_lambdify;
/// one-sided and directional limits, estimated numerically
pub mod symbolic_limits;
pub mod symbolic_simplify;
/// the `SymbolicEngine` trait: the seam between the plotting session and a CAS backend
pub mod symbolic_traits;
