//! # Symbolic Engine Module
//!
//! Core expression tree used by the whole plotting pipeline: the parsed user function,
//! its partial derivatives and everything the analyzer solves for are `Expr` values.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - symbolic variables like "x", "y", "z"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, ..., `Abs`
//!
//! ### Key Methods
//! - `set_variable()` / `set_variable_from_map()` - substitution, returns a new tree
//! - `all_arguments_are_variables()` - sorted free symbols
//! - `diff(var)` - analytical differentiation (see `symbolic_engine_derivatives`)
//! - `simplify()` - constant folding and identities (see `symbolic_simplify`)
//!
//! Trigonometric variants keep the mathematical names (tg, ctg, arctg, arcctg); the
//! parser accepts both these and the usual programming spellings.
#![allow(non_camel_case_types)]

use std::collections::BTreeMap;
use std::f64::consts::{E, PI};
use std::fmt;

/// Expression tree. Children are boxed so that the tree can be arbitrarily deep.
///
/// # Examples
/// ```rust, ignore
/// let x = Expr::Var("x".to_string());
/// let expr = x.clone() * x + Expr::Const(2.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y", "z")
    Var(String),
    /// Numerical constant value
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// base ** exponent; square roots are `Pow(_, Const(0.5))`
    Pow(Box<Expr>, Box<Expr>),
    Exp(Box<Expr>),
    /// natural logarithm
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    tg(Box<Expr>),
    ctg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    arcctg(Box<Expr>),
    /// absolute value
    Abs(Box<Expr>),
}

// binding strength used by the printer
const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => PREC_SUM,
            Expr::Mul(lhs, _) if lhs.is_minus_one() => PREC_UNARY,
            Expr::Mul(..) | Expr::Div(..) => PREC_PRODUCT,
            Expr::Const(v) if *v < 0.0 => PREC_UNARY,
            Expr::Pow(_, exp) if exp.is_half() => PREC_ATOM,
            Expr::Pow(..) => PREC_POWER,
            _ => PREC_ATOM,
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec {
            write!(f, "(")?;
            self.fmt_bare(f)?;
            write!(f, ")")
        } else {
            self.fmt_bare(f)
        }
    }

    fn fmt_bare(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => fmt_const(*val, f),
            Expr::Add(lhs, rhs) => {
                lhs.fmt_at(f, PREC_SUM)?;
                match rhs.as_ref() {
                    Expr::Const(v) if *v < 0.0 => write!(f, " - {}", -v),
                    Expr::Mul(m, rest) if m.is_minus_one() => {
                        write!(f, " - ")?;
                        rest.fmt_at(f, PREC_PRODUCT)
                    }
                    _ => {
                        write!(f, " + ")?;
                        rhs.fmt_at(f, PREC_SUM)
                    }
                }
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_at(f, PREC_SUM)?;
                write!(f, " - ")?;
                rhs.fmt_at(f, PREC_PRODUCT)
            }
            Expr::Mul(lhs, rhs) if lhs.is_minus_one() => {
                write!(f, "-")?;
                rhs.fmt_at(f, PREC_POWER)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.fmt_at(f, PREC_PRODUCT)?;
                write!(f, "*")?;
                rhs.fmt_at(f, PREC_PRODUCT)
            }
            Expr::Div(lhs, rhs) => {
                lhs.fmt_at(f, PREC_PRODUCT)?;
                write!(f, "/")?;
                rhs.fmt_at(f, PREC_UNARY)
            }
            Expr::Pow(base, exp) if exp.is_half() => write!(f, "sqrt({})", base),
            Expr::Pow(base, exp) => {
                base.fmt_at(f, PREC_ATOM)?;
                write!(f, "**")?;
                exp.fmt_at(f, PREC_POWER)
            }
            Expr::Exp(e) => write!(f, "exp({})", e),
            Expr::Ln(e) => write!(f, "log({})", e),
            Expr::sin(e) => write!(f, "sin({})", e),
            Expr::cos(e) => write!(f, "cos({})", e),
            Expr::tg(e) => write!(f, "tan({})", e),
            Expr::ctg(e) => write!(f, "cot({})", e),
            Expr::arcsin(e) => write!(f, "asin({})", e),
            Expr::arccos(e) => write!(f, "acos({})", e),
            Expr::arctg(e) => write!(f, "atan({})", e),
            Expr::arcctg(e) => write!(f, "acot({})", e),
            Expr::Abs(e) => write!(f, "Abs({})", e),
        }
    }
}

fn fmt_const(val: f64, f: &mut fmt::Formatter) -> fmt::Result {
    if val == PI {
        write!(f, "pi")
    } else if val == E {
        write!(f, "E")
    } else if val.is_infinite() {
        write!(f, "{}oo", if val < 0.0 { "-" } else { "" })
    } else {
        write!(f, "{}", val)
    }
}

/// Pretty printing in the same `**` notation the user types.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_bare(f)
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Rebuilds the node with `f` applied to each direct child.
    /// Leaves (`Var`, `Const`) are returned unchanged.
    pub fn map_children<F: Fn(&Expr) -> Expr>(&self, f: F) -> Expr {
        let b = |e: &Expr| Box::new(f(e));
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(l, r) => Expr::Add(b(l.as_ref()), b(r.as_ref())),
            Expr::Sub(l, r) => Expr::Sub(b(l.as_ref()), b(r.as_ref())),
            Expr::Mul(l, r) => Expr::Mul(b(l.as_ref()), b(r.as_ref())),
            Expr::Div(l, r) => Expr::Div(b(l.as_ref()), b(r.as_ref())),
            Expr::Pow(l, r) => Expr::Pow(b(l.as_ref()), b(r.as_ref())),
            Expr::Exp(e) => Expr::Exp(b(e.as_ref())),
            Expr::Ln(e) => Expr::Ln(b(e.as_ref())),
            Expr::sin(e) => Expr::sin(b(e.as_ref())),
            Expr::cos(e) => Expr::cos(b(e.as_ref())),
            Expr::tg(e) => Expr::tg(b(e.as_ref())),
            Expr::ctg(e) => Expr::ctg(b(e.as_ref())),
            Expr::arcsin(e) => Expr::arcsin(b(e.as_ref())),
            Expr::arccos(e) => Expr::arccos(b(e.as_ref())),
            Expr::arctg(e) => Expr::arctg(b(e.as_ref())),
            Expr::arcctg(e) => Expr::arcctg(b(e.as_ref())),
            Expr::Abs(e) => Expr::Abs(b(e.as_ref())),
        }
    }

    /// Direct children of the node, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => vec![l.as_ref(), r.as_ref()],
            Expr::Exp(e)
            | Expr::Ln(e)
            | Expr::sin(e)
            | Expr::cos(e)
            | Expr::tg(e)
            | Expr::ctg(e)
            | Expr::arcsin(e)
            | Expr::arccos(e)
            | Expr::arctg(e)
            | Expr::arcctg(e)
            | Expr::Abs(e) => vec![e.as_ref()],
        }
    }

    /// Substitutes a variable with a constant value throughout the expression.
    /// The receiver is left untouched.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        match self {
            Expr::Var(name) if name == var => Expr::Const(value),
            _ => self.map_children(|e| e.set_variable(var, value)),
        }
    }

    /// Substitutes every variable found in `var_map`; other variables stay symbolic.
    pub fn set_variable_from_map(&self, var_map: &BTreeMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::Const(*value),
                None => self.clone(),
            },
            _ => self.map_children(|e| e.set_variable_from_map(var_map)),
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self.children().iter().any(|c| c.contains_variable(var_name)),
        }
    }

    /// Sorted, deduplicated names of all free symbols.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = parse_expression("x**2 + y*z + x")?;
    /// assert_eq!(expr.all_arguments_are_variables(), vec!["x", "y", "z"]);
    /// ```
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        fn collect(expr: &Expr, out: &mut Vec<String>) {
            match expr {
                Expr::Var(name) => out.push(name.clone()),
                _ => expr.children().into_iter().for_each(|c| collect(c, out)),
            }
        }
        let mut vars = Vec::new();
        collect(self, &mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn sqrt(self) -> Expr {
        Expr::Pow(self.boxed(), Expr::Const(0.5).boxed())
    }

    /// true if expression is Const(0.0)
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    fn is_minus_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == -1.0)
    }

    fn is_half(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.5)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(v) => Some(*v),
            _ => None,
        }
    }
}
