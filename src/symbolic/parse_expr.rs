//! Restricted expression parser: turns untrusted user text into an `Expr`.
//!
//! Grammar (lowest binding first):
//! ```text
//!  sum    := term (('+' | '-') term)*
//!  term   := unary (('*' | '/') unary)*
//!  unary  := ('-' | '+') unary | power
//!  power  := atom (('**' | '^') unary)?          right associative
//!  atom   := number | name '(' sum ')' | name | '(' sum ')'
//! ```
//! Only the functions listed in `apply_function` are accepted; anything else is an error,
//! so the input can never reach a general purpose evaluator.
use crate::errors::ParseError;
use crate::symbolic::symbolic_engine::Expr;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, not, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use regex::Regex;
use std::f64::consts::{E, LN_10, LN_2, PI};
use std::sync::LazyLock;

// np.e / math.e are Euler's number, not a symbol called "e"
static MODULE_EULER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:np|numpy|math)\.e\b").expect("valid regex"));
static MODULE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:np|numpy|sp|sympy|math)\.").expect("valid regex"));

/// Strips numpy/sympy/math module prefixes so that `np.sin(x)` reads as `sin(x)`.
pub fn normalise(raw: &str) -> String {
    let with_e = MODULE_EULER.replace_all(raw, "E");
    MODULE_PREFIX.replace_all(&with_e, "").into_owned()
}

/// Parses a user expression.
///
/// # Examples
/// ```
/// use RustedContours::symbolic::parse_expr::parse_expression;
/// let expr = parse_expression("x**2 + y**2").unwrap();
/// assert_eq!(expr.all_arguments_are_variables(), vec!["x", "y"]);
/// assert!(parse_expression("x +* y").is_err());
/// ```
pub fn parse_expression(raw: &str) -> Result<Expr, ParseError> {
    let input = normalise(raw);
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    match sum(&input) {
        Ok((rest, expr)) if rest.trim().is_empty() => Ok(expr),
        Ok((rest, _)) => Err(unexpected(&input, rest)),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::Verify => {
            let name = identifier(e.input)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|_| e.input.to_string());
            Err(ParseError::UnknownFunction(name))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(&input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(unexpected(&input, "")),
    }
}

fn unexpected(full: &str, rest: &str) -> ParseError {
    let rest = rest.trim_start();
    ParseError::UnexpectedInput {
        position: full.len() - rest.len(),
        fragment: if rest.is_empty() {
            "end of input".to_string()
        } else {
            rest.chars().take(12).collect()
        },
    }
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn sum(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), term)).parse(input)?;
    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => acc + rhs,
        _ => acc - rhs,
    });
    Ok((input, expr))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    // a single '*'; "**" belongs to the power rule
    let mul_op = alt((terminated(char('*'), not(char('*'))), char('/')));
    let (input, rest) = many0(pair(ws(mul_op), unary)).parse(input)?;
    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '*' => acc * rhs,
        _ => acc / rhs,
    });
    Ok((input, expr))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| match e {
            Expr::Const(v) => Expr::Const(-v),
            e => -e,
        }),
        preceded(ws(char('+')), unary),
        power,
    ))
    .parse(input)
}

fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(alt((tag("**"), tag("^")))), unary)).parse(input)?;
    let expr = match exponent {
        Some(exponent) => base.pow(exponent),
        None => base,
    };
    Ok((input, expr))
}

fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        number,
        call_or_symbol,
        delimited(char('('), sum, ws(char(')'))),
    )))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize((mantissa, exponent)), |s: &str| {
        s.parse::<f64>().map(Expr::Const)
    })
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn call_or_symbol(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let (after_open, open) = opt(preceded(multispace0, char('('))).parse(rest)?;
    if open.is_none() {
        return Ok((rest, symbol(name)));
    }
    let (rest, argument) = terminated(sum, ws(char(')'))).parse(after_open)?;
    match apply_function(name, argument) {
        Some(expr) => Ok((rest, expr)),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Verify,
        ))),
    }
}

fn symbol(name: &str) -> Expr {
    match name {
        "pi" => Expr::Const(PI),
        "E" => Expr::Const(E),
        _ => Expr::Var(name.to_string()),
    }
}

fn apply_function(name: &str, arg: Expr) -> Option<Expr> {
    let b = arg.boxed();
    let expr = match name {
        "sin" => Expr::sin(b),
        "cos" => Expr::cos(b),
        "tan" | "tg" => Expr::tg(b),
        "cot" | "ctg" => Expr::ctg(b),
        "asin" | "arcsin" => Expr::arcsin(b),
        "acos" | "arccos" => Expr::arccos(b),
        "atan" | "arctan" | "arctg" => Expr::arctg(b),
        "acot" | "arccot" | "arcctg" => Expr::arcctg(b),
        "exp" => Expr::Exp(b),
        "log" | "ln" => Expr::Ln(b),
        "log10" => Expr::Ln(b) / Expr::Const(LN_10),
        "log2" => Expr::Ln(b) / Expr::Const(LN_2),
        "sqrt" => b.sqrt(),
        "abs" | "Abs" => Expr::Abs(b),
        _ => return None,
    };
    Some(expr)
}
