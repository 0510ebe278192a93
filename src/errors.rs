//! Error types shared by the expression pipeline, the analyzer and the session.
//!
//! Numeric trouble (division by zero, logarithm of a negative number...) is never an
//! error here: it shows up as NaN/Inf in the evaluated arrays.
use std::error::Error;
use std::fmt;
use std::io;

/// The raw string could not be turned into an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// nothing but whitespace was given
    Empty,
    /// parsing stopped at `position` (byte offset in the normalised input)
    UnexpectedInput { position: usize, fragment: String },
    /// `name(...)` where `name` is not a supported function
    UnknownFunction(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty expression"),
            ParseError::UnexpectedInput { position, fragment } => {
                write!(f, "unexpected input at position {}: '{}'", position, fragment)
            }
            ParseError::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
        }
    }
}

impl Error for ParseError {}

/// Failure of `compile(raw, fixed)`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Parse(ParseError),
    /// free symbols other than x and y are left after fixing
    Substitution { unresolved: Vec<String> },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "parse error: {}", e),
            CompileError::Substitution { unresolved } => write!(
                f,
                "unresolved symbols after fixing variables: {} (give them a value, e.g. {}=1)",
                unresolved.join(", "),
                unresolved.first().map(String::as_str).unwrap_or("z")
            ),
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompileError::Parse(e) => Some(e),
            CompileError::Substitution { .. } => None,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixEntryIssue {
    MissingSeparator,
    TooManySeparators,
    InvalidName,
    ReservedAxis,
    InvalidValue,
}

impl fmt::Display for FixEntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FixEntryIssue::MissingSeparator => "expected the form name=value",
            FixEntryIssue::TooManySeparators => "only one '=' is allowed",
            FixEntryIssue::InvalidName => "the name must be an identifier",
            FixEntryIssue::ReservedAxis => "x and y are the plot axes and cannot be fixed",
            FixEntryIssue::InvalidValue => "the value must be a finite number",
        };
        write!(f, "{}", msg)
    }
}

/// A `name=value` line that was rejected by the variable fixer.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedFixEntry {
    pub entry: String,
    pub issue: FixEntryIssue,
}

impl fmt::Display for MalformedFixEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid entry '{}': {}", self.entry, self.issue)
    }
}

impl Error for MalformedFixEntry {}

/// Why the critical point list came back empty. Carried as data, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverFailure {
    /// the gradient vanishes identically along some direction, so the stationary set is not isolated
    NonIsolated,
    /// the solver deadline expired
    Timeout,
}

impl fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverFailure::NonIsolated => write!(f, "no isolated critical points found"),
            SolverFailure::Timeout => {
                write!(f, "no isolated critical points found (solver timed out)")
            }
        }
    }
}

impl Error for SolverFailure {}

#[derive(Debug)]
pub enum RenderError {
    /// every sampled value is NaN or infinite
    NoFiniteValues,
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoFiniteValues => {
                write!(f, "the function has no finite value on the plot domain")
            }
            RenderError::Backend(msg) => write!(f, "plot backend error: {}", msg),
        }
    }
}

impl Error for RenderError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// the settings file named on the command line could not be read
    Unreadable { path: String, reason: String },
    Syntax(String),
    UnknownKey { section: String, key: String },
    InvalidValue { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable { path, reason } => {
                write!(f, "cannot read settings file {}: {}", path, reason)
            }
            ConfigError::Syntax(msg) => write!(f, "settings file: {}", msg),
            ConfigError::UnknownKey { section, key } => {
                write!(f, "settings file: unknown key '{}' in section '{}'", key, section)
            }
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "settings file: bad value for '{}': {}", key, reason)
            }
        }
    }
}

impl Error for ConfigError {}

/// Everything that ends a session early. Reported by `main`, never a panic.
#[derive(Debug)]
pub enum SessionError {
    InvalidExpression { raw: String, error: ParseError },
    Compile(CompileError),
    Render(RenderError),
    Config(ConfigError),
    Io(io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidExpression { raw, error } => write!(
                f,
                "the expression '{}' is not valid ({}), please enter a valid function",
                raw, error
            ),
            SessionError::Compile(e) => write!(f, "{}", e),
            SessionError::Render(e) => write!(f, "{}", e),
            SessionError::Config(e) => write!(f, "{}", e),
            SessionError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Compile(e) => Some(e),
            SessionError::Render(e) => Some(e),
            SessionError::Config(e) => Some(e),
            SessionError::Io(e) => Some(e),
            SessionError::InvalidExpression { error, .. } => Some(error),
        }
    }
}

impl From<CompileError> for SessionError {
    fn from(e: CompileError) -> Self {
        SessionError::Compile(e)
    }
}

impl From<RenderError> for SessionError {
    fn from(e: RenderError) -> Self {
        SessionError::Render(e)
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        SessionError::Config(e)
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_expression_keeps_the_parse_error() {
        let error = ParseError::UnexpectedInput { position: 2, fragment: "+* y".to_string() };
        let e = SessionError::InvalidExpression { raw: "x +* y".to_string(), error: error.clone() };
        let message = e.to_string();
        assert!(message.contains("'x +* y'"));
        assert!(message.contains("position 2"));
        assert!(message.contains("'+* y'"));
        assert_eq!(e.source().map(|s| s.to_string()), Some(error.to_string()));
    }

    #[test]
    fn test_config_error_becomes_a_session_error() {
        let e = SessionError::from(ConfigError::UnknownKey {
            section: "plot".to_string(),
            key: "colour".to_string(),
        });
        assert!(matches!(e, SessionError::Config(ConfigError::UnknownKey { .. })));
        assert!(e.to_string().contains("colour"));
        assert!(e.source().is_some());
    }
}
