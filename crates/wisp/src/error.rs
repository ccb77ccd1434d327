use std::fmt;

/// A location in the source text: 1-indexed line, 0-indexed column.
///
/// Every token and every AST node carries one, so errors from any stage of
/// the pipeline can point back at the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Which stage of the pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    /// A byte that cannot begin any token.
    #[strum(serialize = "lex error")]
    Lex,
    /// An unexpected token or malformed production.
    #[strum(serialize = "parse error")]
    Parse,
    /// A runtime failure: type mismatch, bad index, wrong arity, and so on.
    #[strum(serialize = "eval error")]
    Eval,
}

/// A fatal script failure.
///
/// Errors abort the current invocation; there is no catch mechanism in the
/// language. The host receives exactly one of these per failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub kind: ErrorKind,
    pub location: CodeLoc,
    pub message: String,
}

impl Exception {
    pub(crate) fn lex(location: CodeLoc, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Lex,
            location,
            message: message.into(),
        }
    }

    pub(crate) fn parse(location: CodeLoc, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            location,
            message: message.into(),
        }
    }

    pub(crate) fn eval(location: CodeLoc, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Eval,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.location, self.message)
    }
}

impl std::error::Error for Exception {}

/// Result type alias used throughout the interpreter.
pub(crate) type RunResult<T> = Result<T, Exception>;
