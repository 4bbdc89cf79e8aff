//! A single failure channel for the whole compiler.
//!
//! Lexing, parsing, semantic analysis and SQL generation all report through
//! this one `Error` type. There is no partial recovery: the first error
//! aborts the current compilation (`reportError` in the original saneql
//! semantics), which in Rust terms just means `?`-propagation with no retry.

use std::fmt;

/// A single byte-offset span into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    pub span: Option<Span>,
    pub reason: Reason,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Reason {
    /// A name (column, table, function, collation, let) could not be found.
    NotFound { name: String, namespace: &'static str },
    /// A name resolved to more than one binding.
    Ambiguous { name: String },
    /// An argument had the wrong shape (e.g. a table where a scalar was
    /// expected, or a missing/unexpected named argument).
    Shape { message: String },
    /// Two types could not be unified, or a cast target made no sense.
    TypeMismatch { message: String },
    /// A condition that must be `bool` was not.
    NonBool { found: String },
    /// An aggregate function used outside an aggregation scope, or a raw
    /// column used inside one without being wrapped in an aggregate.
    AggregationScope { message: String },
    /// Wrong number of arguments, or a duplicate/cyclic `let`.
    Arity { message: String },
    /// `limit`/`offset` was not a non-negative integer constant.
    InvalidLimit { message: String },
    /// Lexer/parser syntax errors, and anything else that doesn't need its
    /// own variant.
    Simple(String),
    /// Something the analyser or generator assumed could never happen.
    Bug { details: String },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NotFound { name, namespace } => {
                write!(f, "{namespace} `{name}` not found")
            }
            Reason::Ambiguous { name } => write!(f, "`{name}` is ambiguous"),
            Reason::Shape { message } => write!(f, "{message}"),
            Reason::TypeMismatch { message } => write!(f, "{message}"),
            Reason::NonBool { found } => {
                write!(f, "expected a boolean expression, found {found}")
            }
            Reason::AggregationScope { message } => write!(f, "{message}"),
            Reason::Arity { message } => write!(f, "{message}"),
            Reason::InvalidLimit { message } => write!(f, "{message}"),
            Reason::Simple(message) => write!(f, "{message}"),
            Reason::Bug { details } => write!(f, "internal compiler error: {details}"),
        }
    }
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        Error {
            span: None,
            reason,
            hints: Vec::new(),
        }
    }

    pub fn simple<S: ToString>(message: S) -> Self {
        Error::new(Reason::Simple(message.to_string()))
    }

    pub fn not_found<S: ToString>(namespace: &'static str, name: S) -> Self {
        Error::new(Reason::NotFound {
            name: name.to_string(),
            namespace,
        })
    }

    pub fn bug<S: ToString>(details: S) -> Self {
        Error::new(Reason::Bug {
            details: details.to_string(),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if let Some(span) = self.span {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        for hint in &self.hints {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Builder methods for attaching context to an `Error`, usable directly on
/// `Result<T, Error>` so call sites can chain `.with_span(...)` onto a `?`-ed
/// expression without an intermediate `match`.
pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;
    fn with_span(self, span: Option<Span>) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_span(self, span: Option<Span>) -> Self {
        self.map_err(|e| e.with_span(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hints() {
        let err = Error::simple("bad thing").push_hint("try this instead");
        let rendered = err.to_string();
        assert!(rendered.contains("bad thing"));
        assert!(rendered.contains("try this instead"));
    }

    #[test]
    fn not_found_reason() {
        let err = Error::not_found("table", "foo");
        assert_eq!(err.to_string(), "table `foo` not found");
    }
}
