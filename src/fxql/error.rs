//! Error taxonomy for FXQL parsing.

use serde::Serialize;
use thiserror::Error;

/// Closed set of failure kinds, each with a stable machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidSyntax,
    InvalidCurrency,
    InvalidAmount,
    InvalidCap,
    /// Raised only by the HTTP boundary.
    RateLimitExceeded,
    /// Raised only by the HTTP boundary.
    ServerError,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSyntax => "FXQL-400",
            ErrorKind::InvalidCurrency => "FXQL-405",
            ErrorKind::InvalidCap => "FXQL-407",
            ErrorKind::InvalidAmount => "FXQL-408",
            ErrorKind::RateLimitExceeded => "FXQL-429",
            ErrorKind::ServerError => "FXQL-500",
        }
    }
}

/// 1-based location in the request text. Some errors only know the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Position {
    pub fn at(line: usize, column: usize) -> Self {
        Position {
            line,
            column: Some(column),
        }
    }

    pub fn line(line: usize) -> Self {
        Position { line, column: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FxqlError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

/// Wire shape of an error: `{message, code, position?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub message: &'a str,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl FxqlError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Option<Position>) -> Self {
        FxqlError {
            kind,
            message: message.into(),
            position,
        }
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::InvalidSyntax, message, Some(position))
    }

    pub fn currency(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::InvalidCurrency, message, Some(position))
    }

    pub fn amount(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::InvalidAmount, message, Some(position))
    }

    pub fn cap(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::InvalidCap, message, Some(position))
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            message: &self.message,
            code: self.code(),
            position: self.position,
        }
    }
}
