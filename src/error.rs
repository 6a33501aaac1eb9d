//! Error types for homeql.

use std::fmt;

use thiserror::Error;

/// Classification of an invalid statement.
///
/// Only `SyntaxError` and `MissingClause` are produced by the current
/// validator rules. The other kinds are reserved for schema-aware checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxError,
    TableNotFound,
    ColumnNotFound,
    TypeMismatch,
    MissingClause,
    InvalidOperator,
}

impl ErrorKind {
    /// Remediation hints shown to the user after a failed validation.
    pub fn hints(self) -> &'static [&'static str] {
        match self {
            ErrorKind::SyntaxError => &[
                "check the SQL syntax",
                "make sure the statement ends with a semicolon (;)",
            ],
            ErrorKind::TableNotFound => &[
                "check the table name for typos",
                "list the available tables with: SELECT name FROM sqlite_master WHERE type='table';",
            ],
            ErrorKind::ColumnNotFound => &[
                "check the column name for typos",
                "inspect a table with: PRAGMA table_info(table_name);",
            ],
            ErrorKind::TypeMismatch | ErrorKind::MissingClause | ErrorKind::InvalidOperator => &[],
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::TableNotFound => "table not found",
            ErrorKind::ColumnNotFound => "column not found",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::MissingClause => "missing clause",
            ErrorKind::InvalidOperator => "invalid operator",
        };
        f.write_str(name)
    }
}

/// The main error type for homeql operations.
#[derive(Debug, Error)]
pub enum HomeqlError {
    /// The active translator produced no candidate.
    #[error("Could not translate question: '{question}'")]
    Translation { question: String },

    /// A statement was rejected by the validator (after correction, if any).
    #[error("Invalid statement ({kind}): {message}")]
    Validation {
        kind: ErrorKind,
        message: String,
        statement: String,
    },

    /// The store rejected a statement. The message is the store's own.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Could not open the store.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The generation backend failed or is unavailable.
    #[error("Model error: {0}")]
    Model(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HomeqlError {
    /// Create a validation error for the given statement text.
    pub fn validation(kind: ErrorKind, message: impl Into<String>, statement: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
            statement: statement.into(),
        }
    }

    /// The validation kind, if this is a validation failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias for homeql operations.
pub type HomeqlResult<T> = Result<T, HomeqlError>;
