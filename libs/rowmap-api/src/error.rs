use std::fmt;

use crate::value::ColumnType;

/// Why a constructor could not produce an instance from a row.
///
/// Carried as the `source()` of the engine's construction error so callers
/// can tell a null column from a genuine constructor failure.
#[derive(Debug)]
pub enum ConstructionFailure {
    /// A null column reached a parameter that cannot represent null.
    NullColumn { column: usize, expected: ColumnType },
    /// Column value does not convert into the parameter type.
    TypeMismatch {
        column: usize,
        expected: ColumnType,
        actual: ColumnType,
    },
    /// Constructor received a different number of values than it declares.
    Arity { expected: usize, actual: usize },
    /// A fallible constructor refused the values.
    Rejected(Box<dyn std::error::Error + Send + Sync>),
}

impl ConstructionFailure {
    pub fn rejected(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Rejected(err.into())
    }

    pub fn is_null_column(&self) -> bool {
        matches!(self, ConstructionFailure::NullColumn { .. })
    }
}

impl fmt::Display for ConstructionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionFailure::NullColumn { column, expected } => {
                write!(f, "null in column {column} for non-nullable {expected} parameter")
            }
            ConstructionFailure::TypeMismatch {
                column,
                expected,
                actual,
            } => write!(f, "column {column}: expected {expected}, got {actual}"),
            ConstructionFailure::Arity { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
            ConstructionFailure::Rejected(e) => write!(f, "constructor rejected row: {e}"),
        }
    }
}

impl std::error::Error for ConstructionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConstructionFailure::Rejected(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Failure reported by a row source (cursor, driver, I/O).
#[derive(Clone)]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { message: msg.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[source] {}", self.message)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

impl From<String> for SourceError {
    fn from(s: String) -> Self { Self { message: s } }
}

impl From<&str> for SourceError {
    fn from(s: &str) -> Self { Self { message: s.to_string() } }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self { Self { message: e.to_string() } }
}
