use rowmap_api::error::{ConstructionFailure, SourceError};
use rowmap_api::value::ColumnType;

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("type '{type_name}' has no constructors and is not a scalar type")]
    UnresolvableType { type_name: String },

    #[error(
        "no constructor of '{type_name}' accepts {arity} column(s) of types [{}]",
        format_column_types(.column_types)
    )]
    NoMatchingConstructor {
        type_name: String,
        arity: usize,
        column_types: Vec<Option<ColumnType>>,
    },

    #[error("failed to construct '{type_name}' via {constructor}: {cause}")]
    Construction {
        type_name: String,
        constructor: String,
        #[source]
        cause: ConstructionFailure,
    },

    #[error("query for '{type_name}' returned no result")]
    NoResult { type_name: String },

    #[error("query for '{type_name}' returned more than one result")]
    NonUniqueResult { type_name: String },

    #[error("row for '{type_name}' has {actual} column(s), previous rows had {expected}")]
    ColumnCountChanged {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("row source error: {0}")]
    Source(#[from] SourceError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of the constructor slot used when a scalar value is passed through.
pub const DIRECT: &str = "<direct>";

impl MappingError {
    /// Add context to the error.
    ///
    /// Only message-carrying variants change; structured variants are
    /// returned as-is so callers can still match on them.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            MappingError::Config(msg) => MappingError::Config(format!("{ctx}: {msg}")),
            MappingError::Source(e) => {
                MappingError::Source(SourceError::new(format!("{ctx}: {}", e.message())))
            }
            other => other,
        }
    }

    /// The construction failure behind this error, if any.
    pub fn construction_cause(&self) -> Option<&ConstructionFailure> {
        match self {
            MappingError::Construction { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

fn format_column_types(types: &[Option<ColumnType>]) -> String {
    types
        .iter()
        .map(|t| match t {
            Some(t) => t.to_string(),
            None => "null".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
