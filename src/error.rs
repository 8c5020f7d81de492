//! Error types for qforge.

use thiserror::Error;

/// The main error type for qforge operations.
///
/// Rendering itself never fails; these errors come from editing field state,
/// parsing command-line expressions and loading configuration.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Column is not declared in the input schema.
    #[error("Unknown column: '{column}'{}", did_you_mean(.suggestion))]
    UnknownColumn {
        column: String,
        suggestion: Option<String>,
    },

    /// Column is declared but is neither required nor optional in the output schema.
    #[error("Column '{0}' is not part of the output schema")]
    ColumnNotSelectable(String),

    /// No filter with the given identifier.
    #[error("Unknown filter: '{0}'")]
    UnknownFilter(String),

    /// Invalid comparison operator.
    #[error("Invalid operator: '{0}'. Expected one of: =, !=, >, <, LIKE")]
    InvalidOperator(String),

    /// Invalid enumerated value (column type, protocol, style).
    #[error("Invalid {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    /// Failed to parse a filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForgeError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

impl From<toml::de::Error> for ForgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for qforge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;
