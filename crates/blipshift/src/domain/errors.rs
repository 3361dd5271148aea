//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Operator input that does not have the expected shape.
    #[error("invalid input: {0}")]
    Validation(String),
    /// A coordinate field present in the data is not a number.
    #[error("{file}: {field} value '{value}' is not a number")]
    Parse {
        file: String,
        field: String,
        value: String,
    },
    #[error("fixed version of {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("nothing selected: {0}")]
    EmptySelection(&'static str),
    /// The node behind a record no longer carries all three coordinate fields.
    #[error("record '{name}' no longer resolves to coordinate fields")]
    UnresolvedRecord { name: String },
    #[error("refusing to overwrite source file {}", .0.display())]
    InvalidOutput(PathBuf),
}
