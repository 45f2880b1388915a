use thiserror::Error;

/// Why a single input row could not be turned into a [`Record`].
///
/// Loaders wrap this in an `anyhow` error carrying the row number, so
/// callers that care about the cause can `downcast_ref::<RowError>()`.
///
/// [`Record`]: super::model::Record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("row has {found} columns but at least {required} are required")]
    TooFewColumns { found: usize, required: usize },

    #[error("year '{value}' is not an integer")]
    InvalidYear { value: String },

    #[error("invalid UTF-8 in column {column}")]
    InvalidUtf8 { column: usize },

    #[error("invalid JSON record: {message}")]
    InvalidJson { message: String },

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' has unsupported type {found}")]
    UnsupportedType { field: &'static str, found: String },
}
