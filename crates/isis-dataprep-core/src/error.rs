//! Decode error taxonomy.
//!
//! Every field-set decoder returns `Result<_, DecodeError>`. None of the
//! variants is fatal to a batch: the writer diverts the raw row to the
//! `.err` side file and moves on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Row shape does not match the record schema (cell count,
    /// identifier length, repeated collection marker).
    #[error("structural decode error: {0}")]
    Structural(String),

    /// A required field is present in shape but empty after decoding.
    #[error("empty field: {field}")]
    EmptyField { field: &'static str },

    /// Decoding succeeded but the collection is on the skip list.
    #[error("collection filtered: {collection}")]
    CollectionFiltered { collection: String },
}

impl DecodeError {
    pub fn structural(msg: impl Into<String>) -> Self {
        DecodeError::Structural(msg.into())
    }

    /// Short label used in summaries and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::Structural(_) => "structural",
            DecodeError::EmptyField { .. } => "empty",
            DecodeError::CollectionFiltered { .. } => "filtered",
        }
    }
}
