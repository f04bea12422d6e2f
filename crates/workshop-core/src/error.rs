use thiserror::Error;

/// Errors raised while editing a draft
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown frequency: {0}")]
    InvalidFrequency(String),

    #[error("Index {index} out of range for {collection} (len {len})")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },
}

/// Errors raised while repairing an externally sourced record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Record is not an object")]
    NotAnObject,

    #[error("Record has no usable id")]
    MissingId,
}

/// Errors raised while turning extracted report text into a record
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Report text is empty")]
    EmptyInput,

    #[error("Could not process the report into structured data.")]
    Malformed(#[from] serde_json::Error),

    #[error("Could not process the report into structured data.")]
    NotAnObject,

    #[error("Extracted record could not be repaired: {0}")]
    Shape(#[from] ShapeError),
}
