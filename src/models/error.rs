use serde::Serialize;

#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum TransactionError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Conversion error: {0}")]
    ConversionError(String),
}
