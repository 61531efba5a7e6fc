use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldTypeError {
    #[error("Field type not found: {0}")]
    NotFound(String),

    #[error("Field type load failed: {0}")]
    LoadFailed(String),

    /// Upload or registration refused by a validation rule.
    #[error("Field type rejected: {0}")]
    Rejected(String),

    /// A raw value did not match the shape the type expects.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Field type execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Extism error: {0}")]
    Extism(#[from] extism::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
