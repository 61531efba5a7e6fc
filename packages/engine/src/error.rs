use field_core::FieldTypeError;
use sea_orm::DbErr;
use thiserror::Error;

/// Engine-level error taxonomy.
///
/// Repositories check slug conflicts and payload shapes up front, so
/// `Validation`/`Conflict` carry caller-fixable messages; the database's own
/// unique constraints remain a last-resort safety net surfaced as `Db`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Slug collision or equivalent uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Field type error: {0}")]
    FieldType(#[from] FieldTypeError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }
}
