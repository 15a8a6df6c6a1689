use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The transaction did not finish inside its time budget and was rolled back.
    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        DomainError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    /// Whether the caller may succeed by retrying the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_) | DomainError::Timeout(_))
    }
}
