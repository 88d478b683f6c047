use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation timed out: {0}")]
    GenerationTimeout(String),

    #[error("Conversation store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl DomainError {
    pub fn unsupported_file_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedFileType(msg.into())
    }

    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::GenerationTimeout(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Detail text without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::UnsupportedFileType(m)
            | Self::Ingest(m)
            | Self::Retrieval(m)
            | Self::Generation(m)
            | Self::GenerationTimeout(m)
            | Self::Store(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Internal(m)
            | Self::ExternalService(m) => m,
        }
    }

    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType(_) => "unsupported_file_type",
            Self::Ingest(_) => "ingest_error",
            Self::Retrieval(_) => "retrieval_error",
            Self::Generation(_) | Self::GenerationTimeout(_) => "generation_error",
            Self::Store(_) => "store_error",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Internal(_) => "internal_error",
            Self::ExternalService(_) => "external_service_error",
        }
    }

    /// Re-tags adapter failures as an ingest failure. Errors that already carry
    /// a pipeline kind keep it.
    pub fn into_ingest(self) -> Self {
        match self {
            Self::ExternalService(msg) | Self::Internal(msg) => Self::Ingest(msg),
            other => other,
        }
    }

    pub fn into_retrieval(self) -> Self {
        match self {
            Self::ExternalService(msg) | Self::Internal(msg) | Self::Ingest(msg) => {
                Self::Retrieval(msg)
            }
            other => other,
        }
    }

    pub fn into_generation(self) -> Self {
        match self {
            Self::ExternalService(msg) | Self::Internal(msg) => Self::Generation(msg),
            other => other,
        }
    }

    pub fn into_store(self) -> Self {
        match self {
            Self::ExternalService(msg) | Self::Internal(msg) => Self::Store(msg),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_errors_are_retagged() {
        let err = DomainError::external("qdrant unreachable").into_retrieval();
        assert!(matches!(err, DomainError::Retrieval(ref m) if m == "qdrant unreachable"));

        let err = DomainError::internal("poisoned lock").into_store();
        assert_eq!(err.kind(), "store_error");
    }

    #[test]
    fn test_pipeline_kinds_are_preserved() {
        let err = DomainError::unsupported_file_type(".txt").into_ingest();
        assert!(matches!(err, DomainError::UnsupportedFileType(_)));

        let err = DomainError::timeout("30s").into_generation();
        assert_eq!(err.kind(), "generation_error");
    }
}
