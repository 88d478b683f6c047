use crate::domain::{errors::DomainError, FileType, Section};

/// Turns raw file bytes into text sections.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, file_type: FileType, bytes: &[u8]) -> Result<Vec<Section>, DomainError>;
}
