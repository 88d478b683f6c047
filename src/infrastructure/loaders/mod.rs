//! File format loaders, selected by [`FileType`].

mod docx;
mod pdf;
mod tabular;

pub use docx::load_docx;
pub use pdf::load_pdf;
pub use tabular::load_csv;

use crate::domain::{ports::DocumentLoader, DomainError, FileType, Section};

#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn load(&self, file_type: FileType, bytes: &[u8]) -> Result<Vec<Section>, DomainError> {
        match file_type {
            FileType::Pdf => load_pdf(bytes),
            FileType::Docx => load_docx(bytes),
            FileType::Csv => load_csv(bytes),
        }
    }
}
