use crate::domain::{DomainError, Section};

/// One section per page, numbered from 1. Pages without text are skipped but
/// keep their number.
pub fn load_pdf(bytes: &[u8]) -> Result<Vec<Section>, DomainError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| DomainError::ingest(format!("PDF extraction failed: {e}")))?;
    Ok(sections_from_pages(pages))
}

fn sections_from_pages(pages: Vec<String>) -> Vec<Section> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Section::new(text).with_page(i + 1))
        .collect()
}
