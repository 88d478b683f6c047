use crate::domain::{DomainError, Section};

/// One section per CSV record, rendered as `header: value` lines.
pub fn load_csv(bytes: &[u8]) -> Result<Vec<Section>, DomainError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DomainError::ingest(format!("CSV header: {e}")))?
        .clone();

    let mut sections = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DomainError::ingest(format!("CSV row {row}: {e}")))?;

        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        sections.push(Section::new(text).with_row(row));
    }

    Ok(sections)
}
