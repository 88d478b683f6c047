use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

use crate::domain::{DomainError, Section};

const DOCUMENT_XML: &str = "word/document.xml";
/// Decompressed size cap for the document part.
const MAX_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Extracts run text from `word/document.xml`, one line per paragraph.
pub fn load_docx(bytes: &[u8]) -> Result<Vec<Section>, DomainError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DomainError::ingest(format!("DOCX is not a valid archive: {e}")))?;

    let entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|_| DomainError::ingest(format!("DOCX has no {DOCUMENT_XML}")))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| DomainError::ingest(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_BYTES {
        return Err(DomainError::ingest(format!("{DOCUMENT_XML} exceeds size limit")));
    }

    Ok(vec![Section::new(paragraph_text(&xml)?)])
}

fn paragraph_text(xml: &[u8]) -> Result<String, DomainError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| DomainError::ingest(format!("DOCX text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DomainError::ingest(format!("DOCX XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
