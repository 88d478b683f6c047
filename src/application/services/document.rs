use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

use crate::application::services::EmbeddingIndex;
use crate::domain::{ports::DocumentLoader, Document, DomainError, FileType, TextSplitter};

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document: Document,
    pub chunks_added: usize,
}

/// Loads a file by type, splits it and adds the chunks to the index.
pub struct DocumentService {
    index: Arc<EmbeddingIndex>,
    loader: Arc<dyn DocumentLoader>,
    splitter: TextSplitter,
    upload_dir: PathBuf,
}

impl DocumentService {
    pub fn new(index: Arc<EmbeddingIndex>, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            index,
            loader,
            splitter: TextSplitter::default(),
            upload_dir: PathBuf::from("./data"),
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Ingests a file from disk. Unsupported extensions are rejected before
    /// the file is read.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, DomainError> {
        let file_type = FileType::from_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::ingest(format!("{}: {e}", path.display())))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.ingest_bytes(&name, file_type, bytes).await
    }

    /// Stores an uploaded file in the upload directory and ingests the bytes
    /// as received.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest_upload(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport, DomainError> {
        let name = sanitize_filename(filename)?;
        let file_type = FileType::from_path(Path::new(&name))?;

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| DomainError::internal(format!("upload dir: {e}")))?;
        let path = self.upload_dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::internal(format!("{}: {e}", path.display())))?;

        self.ingest_bytes(&name, file_type, bytes.to_vec()).await
    }

    async fn ingest_bytes(
        &self,
        name: &str,
        file_type: FileType,
        bytes: Vec<u8>,
    ) -> Result<IngestReport, DomainError> {
        let loader = self.loader.clone();
        let sections = tokio::task::spawn_blocking(move || loader.load(file_type, &bytes))
            .await
            .map_err(|e| DomainError::ingest(format!("loader aborted: {e}")))??;

        let document = Document::new(name).with_content_type(file_type.content_type());
        let chunks = self.splitter.split_document(&document, &sections);
        if chunks.is_empty() {
            tracing::warn!(document = %document.name, "no text extracted");
        }

        let chunks_added = self.index.add(&chunks).await?;
        tracing::info!(document = %document.name, document_id = %document.id, chunks_added, "document ingested");

        Ok(IngestReport {
            document,
            chunks_added,
        })
    }
}

/// Keeps only the final path component so uploads cannot escape the upload dir.
fn sanitize_filename(filename: &str) -> Result<String, DomainError> {
    Path::new(filename.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .ok_or_else(|| DomainError::validation(format!("invalid file name: {filename:?}")))
}
