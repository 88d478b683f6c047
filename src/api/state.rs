use std::sync::Arc;
use std::time::Duration;

use crate::application::{DocumentService, EmbeddingIndex, RagService, Retriever};
use crate::domain::{DomainError, TextSplitter};
use crate::infrastructure::config::Config;
use crate::infrastructure::{factory, AppConfig, FileLoader};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub index: Arc<EmbeddingIndex>,
    pub documents: Arc<DocumentService>,
    pub retriever: Arc<Retriever>,
    pub rag: Arc<RagService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        index: Arc<EmbeddingIndex>,
        documents: Arc<DocumentService>,
        retriever: Arc<Retriever>,
        rag: Arc<RagService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            index,
            documents,
            retriever,
            rag,
        }
    }

    /// Wires every service from configuration.
    pub async fn from_config(app: AppConfig) -> Result<Self, DomainError> {
        let config = &app.config;

        let index = build_index(config).await?;
        let documents = Arc::new(build_document_service(config, index.clone())?);
        let retriever = Arc::new(
            Retriever::new(index.clone(), config.rag.top_k).with_min_score(config.rag.min_score),
        );

        let llm = factory::build_llm(config)?;
        let conversations = factory::build_conversation_store(config)?;
        let rag = Arc::new(
            RagService::new(
                retriever.clone(),
                llm,
                conversations,
                app.prompts.rag.system.clone(),
            )
            .with_timeout(Duration::from_secs(config.llm.timeout_seconds)),
        );

        tracing::info!(
            llm = ?config.llm.provider,
            model = %config.llm.model,
            vector_backend = ?config.storage.vector_backend,
            conversation_backend = ?config.storage.conversation_backend,
            "services initialized"
        );

        Ok(Self::new(app, index, documents, retriever, rag))
    }
}

pub async fn build_index(config: &Config) -> Result<Arc<EmbeddingIndex>, DomainError> {
    let embedding = factory::build_embedding(config);
    let vector_store = factory::build_vector_store(config, embedding.dimension()).await?;
    Ok(Arc::new(
        EmbeddingIndex::new(embedding, vector_store)
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds)),
    ))
}

pub fn build_document_service(
    config: &Config,
    index: Arc<EmbeddingIndex>,
) -> Result<DocumentService, DomainError> {
    let splitter = TextSplitter::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
    Ok(DocumentService::new(index, Arc::new(FileLoader))
        .with_splitter(splitter)
        .with_upload_dir(config.storage.upload_dir.clone()))
}
