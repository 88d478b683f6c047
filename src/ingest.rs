use docchat::api::state::{build_document_service, build_index};
use docchat::infrastructure::{config::DEFAULT_CONFIG_PATH, AppConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    docchat::telemetry::init();

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        anyhow::bail!("usage: docchat-ingest <file>...");
    }

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = AppConfig::load(&config_path)?;

    let index = build_index(&config.config).await?;
    let documents = build_document_service(&config.config, index.clone())?;

    let mut failed = 0usize;
    for path in &files {
        match documents.ingest(path).await {
            Ok(report) => info!(
                path = %path.display(),
                document_id = %report.document.id,
                chunks_added = report.chunks_added,
                "ingested"
            ),
            Err(e) => {
                error!(path = %path.display(), kind = e.kind(), error = %e, "ingest failed");
                failed += 1;
            }
        }
    }

    info!(files = files.len(), failed, total_chunks = index.len().await?, "done");
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed to ingest", files.len());
    }
    Ok(())
}
