//! Ingest command - runs the pipeline over lease documents

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{error, info, warn};

use super::bootstrap;
use crate::domain::lease::IngestionLogEntry;
use crate::domain::ingestion::document_name;

/// Arguments for the ingest command
#[derive(Args, Clone)]
pub struct IngestArgs {
    /// Lease documents to ingest (.pdf, .docx, .doc, .md, .txt)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Move successfully ingested files into this directory
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Skip documents with a successful ingestion already logged
    #[arg(long)]
    pub skip_processed: bool,
}

/// Run the ingest command
pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = bootstrap()?;
    let pipeline = crate::create_pipeline(&config).await?;
    let store = pipeline.lease_store().clone();

    let mut failed = 0;
    let mut skipped = 0;

    for path in &args.files {
        if args.skip_processed {
            let name = document_name(path)?;
            if store.is_document_processed(&name).await? {
                info!(document = %name, "Already processed; skipping");
                skipped += 1;
                continue;
            }
        }

        let result = pipeline.run(path).await;

        if let Err(e) = store.log_ingestion(&IngestionLogEntry::from_result(&result)).await {
            warn!(document = %result.document_name, error = %e, "Failed to write ingestion log");
        }

        if !result.success {
            failed += 1;
            error!(
                document = %result.document_name,
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "Ingestion failed"
            );
            continue;
        }

        if let Some(ref dir) = args.archive_dir {
            match archive_file(path, dir).await {
                Ok(target) => info!(target = %target.display(), "Archived document"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to archive document"),
            }
        }
    }

    let total = args.files.len();
    info!(total, failed, skipped, "Ingestion run complete");

    if failed > 0 {
        anyhow::bail!("{} of {} documents failed to ingest", failed, total);
    }

    Ok(())
}

/// Move `path` into `dir`, falling back to copy and delete across filesystems
async fn archive_file(path: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let target = dir.join(file_name);

    if tokio::fs::rename(path, &target).await.is_err() {
        tokio::fs::copy(path, &target).await?;
        tokio::fs::remove_file(path).await?;
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_archive_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lease.md");
        std::fs::write(&source, "# Lease").unwrap();
        let archive = dir.path().join("processed");

        let target = archive_file(&source, &archive).await.unwrap();

        assert_eq!(target, archive.join("lease.md"));
        assert!(target.exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_archive_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = archive_file(&dir.path().join("missing.pdf"), dir.path()).await;

        assert!(result.is_err());
    }
}
