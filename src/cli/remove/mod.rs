//! Remove command - deletes one document everywhere it was indexed

use clap::Args;
use tracing::info;

use super::bootstrap;
use crate::infrastructure::ingestion::{remove_document, RemovalOptions};

/// Arguments for the remove command
#[derive(Args, Clone)]
pub struct RemoveArgs {
    /// Document name as ingested, e.g. "Store 42 Lease.pdf"
    pub document_name: String,

    /// Leave the document's vectors in the index
    #[arg(long)]
    pub keep_vectors: bool,

    /// Leave the lease record and its clauses
    #[arg(long)]
    pub keep_lease: bool,

    /// Leave the ingestion log rows
    #[arg(long)]
    pub keep_logs: bool,
}

impl RemoveArgs {
    fn options(&self) -> RemovalOptions {
        RemovalOptions {
            vectors: !self.keep_vectors,
            lease: !self.keep_lease,
            logs: !self.keep_logs,
        }
    }
}

pub async fn run(args: RemoveArgs) -> anyhow::Result<()> {
    let config = bootstrap()?;

    let index = crate::create_vector_index(&config)?;
    let store = crate::create_lease_store(&config).await?;

    let report = remove_document(
        index.as_ref(),
        store.as_ref(),
        &config.pipeline,
        &args.document_name,
        args.options(),
    )
    .await?;

    info!(
        document = %args.document_name,
        vectors = report.vectors_deleted,
        lease = report.lease_deleted,
        logs = report.logs_deleted,
        "Removal complete"
    );

    Ok(())
}
