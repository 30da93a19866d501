//! CLI module for Lease Ingest
//!
//! Provides subcommands:
//! - `ingest`: run the pipeline over one or more lease documents
//! - `remove`: delete a document's vectors, lease record and logs
//! - `init-db`: create the relational schema

pub mod ingest;
pub mod init_db;
pub mod remove;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Lease Ingest - segmentation, enrichment and resilient indexing of lease documents
#[derive(Parser)]
#[command(name = "lease-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest lease documents
    Ingest(ingest::IngestArgs),

    /// Remove a document from the index and the lease store
    Remove(remove::RemoveArgs),

    /// Create the lease store schema
    InitDb,
}

/// Load `.env` and configuration, then install logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
