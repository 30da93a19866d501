//! Ingestion metrics recorded through the `metrics` facade
//!
//! No exporter is installed here; a host that wants the numbers installs a
//! recorder before running the pipeline.

use metrics::{counter, histogram};
use std::time::Duration;

/// Record the outcome of one pipeline run
pub fn record_pipeline_run(success: bool, degraded: bool, duration: Duration) {
    let status = match (success, degraded) {
        (false, _) => "failed",
        (true, true) => "degraded",
        (true, false) => "success",
    };

    counter!("ingestion_runs_total", "status" => status).increment(1);
    histogram!("ingestion_duration_seconds", "status" => status).record(duration.as_secs_f64());
}

/// Record a batch that exhausted its retries
pub fn record_degraded_batch(stage: &'static str) {
    counter!("ingestion_degraded_batches_total", "stage" => stage).increment(1);
}

/// Record retries spent on a batch
pub fn record_retries(stage: &'static str, retries: u32) {
    if retries > 0 {
        counter!("ingestion_retries_total", "stage" => stage).increment(retries as u64);
    }
}

/// Record chunk and vector volumes for a run
pub fn record_volumes(chunks: usize, vectors: usize) {
    histogram!("ingestion_chunks_per_document").record(chunks as f64);
    counter!("ingestion_vectors_uploaded_total").increment(vectors as u64);
}
