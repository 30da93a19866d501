//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{record_degraded_batch, record_pipeline_run, record_retries, record_volumes};
