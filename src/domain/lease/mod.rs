//! Lease records, their extractors and the relational store contract

mod entity;
mod extractor;
mod repository;

pub use entity::{
    ExtractedClause, IngestionLogEntry, IngestionStatus, Lease, LeaseRecord, RentStep,
};
pub use extractor::{extraction_window, ClauseExtractor, LeaseExtractor};
pub use repository::LeaseRepository;

#[cfg(test)]
pub use extractor::{MockClauseExtractor, MockLeaseExtractor};
#[cfg(test)]
pub use repository::MockLeaseRepository;
