//! Lease repository implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryLeaseRepository;
pub use postgres::PostgresLeaseRepository;
