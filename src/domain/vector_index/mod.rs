//! Vector index domain types and trait

mod entity;
mod filter;
mod index;

pub use entity::{VectorMatch, VectorQuery, VectorRecord};
pub use filter::MetadataFilter;
pub use index::{
    delete_document_vectors, document_vector_ids, listing_vector, VectorIndex, MAX_QUERY_TOP_K,
};
