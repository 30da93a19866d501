//! Chunker implementations

mod header_aware;
mod splitter;

pub use header_aware::HeaderAwareChunker;
pub use splitter::RecursiveSplitter;
