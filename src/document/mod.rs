//! Document ingestion: pages, sentences, and token-budget chunks.

pub mod chunker;
pub mod normalize;
pub mod segment;
pub mod source;
pub mod tokens;
pub mod types;

pub use chunker::{ChunkerConfig, TokenBudgetChunker};
pub use normalize::{normalize_pages, normalize_text};
pub use segment::Segmenter;
pub use source::DocumentDir;
pub use tokens::{TiktokenCounter, TokenCounter};
pub use types::{ChunkMetadata, ChunkRecord, DocumentMetadata, Page, Sentence};
