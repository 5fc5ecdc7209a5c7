pub mod answer;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;

pub use answer::{Answer, Answerer, GenerationProtocol, LlmProvider, OpenAiProvider};
pub use config::Settings;
pub use document::{ChunkRecord, DocumentDir, DocumentMetadata};
pub use embedding::{EmbeddingGenerator, FastEmbedGenerator};
pub use error::{PipelineError, PipelineResult, Stage};
pub use pipeline::{IngestProgress, IngestStats};
pub use store::{Collection, ScoredRecord, VectorStore};
