//! Embedding generation behind a swappable trait.
//!
//! The pipeline only sees [`EmbeddingGenerator`]; the fastembed-backed
//! implementation lives in [`fastembed`], and tests substitute
//! deterministic doubles.

pub mod fastembed;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::ChunkMetadata;
use crate::error::{PipelineError, PipelineResult, Stage};

pub use fastembed::FastEmbedGenerator;

/// Errors from embedding model setup and inference.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("unknown embedding model '{model}' (expected one of: {expected})")]
    UnknownModel { model: String, expected: String },

    #[error("failed to initialize embedding model '{model}': {cause}")]
    ModelInit { model: String, cause: String },

    #[error("embedding backend failed: {0}")]
    Backend(String),

    #[error("embedding backend returned {got} vectors for {expected} texts")]
    CountMismatch { expected: usize, got: usize },
}

/// Turns texts into fixed-size dense vectors.
///
/// Implementations are injected into the indexer and the query path so
/// both sides share one embedding space.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed texts in order. The output has exactly one vector per input
    /// text, at the same position.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimension of every vector this generator produces.
    fn dimension(&self) -> usize;

    /// Stable identifier recorded in collection headers so the query path
    /// can detect an embedding-function mismatch.
    fn model_id(&self) -> &str;
}

/// Index-aligned arrays persisted as `embeddings.json` between the embed
/// and index stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingBatch {
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

impl EmbeddingBatch {
    /// Batch with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            documents: Vec::with_capacity(capacity),
            metadatas: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            embeddings: Vec::with_capacity(capacity),
        }
    }

    /// Append one row across all four arrays.
    pub fn push(&mut self, id: String, document: String, metadata: ChunkMetadata, embedding: Vec<f32>) {
        self.ids.push(id);
        self.documents.push(document);
        self.metadatas.push(metadata);
        self.embeddings.push(embedding);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when all four arrays have the same length.
    pub fn is_aligned(&self) -> bool {
        let rows = self.ids.len();
        self.documents.len() == rows
            && self.metadatas.len() == rows
            && self.embeddings.len() == rows
    }

    /// Persist as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::artifact(Stage::Embed, path, e))?;
        fs::write(path, json).map_err(|e| PipelineError::artifact(Stage::Embed, path, e))
    }

    /// Load and validate an interchange file for the index stage.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::input(Stage::Index, path, e.to_string()))?;
        let batch: Self = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::input(Stage::Index, path, format!("invalid embedding file: {e}"))
        })?;
        if !batch.is_aligned() {
            return Err(PipelineError::input(
                Stage::Index,
                path,
                format!(
                    "misaligned arrays: {} ids, {} documents, {} metadatas, {} embeddings",
                    batch.ids.len(),
                    batch.documents.len(),
                    batch.metadatas.len(),
                    batch.embeddings.len()
                ),
            ));
        }
        Ok(batch)
    }
}
