//! Crate-level error taxonomy for ingestion and query operations.
//!
//! Module-local errors (`StoreError`, `EmbeddingError`, `ProviderError`) are
//! folded into [`PipelineError`] at stage boundaries so callers see one
//! classification: input, configuration, not-found, generation, persistence.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Pipeline stage carried in errors so callers can tell where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Sentence segmentation and token-budget packing.
    Chunk,
    /// Embedding generation for chunk texts.
    Embed,
    /// Vector store rebuild.
    Index,
    /// Query embedding and top-k lookup.
    Retrieve,
    /// Answer generation calls.
    Generate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Chunk => "chunk",
            Stage::Embed => "embed",
            Stage::Index => "index",
            Stage::Retrieve => "retrieve",
            Stage::Generate => "generate",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required upstream artifact is absent or unreadable.
    ///
    /// The remedy is the same either way: re-run the stage that produces the
    /// artifact. `detail` distinguishes a missing file from a parse failure.
    #[error("missing or invalid input for stage '{stage}' at {}: {detail}", path.display())]
    Input {
        stage: Stage,
        path: PathBuf,
        detail: String,
    },

    /// A stage could not persist its interchange artifact (chunks or
    /// embeddings file) into the document directory.
    #[error("failed to write artifact for stage '{stage}' at {}: {detail}", path.display())]
    Artifact {
        stage: Stage,
        path: PathBuf,
        detail: String,
    },

    /// Invalid settings: overlap >= chunk size, unknown tokenizer or
    /// embedding model, missing credentials, or an embedding-function
    /// mismatch between index and query time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Query against a document with no indexed collection.
    #[error("no indexed collection '{0}'")]
    NotFound(String),

    /// Embedding or generation backend failure. Not retried here; callers
    /// may wrap this component with their own retry policy.
    #[error("backend failure during stage '{stage}': {cause}")]
    Generation { stage: Stage, cause: String },

    /// Vector store read/write failure.
    #[error("vector store failure: {0}")]
    Persistence(#[from] StoreError),
}

impl PipelineError {
    /// Build an [`PipelineError::Input`] with stage and path context.
    pub fn input(stage: Stage, path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Input {
            stage,
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Build an [`PipelineError::Artifact`] with stage and path context.
    pub fn artifact(stage: Stage, path: impl Into<PathBuf>, detail: impl std::fmt::Display) -> Self {
        Self::Artifact {
            stage,
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    /// Build a [`PipelineError::Generation`] from any displayable cause.
    pub fn generation(stage: Stage, cause: impl std::fmt::Display) -> Self {
        Self::Generation {
            stage,
            cause: cause.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_cli_commands() {
        assert_eq!(Stage::Chunk.to_string(), "chunk");
        assert_eq!(Stage::Embed.to_string(), "embed");
        assert_eq!(Stage::Index.to_string(), "index");
        assert_eq!(Stage::Retrieve.to_string(), "retrieve");
        assert_eq!(Stage::Generate.to_string(), "generate");
    }

    #[test]
    fn test_input_error_carries_path_and_stage() {
        let err = PipelineError::input(Stage::Embed, "/tmp/book/chunks.json", "file not found");
        let msg = err.to_string();
        assert!(msg.contains("embed"));
        assert!(msg.contains("chunks.json"));
        assert!(msg.contains("file not found"));
    }
}
