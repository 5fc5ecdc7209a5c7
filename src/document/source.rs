//! Document directory layout and stage artifact IO.
//!
//! A document directory is the per-book home for the extractor's outputs
//! (`extracted.txt`, `extracted_metadata.json`), the stage artifacts
//! (`chunks.json`, `embeddings.json`), and the vector store (`vectors/`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult, Stage};

use super::normalize::normalize_pages;
use super::types::{ChunkRecord, DocumentMetadata, Page};

/// Per-page raw text, one line per page, written by the extractor.
pub const EXTRACTED_TEXT_FILE: &str = "extracted.txt";
/// Document-level metadata written by the extractor.
pub const METADATA_FILE: &str = "extracted_metadata.json";
/// Chunk interchange between the chunk and embed stages.
pub const CHUNKS_FILE: &str = "chunks.json";
/// Embedding interchange between the embed and index stages.
pub const EMBEDDINGS_FILE: &str = "embeddings.json";
/// Subdirectory holding persisted collections.
pub const VECTORS_DIR: &str = "vectors";

/// Handle on one document's directory.
#[derive(Debug, Clone)]
pub struct DocumentDir {
    path: PathBuf,
}

impl DocumentDir {
    /// Wrap a directory path. The directory itself is only touched when a
    /// stage reads or writes an artifact.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The wrapped directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collection key for this document: the directory's final path
    /// component. Indexing and retrieval must agree on this key.
    pub fn collection_name(&self) -> PipelineResult<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "cannot derive a collection name from '{}'",
                    self.path.display()
                ))
            })
    }

    pub fn extracted_text_path(&self) -> PathBuf {
        self.path.join(EXTRACTED_TEXT_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.path.join(CHUNKS_FILE)
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.path.join(EMBEDDINGS_FILE)
    }

    pub fn vectors_dir(&self) -> PathBuf {
        self.path.join(VECTORS_DIR)
    }

    /// Read and normalize the extracted pages, one per line, in order.
    pub fn read_pages(&self) -> PipelineResult<Vec<Page>> {
        let path = self.extracted_text_path();
        let raw = fs::read_to_string(&path)
            .map_err(|e| PipelineError::input(Stage::Chunk, &path, e.to_string()))?;
        Ok(normalize_pages(raw.lines()))
    }

    /// Read the extractor's document metadata.
    pub fn read_metadata(&self) -> PipelineResult<DocumentMetadata> {
        let path = self.metadata_path();
        let raw = fs::read_to_string(&path)
            .map_err(|e| PipelineError::input(Stage::Chunk, &path, e.to_string()))?;
        serde_json::from_str(&raw)
            .map_err(|e| PipelineError::input(Stage::Chunk, &path, format!("invalid metadata: {e}")))
    }

    /// Persist the chunk stage's output for the embed stage.
    pub fn write_chunks(&self, chunks: &[ChunkRecord]) -> PipelineResult<()> {
        let path = self.chunks_path();
        let json = serde_json::to_string_pretty(chunks)
            .map_err(|e| PipelineError::artifact(Stage::Chunk, &path, e))?;
        fs::write(&path, json).map_err(|e| PipelineError::artifact(Stage::Chunk, &path, e))
    }

    /// Read the chunk interchange file.
    pub fn read_chunks(&self) -> PipelineResult<Vec<ChunkRecord>> {
        let path = self.chunks_path();
        let raw = fs::read_to_string(&path)
            .map_err(|e| PipelineError::input(Stage::Embed, &path, e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| {
            PipelineError::input(Stage::Embed, &path, format!("invalid chunk file: {e}"))
        })
    }
}
