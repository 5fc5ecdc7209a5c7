//! Persistent vector collections with cosine top-k query.
//!
//! One JSON file per collection under the document's `vectors/` directory.
//! Rebuilds are staged to a temporary file and renamed into place, so a
//! collection file is never observable half-written.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::ChunkMetadata;

/// Errors from collection persistence and lookup.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("collection io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("collection file at {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("embedding dimension {got} does not match collection dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Identifies how a collection was built, so the query path can detect
/// embedding-function mismatches before scoring anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHeader {
    /// Collection key, derived from the document directory name.
    pub name: String,

    /// Identifier of the embedding model that produced the vectors.
    pub embedding_model: String,

    /// Vector dimension shared by every record.
    pub dimension: usize,

    /// RFC 3339 timestamp of the rebuild that wrote this file.
    pub indexed_at: String,
}

impl CollectionHeader {
    /// Header stamped with the current time.
    pub fn new(name: &str, embedding_model: &str, dimension: usize) -> Self {
        Self {
            name: name.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension,
            indexed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One persisted embedding row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique id within the collection (`chunk_<i>`).
    pub id: String,

    /// The chunk text this vector was derived from.
    pub document: String,

    pub metadata: ChunkMetadata,

    pub embedding: Vec<f32>,
}

impl EmbeddingRecord {
    /// First `max_chars` characters of the document text, on a char
    /// boundary.
    pub fn preview(&self, max_chars: usize) -> &str {
        if self.document.len() <= max_chars {
            &self.document
        } else {
            let mut end = max_chars;
            while end > 0 && !self.document.is_char_boundary(end) {
                end -= 1;
            }
            &self.document[..end]
        }
    }
}

/// A retrieval hit: stored fields plus similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Summary of a collection for inspection commands.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub records: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub indexed_at: String,
}

/// A named set of embedding records plus its header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub header: CollectionHeader,
    pub records: Vec<EmbeddingRecord>,
}

impl Collection {
    /// Empty collection under a header.
    pub fn new(header: CollectionHeader) -> Self {
        Self {
            header,
            records: Vec::new(),
        }
    }

    /// Append a batch of records, rejecting any vector whose dimension
    /// disagrees with the header. Order within and across batches is
    /// preserved.
    pub fn add_batch(&mut self, records: Vec<EmbeddingRecord>) -> StoreResult<()> {
        for record in &records {
            if record.embedding.len() != self.header.dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: self.header.dimension,
                    got: record.embedding.len(),
                });
            }
        }
        self.records.extend(records);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top-k records by cosine similarity, best first. The sort is
    /// stable, so ties keep insertion order. An empty collection returns
    /// an empty result.
    pub fn query(&self, embedding: &[f32], k: usize) -> StoreResult<Vec<ScoredRecord>> {
        if embedding.len() != self.header.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.header.dimension,
                got: embedding.len(),
            });
        }

        let mut scored: Vec<ScoredRecord> = self
            .records
            .iter()
            .map(|record| ScoredRecord {
                id: record.id.clone(),
                document: record.document.clone(),
                metadata: record.metadata.clone(),
                score: cosine_similarity(embedding, &record.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Summary for inspection commands.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            name: self.header.name.clone(),
            records: self.records.len(),
            dimension: self.header.dimension,
            embedding_model: self.header.embedding_model.clone(),
            indexed_at: self.header.indexed_at.clone(),
        }
    }
}

/// On-disk store holding one collection file per document.
pub struct VectorStore {
    root: PathBuf,
}

impl VectorStore {
    /// Store rooted at a `vectors/` directory. Nothing is created until a
    /// commit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a collection's file.
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// True if a committed collection exists under this name.
    pub fn exists(&self, name: &str) -> bool {
        self.collection_path(name).is_file()
    }

    /// Replace whatever is stored under the collection's name with this
    /// collection. The new file is fully staged before the rename, so a
    /// failed rebuild leaves any previous collection intact.
    pub fn commit(&self, collection: &Collection) -> StoreResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let final_path = self.collection_path(&collection.header.name);
        let staged_path = final_path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(collection).map_err(|e| StoreError::Format {
            path: staged_path.clone(),
            source: e,
        })?;
        fs::write(&staged_path, json).map_err(|e| StoreError::io(&staged_path, e))?;
        fs::rename(&staged_path, &final_path).map_err(|e| StoreError::io(&staged_path, e))?;

        tracing::debug!(
            target: "store",
            collection = %collection.header.name,
            records = collection.len(),
            "collection committed"
        );
        Ok(())
    }

    /// Load a committed collection, or `None` if nothing is stored under
    /// the name.
    pub fn open(&self, name: &str) -> StoreResult<Option<Collection>> {
        let path = self.collection_path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let collection =
            serde_json::from_str(&raw).map_err(|e| StoreError::Format { path, source: e })?;
        Ok(Some(collection))
    }
}

/// Cosine similarity with a zero-magnitude guard.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
