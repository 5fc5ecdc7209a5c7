//! fastembed-backed embedding generation.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbeddingError, EmbeddingGenerator};

/// Model names accepted for `embedding.model`.
pub const MODELS: &[&str] = &[
    "AllMiniLML6V2",
    "AllMiniLML12V2",
    "BGESmallENV15",
    "BGEBaseENV15",
    "MultilingualE5Small",
    "NomicEmbedTextV15",
];

fn resolve_model(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    let model = match name {
        "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
        "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
        "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
        "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
        "MultilingualE5Small" => EmbeddingModel::MultilingualE5Small,
        "NomicEmbedTextV15" => EmbeddingModel::NomicEmbedTextV15,
        other => {
            return Err(EmbeddingError::UnknownModel {
                model: other.to_string(),
                expected: MODELS.join(", "),
            });
        }
    };
    Ok(model)
}

/// Local embedding model loaded through fastembed.
pub struct FastEmbedGenerator {
    /// fastembed's embed call needs `&mut`; the mutex provides interior
    /// mutability behind the shared trait object.
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimensions: usize,
}

impl FastEmbedGenerator {
    /// Initialize the default AllMiniLML6V2 model (384 dimensions).
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_model("AllMiniLML6V2")
    }

    /// Initialize a named model, downloading it on first use.
    ///
    /// The vector dimension is probed with a test embedding so callers
    /// never have to hardcode per-model sizes.
    pub fn with_model(name: &str) -> Result<Self, EmbeddingError> {
        let model = resolve_model(name)?;
        let mut text_model =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
                .map_err(|e| EmbeddingError::ModelInit {
                    model: name.to_string(),
                    cause: e.to_string(),
                })?;

        let test_embedding = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?;
        let dimensions = test_embedding
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::Backend("model produced no test embedding".to_string()))?;

        tracing::info!(target: "pipeline", model = name, dimensions, "embedding model ready");

        Ok(Self {
            model: Mutex::new(text_model),
            model_id: name.to_string(),
            dimensions,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .unwrap()
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Backend(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }
        for embedding in &embeddings {
            if embedding.len() != self.dimensions {
                return Err(EmbeddingError::Backend(format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.dimensions,
                    embedding.len()
                )));
            }
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_name_is_rejected() {
        let err = resolve_model("word2vec").unwrap_err();
        assert!(matches!(err, EmbeddingError::UnknownModel { .. }));
        assert!(err.to_string().contains("AllMiniLML6V2"));
    }

    #[test]
    fn test_all_advertised_models_resolve() {
        for name in MODELS {
            assert!(resolve_model(name).is_ok(), "model {name} should resolve");
        }
    }

    #[test]
    #[ignore = "Downloads 86MB model - run with --ignored"]
    fn test_embed_real_model() {
        let generator = FastEmbedGenerator::new().unwrap();
        assert_eq!(generator.model_id(), "AllMiniLML6V2");
        assert_eq!(generator.dimension(), 384);

        let vectors = generator.embed(&["hello world", "goodbye world"]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 384);
        assert_ne!(vectors[0], vectors[1]);
    }
}
