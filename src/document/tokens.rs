//! Token counting behind a trait so chunking stays testable.

use tiktoken_rs::CoreBPE;

use crate::error::{PipelineError, PipelineResult};

/// Encoding names accepted for `chunking.tokenizer`.
pub const ENCODINGS: &[&str] = &["cl100k_base", "o200k_base", "p50k_base", "r50k_base"];

/// Counts tokens the way the embedding and generation stack would.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// Token counter backed by a named tiktoken encoding.
pub struct TiktokenCounter {
    encoding: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load a tiktoken encoding by name. Unknown names are a
    /// configuration error, not a fallback.
    pub fn new(encoding: &str) -> PipelineResult<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(PipelineError::Configuration(format!(
                    "unknown tokenizer '{other}' (expected one of: {})",
                    ENCODINGS.join(", ")
                )));
            }
        }
        .map_err(|e| {
            PipelineError::Configuration(format!("failed to load tokenizer '{encoding}': {e}"))
        })?;

        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    /// Name of the loaded encoding.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_encoding_is_a_configuration_error() {
        let err = TiktokenCounter::new("made_up_base").unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("made_up_base"));
    }

    #[test]
    fn test_cl100k_counts_tokens() {
        let counter = TiktokenCounter::new("cl100k_base").unwrap();
        assert_eq!(counter.encoding(), "cl100k_base");
        assert_eq!(counter.count("hello world"), 2);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn test_counts_grow_with_text() {
        let counter = TiktokenCounter::new("cl100k_base").unwrap();
        let short = counter.count("a sentence.");
        let long = counter.count("a sentence. and then quite a few more words after it.");
        assert!(long > short);
    }
}
