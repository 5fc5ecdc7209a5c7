//! Retrieval-grounded answer generation.
//!
//! Retrieval hands this module an ordered list of scored chunks; the
//! [`Answerer`] drives one of two composition protocols over them and
//! derives page provenance from their metadata.

pub mod prompt;
pub mod provider;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::store::ScoredRecord;

pub use provider::{LlmProvider, OpenAiProvider, ProviderError, ProviderRequest};

/// How retrieved chunks are composed into one answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProtocol {
    /// All retrieved chunks go into a single generation call.
    #[default]
    Stuff,
    /// An initial answer from the first chunk is refined once per
    /// remaining chunk, in retrieval order.
    Refine,
}

impl std::str::FromStr for GenerationProtocol {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stuff" => Ok(Self::Stuff),
            "refine" => Ok(Self::Refine),
            other => Err(PipelineError::Configuration(format!(
                "unknown generation protocol '{other}' (expected stuff or refine)"
            ))),
        }
    }
}

impl std::fmt::Display for GenerationProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stuff => f.write_str("stuff"),
            Self::Refine => f.write_str("refine"),
        }
    }
}

/// A generated answer with the distinct source pages behind it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,

    /// Distinct page numbers from the retrieved chunks, ascending.
    pub cited_pages: Vec<u32>,
}

/// Drives the generation protocol over retrieved chunks.
pub struct Answerer<'a> {
    provider: &'a dyn LlmProvider,
    protocol: GenerationProtocol,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> Answerer<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        protocol: GenerationProtocol,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            protocol,
            temperature,
            max_tokens,
        }
    }

    /// Compose an answer from retrieved chunks.
    ///
    /// With no retrieved chunks, both protocols make a single call with an
    /// empty context block, so the model can still say it does not know.
    pub fn answer(&self, question: &str, retrieved: &[ScoredRecord]) -> PipelineResult<Answer> {
        let text = match self.protocol {
            GenerationProtocol::Stuff => self.stuff(question, retrieved)?,
            GenerationProtocol::Refine => self.refine(question, retrieved)?,
        };
        Ok(Answer {
            text,
            cited_pages: cited_pages(retrieved),
        })
    }

    fn stuff(&self, question: &str, retrieved: &[ScoredRecord]) -> PipelineResult<String> {
        let context = prompt::render_context(retrieved);
        self.complete(&prompt::grounded_prompt(&context, question))
    }

    fn refine(&self, question: &str, retrieved: &[ScoredRecord]) -> PipelineResult<String> {
        let Some((first, rest)) = retrieved.split_first() else {
            return self.complete(&prompt::grounded_prompt("", question));
        };

        let mut answer = self.complete(&prompt::grounded_prompt(first.document.trim(), question))?;
        for record in rest {
            answer =
                self.complete(&prompt::refine_prompt(question, &answer, record.document.trim()))?;
        }
        Ok(answer)
    }

    fn complete(&self, prompt: &str) -> PipelineResult<String> {
        let request = ProviderRequest {
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        self.provider
            .complete(&request)
            .map_err(|e| PipelineError::generation(Stage::Generate, e))
    }
}

/// Distinct, ascending page numbers cited by the retrieved chunks.
pub fn cited_pages(retrieved: &[ScoredRecord]) -> Vec<u32> {
    let mut pages: Vec<u32> = retrieved
        .iter()
        .map(|record| record.metadata.source_page())
        .collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}
