//! Question answering over an ingested document.
//!
//! Ingests a small fixture with a mock embedding generator, then drives
//! [`folio::pipeline::ask_document`] with a scripted provider to check
//! retrieval grounding, protocol call patterns, and page citations.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use folio::answer::{GenerationProtocol, LlmProvider, ProviderError, ProviderRequest};
use folio::config::Settings;
use folio::document::DocumentDir;
use folio::embedding::{EmbeddingError, EmbeddingGenerator};
use folio::error::PipelineError;
use folio::pipeline;
use tempfile::TempDir;

/// Mock embedding generator for testing.
struct MockEmbeddingGenerator;

impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let embeddings = texts
            .iter()
            .map(|text| {
                let mut vec = vec![0.1_f32; 4];
                for (i, byte) in text.bytes().enumerate() {
                    vec[i % 4] += byte as f32 / 255.0;
                }
                let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
                for val in &mut vec {
                    *val /= magnitude;
                }
                vec
            })
            .collect();
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_id(&self) -> &str {
        "mock-embedder"
    }
}

/// Records every prompt and replies with numbered canned answers.
struct ScriptedProvider {
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted"
    }

    fn complete(&self, request: &ProviderRequest<'_>) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(request.prompt.to_string());
        Ok(format!("answer {}", prompts.len()))
    }
}

struct FailingProvider;

impl LlmProvider for FailingProvider {
    fn model(&self) -> &str {
        "failing"
    }

    fn complete(&self, _request: &ProviderRequest<'_>) -> Result<String, ProviderError> {
        Err(ProviderError::Status {
            status: 500,
            body: "backend down".to_string(),
        })
    }
}

fn write_document(dir: &Path) {
    fs::write(
        dir.join("extracted.txt"),
        "The pond froze early that winter. Ice covered every inlet.\n\
         The cabin stayed warm through the storm. Wood smoke rose daily.\n",
    )
    .unwrap();
    fs::write(
        dir.join("extracted_metadata.json"),
        r#"{"doc_title": "Winter Notes", "processing_date": "2024-06-01",
            "language": "en", "domain": "nature", "start_page": 1, "end_page": 2}"#,
    )
    .unwrap();
}

/// One sentence per chunk and a top_k large enough to retrieve them all,
/// so call-pattern assertions do not depend on ranking.
fn small_chunk_settings() -> Settings {
    let mut settings = Settings::default();
    settings.chunking.chunk_size = 1;
    settings.chunking.overlap = 0;
    settings.retrieval.top_k = 10;
    settings
}

fn ingested_fixture(settings: &Settings) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_document(tmp.path());
    let dir = DocumentDir::new(tmp.path());
    pipeline::ingest_document(&dir, settings, &MockEmbeddingGenerator).unwrap();
    tmp
}

#[test]
fn test_stuff_protocol_grounds_one_call_in_retrieved_text() {
    let settings = small_chunk_settings();
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());
    let provider = ScriptedProvider::new();

    let answer = pipeline::ask_document(
        &dir,
        &settings,
        &MockEmbeddingGenerator,
        &provider,
        "How cold was the winter?",
    )
    .unwrap();

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("How cold was the winter?"));
    // With top_k above the chunk count, every chunk lands in the context.
    assert!(prompts[0].contains("the pond froze early that winter."));
    assert!(prompts[0].contains("wood smoke rose daily."));

    assert_eq!(answer.text, "answer 1");
    assert_eq!(answer.cited_pages, vec![1, 2]);
}

#[test]
fn test_refine_protocol_calls_once_per_retrieved_chunk() {
    let mut settings = small_chunk_settings();
    settings.generation.protocol = GenerationProtocol::Refine;
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());
    let provider = ScriptedProvider::new();

    let answer = pipeline::ask_document(
        &dir,
        &settings,
        &MockEmbeddingGenerator,
        &provider,
        "What kept the cabin warm?",
    )
    .unwrap();

    let retrieved = pipeline::retrieve_chunks(
        &dir,
        &settings,
        &MockEmbeddingGenerator,
        "What kept the cabin warm?",
    )
    .unwrap();
    assert_eq!(retrieved.len(), 4);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), retrieved.len());
    // The chain threads each intermediate answer into the next call.
    assert!(prompts[1].contains("answer 1"));
    assert!(prompts[3].contains("answer 3"));
    assert_eq!(answer.text, "answer 4");
}

#[test]
fn test_ask_unindexed_document_is_not_found() {
    let tmp = TempDir::new().unwrap();
    write_document(tmp.path());
    let dir = DocumentDir::new(tmp.path());
    let provider = ScriptedProvider::new();

    let err = pipeline::ask_document(
        &dir,
        &Settings::default(),
        &MockEmbeddingGenerator,
        &provider,
        "Anything?",
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::NotFound(_)));
    assert!(provider.prompts().is_empty());
}

#[test]
fn test_retrieval_order_is_deterministic() {
    let settings = small_chunk_settings();
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());

    let question = "Where did the smoke rise?";
    let first =
        pipeline::retrieve_chunks(&dir, &settings, &MockEmbeddingGenerator, question).unwrap();
    let second =
        pipeline::retrieve_chunks(&dir, &settings, &MockEmbeddingGenerator, question).unwrap();

    let first_ids: Vec<&str> = first.iter().map(|hit| hit.id.as_str()).collect();
    let second_ids: Vec<&str> = second.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
    assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_retrieved_metadata_keeps_page_attribution() {
    let settings = small_chunk_settings();
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());

    let hits =
        pipeline::retrieve_chunks(&dir, &settings, &MockEmbeddingGenerator, "winter").unwrap();

    for hit in &hits {
        assert_eq!(hit.metadata.doc_title, "Winter Notes");
        assert!(hit.metadata.start_page >= 1 && hit.metadata.end_page <= 2);
    }
    // Single-sentence chunks never span pages.
    assert!(hits.iter().all(|h| h.metadata.start_page == h.metadata.end_page));
}

#[test]
fn test_provider_failure_reaches_the_caller() {
    let settings = small_chunk_settings();
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());

    let err = pipeline::ask_document(
        &dir,
        &settings,
        &MockEmbeddingGenerator,
        &FailingProvider,
        "Does this fail?",
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Generation { .. }));
    assert!(err.to_string().contains("backend down"));
}

#[test]
fn test_answer_serializes_text_and_cited_pages() {
    let settings = small_chunk_settings();
    let tmp = ingested_fixture(&settings);
    let dir = DocumentDir::new(tmp.path());
    let provider = ScriptedProvider::new();

    let answer = pipeline::ask_document(
        &dir,
        &settings,
        &MockEmbeddingGenerator,
        &provider,
        "What about the pond?",
    )
    .unwrap();

    let json = serde_json::to_value(&answer).unwrap();
    assert_eq!(json["text"], "answer 1");
    let pages: Vec<u64> = json["cited_pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(pages, vec![1, 2]);
}
