//! Stage orchestration over a document directory.
//!
//! Each stage reads its input artifact from the directory, does its work,
//! and persists its output artifact, so stages can run individually
//! (`chunk` → `embed` → `index`) or chained by [`ingest_document`]. The
//! query side ([`retrieve_chunks`], [`ask_document`]) only ever reads.
//!
//! Functions report progress through a callback so the CLI can render
//! bars without the pipeline knowing about terminals.

use crate::answer::{Answer, Answerer, LlmProvider};
use crate::config::Settings;
use crate::document::{
    ChunkerConfig, DocumentDir, Segmenter, Sentence, TiktokenCounter, TokenBudgetChunker,
    TokenCounter,
};
use crate::embedding::{EmbeddingBatch, EmbeddingGenerator};
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::store::{Collection, CollectionHeader, EmbeddingRecord, ScoredRecord, VectorStore};

/// Progress updates during ingestion.
#[derive(Debug, Clone)]
pub enum IngestProgress {
    /// Segmenting one page into sentences.
    SegmentingPages { current: usize, total: usize },
    /// Generating embeddings for chunk texts.
    GeneratingEmbeddings { current: usize, total: usize },
}

/// Default batch size for embedding generation.
/// Smaller batches reduce memory pressure and provide smoother progress.
const EMBEDDING_BATCH_SIZE: usize = 64;

/// Records are appended to a rebuilt collection in batches of this size.
const INDEX_BATCH_SIZE: usize = 100;

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStats {
    /// Pages read from the extracted text, blank pages included.
    pub pages: usize,
    pub sentences: usize,
    pub chunks: usize,
    /// Embedding records written. Zero for a chunk-only run.
    pub records: usize,
}

/// Run the chunk stage: pages → sentences → token-bounded chunks,
/// persisted as `chunks.json`.
pub fn chunk_document(dir: &DocumentDir, settings: &Settings) -> PipelineResult<IngestStats> {
    chunk_document_with_progress(dir, settings, |_| {})
}

/// Chunk stage with a progress callback, reported once per page.
pub fn chunk_document_with_progress<F>(
    dir: &DocumentDir,
    settings: &Settings,
    mut on_progress: F,
) -> PipelineResult<IngestStats>
where
    F: FnMut(IngestProgress),
{
    settings.validate()?;

    let metadata = dir.read_metadata()?;
    let pages = dir.read_pages()?;
    let counter = TiktokenCounter::new(&settings.chunking.tokenizer)?;
    let segmenter = Segmenter::for_language(&metadata.language);

    let total_pages = pages.len();
    let mut sentences: Vec<Sentence> = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        on_progress(IngestProgress::SegmentingPages {
            current: idx + 1,
            total: total_pages,
        });
        if page.is_blank() {
            continue;
        }
        for text in segmenter.sentences(&page.normalized_text) {
            sentences.push(Sentence {
                page_number: page.number,
                text,
                sequence_index: sentences.len(),
            });
        }
    }

    let chunker = TokenBudgetChunker::new(
        &counter,
        ChunkerConfig {
            chunk_size: settings.chunking.chunk_size,
            overlap: settings.chunking.overlap,
        },
    );
    let chunks = chunker.chunk(&sentences, &metadata);
    dir.write_chunks(&chunks)?;

    for (i, chunk) in chunks.iter().take(3).enumerate() {
        tracing::debug!(
            target: "pipeline",
            chunk = i,
            tokens = counter.count(&chunk.chunk),
            start_page = chunk.start_page,
            end_page = chunk.end_page,
            "chunk sample"
        );
    }
    tracing::info!(
        target: "pipeline",
        doc = %metadata.doc_title,
        pages = total_pages,
        sentences = sentences.len(),
        chunks = chunks.len(),
        "chunk stage complete"
    );

    Ok(IngestStats {
        pages: total_pages,
        sentences: sentences.len(),
        chunks: chunks.len(),
        records: 0,
    })
}

/// Run the embed stage: `chunks.json` → vectors, persisted as
/// `embeddings.json`. Returns the number of records written.
pub fn embed_document(
    dir: &DocumentDir,
    generator: &dyn EmbeddingGenerator,
) -> PipelineResult<usize> {
    embed_document_with_progress(dir, generator, |_| {})
}

/// Embed stage with a progress callback, reported once per batch.
pub fn embed_document_with_progress<F>(
    dir: &DocumentDir,
    generator: &dyn EmbeddingGenerator,
    mut on_progress: F,
) -> PipelineResult<usize>
where
    F: FnMut(IngestProgress),
{
    let chunks = dir.read_chunks()?;
    let total_chunks = chunks.len();

    let mut batch = EmbeddingBatch::with_capacity(total_chunks);
    let mut processed = 0;
    for window in chunks.chunks(EMBEDDING_BATCH_SIZE) {
        let texts: Vec<&str> = window.iter().map(|c| c.chunk.as_str()).collect();
        let embeddings = generator
            .embed(&texts)
            .map_err(|e| PipelineError::generation(Stage::Embed, e))?;

        for (record, embedding) in window.iter().zip(embeddings) {
            // Ids are positional across the whole document, matching the
            // chunk order in chunks.json.
            let id = format!("chunk_{}", batch.len());
            batch.push(id, record.chunk.clone(), record.metadata(), embedding);
        }

        processed += window.len();
        on_progress(IngestProgress::GeneratingEmbeddings {
            current: processed,
            total: total_chunks,
        });
    }

    batch.save(&dir.embeddings_path())?;
    tracing::info!(
        target: "pipeline",
        model = generator.model_id(),
        records = batch.len(),
        "embed stage complete"
    );
    Ok(batch.len())
}

/// Run the index stage: `embeddings.json` → a committed collection under
/// `vectors/`. The whole collection is rebuilt; a failure before the
/// commit leaves any previous collection intact. Returns the number of
/// records indexed.
pub fn index_document(
    dir: &DocumentDir,
    generator: &dyn EmbeddingGenerator,
) -> PipelineResult<usize> {
    let batch = EmbeddingBatch::load(&dir.embeddings_path())?;
    let name = dir.collection_name()?;

    let mut collection = Collection::new(CollectionHeader::new(
        &name,
        generator.model_id(),
        generator.dimension(),
    ));

    let total = batch.len();
    let mut rows = batch
        .ids
        .into_iter()
        .zip(batch.documents)
        .zip(batch.metadatas)
        .zip(batch.embeddings)
        .map(|(((id, document), metadata), embedding)| EmbeddingRecord {
            id,
            document,
            metadata,
            embedding,
        });

    loop {
        let slab: Vec<EmbeddingRecord> = rows.by_ref().take(INDEX_BATCH_SIZE).collect();
        if slab.is_empty() {
            break;
        }
        collection.add_batch(slab)?;
    }

    VectorStore::new(dir.vectors_dir()).commit(&collection)?;
    tracing::info!(
        target: "pipeline",
        collection = %name,
        records = total,
        dimension = collection.header.dimension,
        "index stage complete"
    );
    Ok(total)
}

/// Run all three ingestion stages in order.
pub fn ingest_document(
    dir: &DocumentDir,
    settings: &Settings,
    generator: &dyn EmbeddingGenerator,
) -> PipelineResult<IngestStats> {
    ingest_document_with_progress(dir, settings, generator, |_| {})
}

/// Full ingestion with a progress callback spanning both reporting
/// phases.
pub fn ingest_document_with_progress<F>(
    dir: &DocumentDir,
    settings: &Settings,
    generator: &dyn EmbeddingGenerator,
    mut on_progress: F,
) -> PipelineResult<IngestStats>
where
    F: FnMut(IngestProgress),
{
    let mut stats = chunk_document_with_progress(dir, settings, &mut on_progress)?;
    stats.records = embed_document_with_progress(dir, generator, &mut on_progress)?;
    index_document(dir, generator)?;
    Ok(stats)
}

/// Open the document's committed collection, or fail with `NotFound`.
pub fn open_collection(dir: &DocumentDir) -> PipelineResult<Collection> {
    let name = dir.collection_name()?;
    VectorStore::new(dir.vectors_dir())
        .open(&name)?
        .ok_or(PipelineError::NotFound(name))
}

/// Embed the question and return the top-k records from the document's
/// collection, best first.
///
/// Fails with `Configuration` when the collection was indexed under a
/// different embedding model or dimension than the given generator.
pub fn retrieve_chunks(
    dir: &DocumentDir,
    settings: &Settings,
    generator: &dyn EmbeddingGenerator,
    question: &str,
) -> PipelineResult<Vec<ScoredRecord>> {
    settings.validate()?;
    let collection = open_collection(dir)?;
    check_embedding_function(&collection.header, generator)?;

    let mut vectors = generator
        .embed(&[question])
        .map_err(|e| PipelineError::generation(Stage::Retrieve, e))?;
    if vectors.is_empty() {
        return Err(PipelineError::generation(
            Stage::Retrieve,
            "embedding backend returned no query vector",
        ));
    }
    let query = vectors.swap_remove(0);

    let hits = collection.query(&query, settings.retrieval.top_k)?;
    tracing::info!(
        target: "pipeline",
        collection = %collection.header.name,
        top_k = settings.retrieval.top_k,
        hits = hits.len(),
        "retrieval complete"
    );
    Ok(hits)
}

/// Answer a question over one document: retrieve, then generate under
/// the configured protocol.
pub fn ask_document(
    dir: &DocumentDir,
    settings: &Settings,
    generator: &dyn EmbeddingGenerator,
    provider: &dyn LlmProvider,
    question: &str,
) -> PipelineResult<Answer> {
    let retrieved = retrieve_chunks(dir, settings, generator, question)?;
    let answerer = Answerer::new(
        provider,
        settings.generation.protocol,
        settings.generation.temperature,
        settings.generation.max_tokens,
    );
    answerer.answer(question, &retrieved)
}

fn check_embedding_function(
    header: &CollectionHeader,
    generator: &dyn EmbeddingGenerator,
) -> PipelineResult<()> {
    if header.embedding_model != generator.model_id() || header.dimension != generator.dimension()
    {
        return Err(PipelineError::Configuration(format!(
            "collection '{}' was indexed with '{}' ({} dims) but the query uses '{}' ({} dims); \
             re-run index with the current model",
            header.name,
            header.embedding_model,
            header.dimension,
            generator.model_id(),
            generator.dimension()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use std::fs;
    use tempfile::TempDir;

    /// Deterministic generator: dimension 3, vector derived from text
    /// length so distinct texts stay distinguishable.
    struct MockEmbedding;

    impl EmbeddingGenerator for MockEmbedding {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0, 0.0])
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "mock-model"
        }
    }

    fn document_fixture(pages: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("extracted.txt"), pages).unwrap();
        fs::write(
            tmp.path().join("extracted_metadata.json"),
            r#"{"doc_title": "Fixture", "language": "en"}"#,
        )
        .unwrap();
        tmp
    }

    #[test]
    fn test_chunk_stage_writes_chunks_and_counts() {
        let tmp = document_fixture("First sentence. Second sentence.\nThird one here.\n");
        let dir = DocumentDir::new(tmp.path());

        let stats = chunk_document(&dir, &Settings::default()).unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.records, 0);
        assert!(dir.chunks_path().is_file());
    }

    #[test]
    fn test_chunk_stage_reports_page_progress() {
        let tmp = document_fixture("One sentence.\nAnother sentence.\n");
        let dir = DocumentDir::new(tmp.path());

        let mut seen = Vec::new();
        chunk_document_with_progress(&dir, &Settings::default(), |p| {
            if let IngestProgress::SegmentingPages { current, total } = p {
                seen.push((current, total));
            }
        })
        .unwrap();

        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_embed_stage_assigns_positional_ids() {
        let tmp = document_fixture("Short. Words. Alone. Spread. Out. Widely.\n");
        let dir = DocumentDir::new(tmp.path());

        let mut settings = Settings::default();
        settings.chunking.chunk_size = 2;
        settings.chunking.overlap = 0;
        chunk_document(&dir, &settings).unwrap();

        let records = embed_document(&dir, &MockEmbedding).unwrap();
        assert!(records > 1);

        let batch = EmbeddingBatch::load(&dir.embeddings_path()).unwrap();
        let expected: Vec<String> = (0..records).map(|i| format!("chunk_{i}")).collect();
        assert_eq!(batch.ids, expected);
        assert!(batch.embeddings.iter().all(|v| v.len() == 3));
    }

    #[test]
    fn test_embed_stage_handles_empty_chunk_file() {
        let tmp = TempDir::new().unwrap();
        let dir = DocumentDir::new(tmp.path());
        fs::write(dir.chunks_path(), "[]").unwrap();

        let records = embed_document(&dir, &MockEmbedding).unwrap();
        assert_eq!(records, 0);

        let batch = EmbeddingBatch::load(&dir.embeddings_path()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_index_stage_stamps_embedding_function() {
        let tmp = document_fixture("A single sentence lives here.\n");
        let dir = DocumentDir::new(tmp.path());

        chunk_document(&dir, &Settings::default()).unwrap();
        embed_document(&dir, &MockEmbedding).unwrap();
        let indexed = index_document(&dir, &MockEmbedding).unwrap();
        assert_eq!(indexed, 1);

        let collection = open_collection(&dir).unwrap();
        assert_eq!(collection.header.embedding_model, "mock-model");
        assert_eq!(collection.header.dimension, 3);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_ingest_runs_all_stages() {
        let tmp = document_fixture("First sentence here. Second sentence there.\n");
        let dir = DocumentDir::new(tmp.path());

        let stats = ingest_document(&dir, &Settings::default(), &MockEmbedding).unwrap();

        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.records, stats.chunks);
        assert!(dir.chunks_path().is_file());
        assert!(dir.embeddings_path().is_file());
        assert!(!open_collection(&dir).unwrap().is_empty());
    }

    #[test]
    fn test_retrieve_without_index_is_not_found() {
        let tmp = document_fixture("Some text.\n");
        let dir = DocumentDir::new(tmp.path());

        let err =
            retrieve_chunks(&dir, &Settings::default(), &MockEmbedding, "anything").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn test_retrieve_rejects_mismatched_embedding_function() {
        struct OtherModel;
        impl EmbeddingGenerator for OtherModel {
            fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                Ok(texts.iter().map(|_| vec![0.0; 5]).collect())
            }
            fn dimension(&self) -> usize {
                5
            }
            fn model_id(&self) -> &str {
                "other-model"
            }
        }

        let tmp = document_fixture("A sentence to index.\n");
        let dir = DocumentDir::new(tmp.path());
        ingest_document(&dir, &Settings::default(), &MockEmbedding).unwrap();

        let err = retrieve_chunks(&dir, &Settings::default(), &OtherModel, "query").unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("mock-model"));
        assert!(err.to_string().contains("other-model"));
    }

    #[test]
    fn test_retrieve_respects_top_k() {
        let tmp = document_fixture("One. Two. Three. Four. Five. Six.\n");
        let dir = DocumentDir::new(tmp.path());

        let mut settings = Settings::default();
        settings.chunking.chunk_size = 1;
        settings.chunking.overlap = 0;
        ingest_document(&dir, &settings, &MockEmbedding).unwrap();

        settings.retrieval.top_k = 2;
        let hits = retrieve_chunks(&dir, &settings, &MockEmbedding, "two").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }
}
