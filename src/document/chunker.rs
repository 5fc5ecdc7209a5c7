//! Token-budget chunking with sentence overlap.
//!
//! Packs the flattened sentence sequence into chunks whose token counts
//! stay within a budget, carrying a bounded tail of each chunk into the
//! next one so context survives the boundary.

use super::tokens::TokenCounter;
use super::types::{ChunkRecord, DocumentMetadata, Sentence};

/// Bounds for one chunking run.
///
/// `overlap` must stay below `chunk_size`; settings validation enforces
/// this before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum tokens per chunk. A single sentence larger than this
    /// becomes its own chunk.
    pub chunk_size: usize,

    /// Exclusive upper bound on tokens repeated into the next chunk.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// Packs sentences into token-bounded chunks.
pub struct TokenBudgetChunker<'a> {
    counter: &'a dyn TokenCounter,
    config: ChunkerConfig,
}

impl<'a> TokenBudgetChunker<'a> {
    /// Create a chunker over a token counter.
    pub fn new(counter: &'a dyn TokenCounter, config: ChunkerConfig) -> Self {
        Self { counter, config }
    }

    /// Chunk a sentence sequence, copying the document metadata onto every
    /// produced record and deriving each record's covered page span.
    ///
    /// An empty sequence produces no chunks; chunks are never empty and
    /// never split a sentence.
    pub fn chunk(&self, sentences: &[Sentence], metadata: &DocumentMetadata) -> Vec<ChunkRecord> {
        let token_counts: Vec<usize> = sentences
            .iter()
            .map(|sentence| self.counter.count(&sentence.text))
            .collect();

        self.pack(&token_counts)
            .into_iter()
            .filter_map(|members| assemble_chunk(sentences, &members, metadata))
            .collect()
    }

    /// Single forward pass producing member-index lists per chunk.
    fn pack(&self, token_counts: &[usize]) -> Vec<Vec<usize>> {
        let ChunkerConfig {
            chunk_size,
            overlap,
        } = self.config;

        let mut chunks: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_tokens = 0usize;

        for (i, &sent_tokens) in token_counts.iter().enumerate() {
            if current_tokens + sent_tokens > chunk_size {
                if !current.is_empty() {
                    chunks.push(current.clone());
                }

                // Seed the next chunk with trailing sentences of the one
                // just closed, keeping the carried token count strictly
                // below the overlap bound.
                let mut overlap_members: Vec<usize> = Vec::new();
                let mut overlap_tokens = 0usize;
                for &idx in current.iter().rev() {
                    let t_count = token_counts[idx];
                    if overlap_tokens + t_count < overlap {
                        overlap_members.insert(0, idx);
                        overlap_tokens += t_count;
                    } else {
                        break;
                    }
                }
                current = overlap_members;
                current_tokens = overlap_tokens;

                if sent_tokens > chunk_size {
                    // The sentence alone busts the budget: flush any
                    // pending overlap as its own chunk, then emit the
                    // sentence standalone.
                    if !current.is_empty() {
                        chunks.push(current.clone());
                        current.clear();
                        current_tokens = 0;
                    }
                    chunks.push(vec![i]);
                } else {
                    current.push(i);
                    current_tokens += sent_tokens;
                }
            } else {
                current.push(i);
                current_tokens += sent_tokens;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

/// Join member sentences into one record and derive its page span.
fn assemble_chunk(
    sentences: &[Sentence],
    members: &[usize],
    metadata: &DocumentMetadata,
) -> Option<ChunkRecord> {
    let mut start_page = u32::MAX;
    let mut end_page = 0u32;
    let mut text = String::new();

    for (n, &idx) in members.iter().enumerate() {
        let sentence = sentences.get(idx)?;
        start_page = start_page.min(sentence.page_number);
        end_page = end_page.max(sentence.page_number);
        if n > 0 {
            text.push(' ');
        }
        text.push_str(&sentence.text);
    }

    if members.is_empty() {
        return None;
    }

    Some(ChunkRecord {
        chunk: text,
        doc_title: metadata.doc_title.clone(),
        processing_date: metadata.processing_date.clone(),
        language: metadata.language.clone(),
        domain: metadata.domain.clone(),
        start_page,
        end_page,
    })
}
