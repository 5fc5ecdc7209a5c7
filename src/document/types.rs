//! Core types for pages, sentences, and chunk records.

use serde::{Deserialize, Serialize};

/// A single page of the source document.
///
/// Pages are built once per ingestion run from the extractor's per-page
/// lines and are immutable afterwards. An empty page keeps its number so
/// later pages stay aligned with the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number, assigned in source order.
    pub number: u32,

    /// Text as produced by the extractor, before normalization.
    pub raw_text: String,

    /// Lowercased text with surrounding and internal whitespace collapsed.
    pub normalized_text: String,
}

impl Page {
    /// True if normalization left no text on this page.
    pub fn is_blank(&self) -> bool {
        self.normalized_text.is_empty()
    }
}

/// One sentence with its position in the flattened document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Page the sentence was read from.
    pub page_number: u32,

    /// Normalized sentence text.
    pub text: String,

    /// 0-based position across all pages in reading order. This is the
    /// sole addressing key during chunk assembly.
    pub sequence_index: usize,
}

/// Document-level metadata read from `extracted_metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Title of the source document.
    pub doc_title: String,

    /// When the extractor processed the document.
    #[serde(default)]
    pub processing_date: String,

    /// Language tag used to pick the sentence segmentation rules.
    #[serde(default = "default_language")]
    pub language: String,

    /// Free-form subject area tag.
    #[serde(default)]
    pub domain: String,

    /// First extracted page in the source document.
    #[serde(default = "default_page")]
    pub start_page: u32,

    /// Last extracted page in the source document.
    #[serde(default = "default_page")]
    pub end_page: u32,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_page() -> u32 {
    1
}

/// One chunk as persisted in `chunks.json`.
///
/// `chunk` is the space-joined text of the member sentences in reading
/// order; the remaining fields are the document metadata copied unchanged
/// onto every chunk, plus the page span the member sentences covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk text.
    pub chunk: String,

    #[serde(default)]
    pub doc_title: String,

    #[serde(default)]
    pub processing_date: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub domain: String,

    /// Smallest page number among member sentences.
    pub start_page: u32,

    /// Largest page number among member sentences.
    pub end_page: u32,
}

impl ChunkRecord {
    /// Metadata row stored next to this chunk's embedding.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            doc_title: self.doc_title.clone(),
            processing_date: self.processing_date.clone(),
            language: self.language.clone(),
            domain: self.domain.clone(),
            start_page: self.start_page,
            end_page: self.end_page,
            page: None,
        }
    }
}

/// Metadata carried by every persisted embedding record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub doc_title: String,

    #[serde(default)]
    pub processing_date: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub domain: String,

    pub start_page: u32,

    pub end_page: u32,

    /// Single-page attribution, if the source tracked one. Chunks built
    /// from a page range leave this unset and cite `start_page` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ChunkMetadata {
    /// Page number cited when this record backs an answer.
    pub fn source_page(&self) -> u32 {
        self.page.unwrap_or(self.start_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_record_tolerates_missing_metadata_fields() {
        let json = r#"{"chunk": "some text.", "start_page": 3, "end_page": 4}"#;
        let record: ChunkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.chunk, "some text.");
        assert_eq!(record.doc_title, "");
        assert_eq!(record.start_page, 3);
        assert_eq!(record.end_page, 4);
    }

    #[test]
    fn test_metadata_copies_document_fields() {
        let record = ChunkRecord {
            chunk: "body".to_string(),
            doc_title: "Moby Dick".to_string(),
            processing_date: "2024-01-02".to_string(),
            language: "en".to_string(),
            domain: "fiction".to_string(),
            start_page: 7,
            end_page: 9,
        };
        let meta = record.metadata();
        assert_eq!(meta.doc_title, "Moby Dick");
        assert_eq!(meta.start_page, 7);
        assert_eq!(meta.end_page, 9);
        assert_eq!(meta.page, None);
    }

    #[test]
    fn test_source_page_prefers_explicit_page() {
        let mut meta = ChunkRecord {
            chunk: String::new(),
            doc_title: String::new(),
            processing_date: String::new(),
            language: String::new(),
            domain: String::new(),
            start_page: 2,
            end_page: 5,
        }
        .metadata();
        assert_eq!(meta.source_page(), 2);
        meta.page = Some(4);
        assert_eq!(meta.source_page(), 4);
    }

    #[test]
    fn test_document_metadata_defaults() {
        let json = r#"{"doc_title": "Walden"}"#;
        let meta: DocumentMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.language, "en");
        assert_eq!(meta.start_page, 1);
        assert_eq!(meta.end_page, 1);
        assert_eq!(meta.domain, "");
    }

    #[test]
    fn test_chunk_metadata_page_is_omitted_when_unset() {
        let meta = ChunkMetadata {
            doc_title: String::new(),
            processing_date: String::new(),
            language: String::new(),
            domain: String::new(),
            start_page: 1,
            end_page: 1,
            page: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("\"page\""));
    }
}
