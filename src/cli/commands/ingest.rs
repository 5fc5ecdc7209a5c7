//! Ingest command: chunk, embed, and index in one run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::progress::StageBars;
use crate::config::Settings;
use crate::document::DocumentDir;
use crate::embedding::FastEmbedGenerator;
use crate::pipeline;

/// Run the full ingestion pipeline over one document directory.
pub fn run(dir: &Path, settings: &Settings, show_progress: bool) -> Result<()> {
    let dir = DocumentDir::new(dir);
    let generator = FastEmbedGenerator::with_model(&settings.embedding.model)
        .context("failed to initialize embedding model")?;

    let mut bars = StageBars::new(show_progress);
    let stats =
        pipeline::ingest_document_with_progress(&dir, settings, &generator, |p| bars.observe(p))
            .with_context(|| format!("ingest failed for {}", dir.path().display()))?;
    bars.finish();

    println!(
        "Ingested '{}': {} pages, {} sentences, {} chunks, {} records indexed",
        dir.collection_name()?,
        stats.pages,
        stats.sentences,
        stats.chunks,
        stats.records
    );
    Ok(())
}
