//! Embed stage command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::progress::StageBars;
use crate::config::Settings;
use crate::document::DocumentDir;
use crate::embedding::{EmbeddingGenerator, FastEmbedGenerator};
use crate::pipeline;

/// Run the embed stage over one document directory.
pub fn run(dir: &Path, settings: &Settings, show_progress: bool) -> Result<()> {
    let dir = DocumentDir::new(dir);
    let generator = FastEmbedGenerator::with_model(&settings.embedding.model)
        .context("failed to initialize embedding model")?;

    let mut bars = StageBars::new(show_progress);
    let records = pipeline::embed_document_with_progress(&dir, &generator, |p| bars.observe(p))
        .with_context(|| format!("embed stage failed for {}", dir.path().display()))?;
    bars.finish();

    println!("Embedded {records} chunks with {}", generator.model_id());
    println!("Wrote {}", dir.embeddings_path().display());
    Ok(())
}
