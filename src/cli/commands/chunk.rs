//! Chunk stage command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::progress::StageBars;
use crate::config::Settings;
use crate::document::DocumentDir;
use crate::pipeline;

/// Run the chunk stage over one document directory.
pub fn run(dir: &Path, settings: &Settings, show_progress: bool) -> Result<()> {
    let dir = DocumentDir::new(dir);
    let mut bars = StageBars::new(show_progress);

    let stats = pipeline::chunk_document_with_progress(&dir, settings, |p| bars.observe(p))
        .with_context(|| format!("chunk stage failed for {}", dir.path().display()))?;
    bars.finish();

    println!(
        "Chunked {} pages into {} chunks ({} sentences)",
        stats.pages, stats.chunks, stats.sentences
    );
    println!("Wrote {}", dir.chunks_path().display());
    Ok(())
}
