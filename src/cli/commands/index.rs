//! Index stage command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::document::DocumentDir;
use crate::embedding::FastEmbedGenerator;
use crate::pipeline;
use crate::store::VectorStore;

/// Rebuild the document's vector collection from embeddings.json.
pub fn run(dir: &Path, settings: &Settings) -> Result<()> {
    let dir = DocumentDir::new(dir);
    let generator = FastEmbedGenerator::with_model(&settings.embedding.model)
        .context("failed to initialize embedding model")?;

    let records = pipeline::index_document(&dir, &generator)
        .with_context(|| format!("index stage failed for {}", dir.path().display()))?;

    let name = dir.collection_name()?;
    println!("Indexed {records} records into collection '{name}'");
    println!(
        "Wrote {}",
        VectorStore::new(dir.vectors_dir())
            .collection_path(&name)
            .display()
    );
    Ok(())
}
