//! Stats command: inspect an indexed collection.

use std::path::Path;

use anyhow::Result;

use crate::document::DocumentDir;
use crate::pipeline;

const PREVIEW_RECORDS: usize = 3;
const PREVIEW_CHARS: usize = 80;

/// Show collection header fields and a preview of the first records.
pub fn run(dir: &Path, json: bool) -> Result<()> {
    let dir = DocumentDir::new(dir);
    let collection = pipeline::open_collection(&dir)?;
    let stats = collection.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Collection: {}", stats.name);
    println!("  Records:   {}", stats.records);
    println!("  Dimension: {}", stats.dimension);
    println!("  Model:     {}", stats.embedding_model);
    println!("  Indexed:   {}", stats.indexed_at);

    if !collection.is_empty() {
        println!("  Sample:");
        for record in collection.records.iter().take(PREVIEW_RECORDS) {
            println!(
                "    {} (pages {}-{}): {}",
                record.id,
                record.metadata.start_page,
                record.metadata.end_page,
                record.preview(PREVIEW_CHARS)
            );
        }
    }
    Ok(())
}
