//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Question answering over extracted documents
#[derive(Parser)]
#[command(
    name = "folio",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ask questions over extracted documents",
    long_about = "Chunk extracted page text, embed and index it, then answer \
                  questions grounded in the retrieved chunks.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ folio init                       # Write .folio/settings.toml\n  $ folio ingest books/walden        # Chunk + embed + index one document\n  $ folio ask books/walden \"Why did he go to the woods?\"\n  $ folio stats books/walden         # Inspect the indexed collection"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .folio directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Chunk a document's extracted pages
    #[command(
        about = "Segment extracted pages into token-bounded chunks",
        after_help = "Examples:\n  folio chunk books/walden\n  folio chunk books/walden --no-progress\n\nReads extracted.txt and extracted_metadata.json, writes chunks.json."
    )]
    Chunk {
        /// Document directory with extracted.txt and extracted_metadata.json
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Embed a document's chunks
    #[command(
        about = "Generate embeddings for chunks.json",
        after_help = "Examples:\n  folio embed books/walden\n\nReads chunks.json, writes embeddings.json. Downloads the embedding\nmodel on first use."
    )]
    Embed {
        /// Document directory with a chunks.json
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Rebuild a document's vector collection
    #[command(
        about = "Index embeddings.json into the vector store",
        after_help = "Examples:\n  folio index books/walden\n\nReads embeddings.json and replaces the committed collection under\nvectors/. The previous collection stays intact if the rebuild fails."
    )]
    Index {
        /// Document directory with an embeddings.json
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Run chunk, embed, and index in order
    #[command(
        about = "Run the full ingestion pipeline for a document",
        after_help = "Examples:\n  folio ingest books/walden\n  folio ingest books/walden --no-progress"
    )]
    Ingest {
        /// Document directory with extracted.txt and extracted_metadata.json
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Ask a question over an indexed document
    #[command(
        about = "Answer a question from retrieved chunks",
        after_help = "Examples:\n  folio ask books/walden \"Why did he go to the woods?\"\n  folio ask books/walden --interactive\n  folio ask books/walden \"Who built the cabin?\" --protocol refine\n  folio ask books/walden \"Who built the cabin?\" --top-k 3 --json\n\nRequires OPENAI_API_KEY in the environment."
    )]
    Ask {
        /// Document directory with an indexed collection
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Question to answer (omit with --interactive)
        #[arg(value_name = "QUESTION")]
        question: Option<String>,

        /// Read questions from stdin until quit/exit
        #[arg(short, long)]
        interactive: bool,

        /// Generation protocol: stuff or refine (overrides config)
        #[arg(long)]
        protocol: Option<String>,

        /// Number of chunks to retrieve (overrides config)
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect an indexed collection
    #[command(
        about = "Show record count, model, and sample records",
        after_help = "Examples:\n  folio stats books/walden\n  folio stats books/walden --json"
    )]
    Stats {
        /// Document directory with an indexed collection
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
}
