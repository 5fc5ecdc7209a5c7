//! Ask command: retrieval-grounded question answering.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::answer::{Answer, LlmProvider, OpenAiProvider};
use crate::config::Settings;
use crate::document::DocumentDir;
use crate::embedding::FastEmbedGenerator;
use crate::pipeline;

/// Per-invocation overrides for the ask command.
pub struct AskOptions {
    pub question: Option<String>,
    pub interactive: bool,
    pub protocol: Option<String>,
    pub top_k: Option<usize>,
    pub json: bool,
}

/// Answer one question, or run the interactive loop.
pub fn run(dir: &Path, settings: &Settings, options: AskOptions) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(protocol) = &options.protocol {
        settings.generation.protocol = protocol.parse()?;
    }
    if let Some(top_k) = options.top_k {
        settings.retrieval.top_k = top_k;
    }

    let dir = DocumentDir::new(dir);
    let generator = FastEmbedGenerator::with_model(&settings.embedding.model)
        .context("failed to initialize embedding model")?;
    let provider = OpenAiProvider::new(
        &settings.generation.model,
        &settings.generation.api_base,
        Duration::from_secs(settings.generation.timeout_secs),
    )?;

    if options.interactive {
        return run_interactive(&dir, &settings, &generator, &provider, options.json);
    }

    let Some(question) = options.question.as_deref() else {
        bail!("provide a question, or pass --interactive");
    };
    let answer = pipeline::ask_document(&dir, &settings, &generator, &provider, question)?;
    print_answer(&answer, options.json)
}

/// Read questions from stdin until `quit`, `exit`, or EOF.
fn run_interactive(
    dir: &DocumentDir,
    settings: &Settings,
    generator: &FastEmbedGenerator,
    provider: &dyn LlmProvider,
    json: bool,
) -> Result<()> {
    println!(
        "Ask questions about '{}'. Type 'quit' or 'exit' to leave.",
        dir.collection_name()?
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }

        // One bad question should not end the session.
        match pipeline::ask_document(dir, settings, generator, provider, question) {
            Ok(answer) => print_answer(&answer, json)?,
            Err(e) => eprintln!("Error: {e}"),
        }
        println!();
    }
    Ok(())
}

fn print_answer(answer: &Answer, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
        return Ok(());
    }

    println!("{}", answer.text);
    if !answer.cited_pages.is_empty() {
        let pages: Vec<String> = answer.cited_pages.iter().map(|p| p.to_string()).collect();
        println!("\nSources: pages {}", pages.join(", "));
    }
    Ok(())
}
