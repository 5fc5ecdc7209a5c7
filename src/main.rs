//! folio binary: parse arguments, load settings, dispatch commands.

use clap::Parser;

use folio::cli::{Cli, Commands, commands};
use folio::config::Settings;
use folio::logging;

fn main() {
    let cli = Cli::parse();

    // For non-init commands, check if the project is initialized
    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    logging::init_with_config(&settings.logging);

    let result = match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Chunk { dir, no_progress } => commands::chunk::run(&dir, &settings, !no_progress),
        Commands::Embed { dir, no_progress } => commands::embed::run(&dir, &settings, !no_progress),
        Commands::Index { dir } => commands::index::run(&dir, &settings),
        Commands::Ingest { dir, no_progress } => {
            commands::ingest::run(&dir, &settings, !no_progress)
        }
        Commands::Ask {
            dir,
            question,
            interactive,
            protocol,
            top_k,
            json,
        } => commands::ask::run(
            &dir,
            &settings,
            commands::ask::AskOptions {
                question,
                interactive,
                protocol,
                top_k,
                json,
            },
        ),
        Commands::Stats { dir, json } => commands::stats::run(&dir, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
