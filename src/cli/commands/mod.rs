//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module and returns
//! `anyhow::Result`; main prints the error chain and exits non-zero.

pub mod ask;
pub mod chunk;
pub mod embed;
pub mod index;
pub mod ingest;
pub mod init;
pub mod stats;
