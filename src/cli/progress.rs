//! indicatif widgets fed by pipeline progress callbacks.

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::IngestProgress;

/// Two-phase progress display for ingestion: a pages bar during
/// segmentation, then an embeddings bar. A disabled instance swallows
/// updates so command code never branches.
pub struct StageBars {
    enabled: bool,
    pages: Option<ProgressBar>,
    embeddings: Option<ProgressBar>,
}

impl StageBars {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pages: None,
            embeddings: None,
        }
    }

    /// Route one progress update to the right bar, creating it on first
    /// use and retiring the pages bar once embedding starts.
    pub fn observe(&mut self, progress: IngestProgress) {
        if !self.enabled {
            return;
        }
        match progress {
            IngestProgress::SegmentingPages { current, total } => {
                let bar = self.pages.get_or_insert_with(|| stage_bar("Pages", total));
                bar.set_position(current as u64);
            }
            IngestProgress::GeneratingEmbeddings { current, total } => {
                if let Some(bar) = self.pages.take() {
                    bar.finish();
                }
                let bar = self
                    .embeddings
                    .get_or_insert_with(|| stage_bar("Embeddings", total));
                bar.set_position(current as u64);
            }
        }
    }

    /// Finish whatever bar is still active.
    pub fn finish(&mut self) {
        if let Some(bar) = self.pages.take() {
            bar.finish();
        }
        if let Some(bar) = self.embeddings.take() {
            bar.finish();
        }
    }
}

fn stage_bar(prefix: &str, total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{prefix:>12} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(prefix.to_string());
    bar
}
