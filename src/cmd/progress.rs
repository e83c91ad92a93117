//! Terminal progress for the two phases of a run
//!
//! Listing the three inventories is paged and open-ended, so it gets a
//! spinner. Primary-user lookups have a known count and get a bar. Either
//! phase ends in one of the [`Outcome`]s below.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// How a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    /// Finished, but some lookups were left blank
    Degraded,
    /// Aborted the run
    Failed,
}

impl Outcome {
    fn marker(self) -> (&'static str, &'static str) {
        match self {
            Outcome::Complete => ("{prefix:.green} {msg}", "✓"),
            Outcome::Degraded => ("{prefix:.yellow} {msg}", "⚠"),
            Outcome::Failed => ("{prefix:.red} {msg}", "✗"),
        }
    }
}

/// Spinner shown while the paged device listings are fetched
pub fn listing_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Bar advanced once per primary-user lookup
pub fn lookup_bar(lookups: usize) -> ProgressBar {
    let bar = ProgressBar::new(lookups as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Primary users [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    bar
}

/// Replace the spinner or bar with a single outcome line
pub fn finish(progress: &ProgressBar, outcome: Outcome, message: &str) {
    let (template, prefix) = outcome.marker();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_prefix(prefix);
    progress.finish_with_message(message.to_string());
}
