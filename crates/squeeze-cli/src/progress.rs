use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use squeeze_core::{BatchProgress, ProgressReporter};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (candidate count unknown until the walk finishes)
/// - Convert phase: progress bar with running savings
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

fn signed_bytes(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", HumanBytes(bytes.unsigned_abs()))
    } else {
        HumanBytes(bytes as u64).to_string()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, _progress: &BatchProgress) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message("Scanning for images...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} images in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_batch_start(&self, progress: &BatchProgress) {
        let pb = ProgressBar::new(progress.total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Converting [{bar:30.cyan/dim}] {pos}/{len} ({eta} remaining) {msg}",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_progress(&self, progress: &BatchProgress) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            pb.set_position(progress.processed as u64);
            pb.set_message(format!(
                "saved {} · {}",
                signed_bytes(progress.saved_bytes),
                progress.last_file.as_deref().unwrap_or("")
            ));
        }
    }

    fn on_batch_complete(&self, progress: &BatchProgress, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Conversion complete: {}/{} images, {} saved in {:.2}s",
            progress.processed,
            progress.total,
            signed_bytes(progress.saved_bytes),
            duration_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_bytes() {
        assert_eq!(signed_bytes(0), "0 B");
        assert_eq!(signed_bytes(2048), "2.00 KiB");
        assert_eq!(signed_bytes(-2048), "-2.00 KiB");
    }
}
