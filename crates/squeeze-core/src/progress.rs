use crate::model::BatchProgress;

/// Trait for reporting scan and conversion progress.
///
/// The CLI implements it with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _progress: &BatchProgress) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_batch_start(&self, _progress: &BatchProgress) {}
    /// Throttled: first and last outcome, otherwise at most once per interval.
    fn on_progress(&self, _progress: &BatchProgress) {}
    fn on_batch_complete(&self, _progress: &BatchProgress, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
