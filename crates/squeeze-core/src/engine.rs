use crate::codec::{Codec, WebpLosslessCodec};
use crate::config::AppConfig;
use crate::convert::disposal::{DisposalSummary, Disposer, SystemTrash, Trash};
use crate::convert::worker::{ConversionPolicy, ConversionWorker};
use crate::error::Error;
use crate::model::{BatchProgress, CandidateSet, ConversionOutcome};
use crate::progress::ProgressReporter;
use crate::scanner;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Minimum spacing between intermediate progress notifications.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

pub struct ConvertEngine {
    config: AppConfig,
    codec: Arc<dyn Codec>,
    disposer: Disposer,
    cancel_flag: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct BatchResult {
    pub scan_duration: Duration,
    pub convert_duration: Duration,
    pub progress: BatchProgress,
}

impl ConvertEngine {
    pub fn new(config: AppConfig) -> Self {
        let disposer = Disposer::new(Arc::new(SystemTrash), config.delete_original);
        Self {
            config,
            codec: Arc::new(WebpLosslessCodec),
            disposer,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_trash(mut self, trash: Arc<dyn Trash>) -> Self {
        self.disposer = Disposer::new(trash, self.config.delete_original);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared flag checked between scan roots and before each new file is
    /// admitted. Setting it stops admission; in-flight files still finish.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Number of files converted at once. Queried fresh for every batch.
    pub fn worker_cap(&self) -> usize {
        self.config.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Scan `input_paths` and convert everything found.
    pub fn run(
        &self,
        input_paths: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchResult, Error> {
        let scan_start = Instant::now();
        let candidates = self.scan(input_paths, reporter)?;
        let scan_duration = scan_start.elapsed();

        let convert_start = Instant::now();
        let progress = self.run_batch(&candidates, reporter)?;
        let convert_duration = convert_start.elapsed();

        Ok(BatchResult {
            scan_duration,
            convert_duration,
            progress,
        })
    }

    /// Scanning phase only.
    pub fn scan(
        &self,
        input_paths: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> Result<CandidateSet, Error> {
        info!("Scanning {} input path(s)...", input_paths.len());
        reporter.on_scan_start(&BatchProgress {
            scanning: true,
            ..Default::default()
        });
        let start = Instant::now();

        let ignore_globs: Vec<&str> = self
            .config
            .ignore_patterns
            .iter()
            .map(|s| s.as_str())
            .collect();
        let candidates = scanner::scan_inputs(input_paths, &ignore_globs, &self.cancel_flag)?;

        let duration = start.elapsed();
        debug!(
            "Scan completed in {:.2}s, {} candidates",
            duration.as_secs_f64(),
            candidates.len()
        );
        reporter.on_scan_complete(candidates.len(), duration.as_secs_f64());
        Ok(candidates)
    }

    /// Convert every candidate with at most [`Self::worker_cap`] files in flight.
    ///
    /// The first `cap` files start immediately; each later file waits for any
    /// one in-flight file to finish. Outcomes arrive on a single channel and
    /// are folded into the [`BatchProgress`] here, on the calling thread, which
    /// is the only writer. Trash moves are not waited on.
    pub fn run_batch(
        &self,
        candidates: &CandidateSet,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchProgress, Error> {
        let cap = self.worker_cap();
        let policy = ConversionPolicy {
            skip_negative: self.config.skip_negative,
        };
        let worker = ConversionWorker::new(self.codec.as_ref(), &self.disposer, policy);
        let mut aggregator = Aggregator::new(candidates.len(), reporter);

        info!(
            "Converting {} file(s) with up to {} workers...",
            candidates.len(),
            cap
        );
        let start = Instant::now();
        reporter.on_batch_start(aggregator.progress());

        let (tx, rx) = mpsc::channel::<ConversionOutcome>();
        let mut cancelled = false;

        thread::scope(|scope| {
            let mut in_flight = 0usize;

            for file in candidates {
                if self.cancel_flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }

                if in_flight == cap {
                    match rx.recv() {
                        Ok(outcome) => {
                            in_flight -= 1;
                            aggregator.consume(outcome);
                        }
                        Err(_) => break,
                    }
                }

                let tx = tx.clone();
                let worker = &worker;
                scope.spawn(move || {
                    // Every admitted file must yield exactly one outcome.
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.convert(file)))
                        .unwrap_or_else(|_| {
                            error!("Conversion of {} panicked", file.path().display());
                            ConversionOutcome::unchanged(file)
                        });
                    let _ = tx.send(outcome);
                });
                in_flight += 1;
            }

            drop(tx);
            while in_flight > 0 {
                match rx.recv() {
                    Ok(outcome) => {
                        in_flight -= 1;
                        aggregator.consume(outcome);
                    }
                    Err(_) => break,
                }
            }
        });

        let progress = aggregator.finish();
        let duration = start.elapsed();
        info!(
            "Converted {}/{} file(s) in {:.2}s, {} bytes saved",
            progress.processed,
            progress.total,
            duration.as_secs_f64(),
            progress.saved_bytes
        );
        reporter.on_batch_complete(&progress, duration.as_secs_f64());

        if cancelled {
            return Err(Error::Cancelled);
        }
        Ok(progress)
    }

    /// Wait for trash moves started by previous batches.
    pub fn wait_for_disposals(&self) -> DisposalSummary {
        self.disposer.wait_idle()
    }
}

/// Single-writer fold of outcomes into [`BatchProgress`] with a time-gated
/// notification.
struct Aggregator<'a> {
    progress: BatchProgress,
    reporter: &'a dyn ProgressReporter,
    last_emit: Option<Instant>,
}

impl<'a> Aggregator<'a> {
    fn new(total: usize, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            progress: BatchProgress {
                total,
                processing: total > 0,
                ..Default::default()
            },
            reporter,
            last_emit: None,
        }
    }

    fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    fn consume(&mut self, outcome: ConversionOutcome) {
        self.progress.processed += 1;
        self.progress.saved_bytes += outcome.saved_bytes;
        self.progress.last_file = Some(outcome.display_name);

        let is_first = self.progress.processed == 1;
        let is_last = self.progress.processed == self.progress.total;
        if is_last {
            self.progress.processing = false;
        }

        let due = self
            .last_emit
            .map_or(true, |at| at.elapsed() >= PROGRESS_INTERVAL);
        if is_first || is_last || due {
            self.last_emit = Some(Instant::now());
            self.reporter.on_progress(&self.progress);
        }
    }

    fn finish(mut self) -> BatchProgress {
        self.progress.processing = false;
        self.progress
    }
}
