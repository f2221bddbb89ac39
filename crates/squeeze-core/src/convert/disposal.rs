use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum DisposalError {
    #[error("trash error: {0}")]
    Trash(#[from] trash::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable delete. Never a permanent removal.
pub trait Trash: Send + Sync {
    fn move_to_trash(&self, path: &Path) -> Result<(), DisposalError>;
}

/// System Recycle Bin / Trash via the `trash` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl Trash for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> Result<(), DisposalError> {
        trash::delete(path)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisposalSummary {
    pub trashed: usize,
    pub failed: usize,
}

/// Upper bound on concurrent trash moves.
pub const DISPOSAL_THREADS: usize = 4;

/// Moves originals to the trash on a small dedicated pool.
///
/// `dispose` returns immediately. Each move reports success or failure on a
/// channel so a caller that is about to exit can wait for outstanding moves
/// with [`Disposer::wait_idle`].
pub struct Disposer {
    trash: Arc<dyn Trash>,
    delete_original: bool,
    pool: Option<ThreadPool>,
    outstanding: AtomicUsize,
    results_tx: Sender<bool>,
    results_rx: Mutex<Receiver<bool>>,
}

impl Disposer {
    pub fn new(trash: Arc<dyn Trash>, delete_original: bool) -> Self {
        let pool = match ThreadPoolBuilder::new()
            .num_threads(DISPOSAL_THREADS)
            .thread_name(|i| format!("squeeze-trash-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Cannot build disposal pool, using the global pool: {}", e);
                None
            }
        };
        let (results_tx, results_rx) = mpsc::channel();

        Self {
            trash,
            delete_original,
            pool,
            outstanding: AtomicUsize::new(0),
            results_tx,
            results_rx: Mutex::new(results_rx),
        }
    }

    pub fn delete_original(&self) -> bool {
        self.delete_original
    }

    /// Called only for originals whose conversion saved space.
    pub fn dispose(&self, original: &Path) {
        if !self.delete_original {
            return;
        }

        let trash = Arc::clone(&self.trash);
        let original: PathBuf = original.to_path_buf();
        let results_tx = self.results_tx.clone();
        self.outstanding.fetch_add(1, Ordering::SeqCst);

        let job = move || {
            let moved = panic::catch_unwind(AssertUnwindSafe(|| trash.move_to_trash(&original)));
            let ok = match moved {
                Ok(Ok(())) => {
                    debug!("trashed: {}", original.display());
                    true
                }
                Ok(Err(e)) => {
                    error!("Failed to trash '{}': {}", original.display(), e);
                    false
                }
                Err(_) => {
                    error!("Trash backend panicked on '{}'", original.display());
                    false
                }
            };
            let _ = results_tx.send(ok);
        };

        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }

    /// Block until every disposal started so far has finished.
    pub fn wait_idle(&self) -> DisposalSummary {
        let results_rx = self
            .results_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let expected = self.outstanding.swap(0, Ordering::SeqCst);

        let mut summary = DisposalSummary::default();
        for _ in 0..expected {
            match results_rx.recv() {
                Ok(true) => summary.trashed += 1,
                Ok(false) => summary.failed += 1,
                Err(_) => break,
            }
        }
        summary
    }
}
