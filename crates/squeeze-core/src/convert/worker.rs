use super::disposal::Disposer;
use crate::codec::{Codec, CodecError};
use crate::model::{ConversionOutcome, SourceFile};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct ConversionPolicy {
    /// Discard the converted file unless it is strictly smaller.
    pub skip_negative: bool,
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self {
            skip_negative: true,
        }
    }
}

/// Converts one file at a time. Holds only shared references, so any number
/// of workers can run side by side.
pub struct ConversionWorker<'a> {
    codec: &'a dyn Codec,
    disposer: &'a Disposer,
    policy: ConversionPolicy,
}

impl<'a> ConversionWorker<'a> {
    pub fn new(codec: &'a dyn Codec, disposer: &'a Disposer, policy: ConversionPolicy) -> Self {
        Self {
            codec,
            disposer,
            policy,
        }
    }

    /// Sibling path with the codec's extension.
    pub fn destination_for(&self, file: &SourceFile) -> PathBuf {
        file.path().with_extension(self.codec.extension())
    }

    /// Convert `file` and report the bytes saved. Every failure degrades to
    /// a zero-saving outcome.
    pub fn convert(&self, file: &SourceFile) -> ConversionOutcome {
        if file.extension() == self.codec.extension() {
            debug!("already {}: {}", self.codec.extension(), file.path().display());
            return ConversionOutcome::unchanged(file);
        }

        let destination = self.destination_for(file);
        if let Err(e) = self.encode(file.path(), &destination) {
            warn!("Failed to convert {}: {}", file.path().display(), e);
            return ConversionOutcome::unchanged(file);
        }

        let original_size = file_size(file.path());
        let new_size = file_size(&destination);

        if self.policy.skip_negative && new_size >= original_size {
            debug!(
                "no gain for {} ({} -> {} bytes), discarding",
                file.path().display(),
                original_size,
                new_size
            );
            remove_partial(&destination);
            return ConversionOutcome::unchanged(file);
        }

        let saved = original_size as i64 - new_size as i64;
        if saved > 0 {
            self.disposer.dispose(file.path());
        }

        debug!(
            "converted {} ({} -> {} bytes)",
            file.path().display(),
            original_size,
            new_size
        );
        ConversionOutcome::saved(file, saved)
    }

    /// Open, create and encode. On an encode failure the destination this
    /// call created is removed again.
    fn encode(&self, source_path: &Path, destination: &Path) -> Result<(), CodecError> {
        let source = File::open(source_path)?;

        // Never clobber an existing file that happens to share the name.
        let mut output = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)?;

        if let Err(e) = self.codec.encode_lossless(source, &mut output) {
            drop(output);
            remove_partial(destination);
            return Err(e);
        }
        Ok(())
    }
}

fn file_size(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!("Cannot stat {}: {}", path.display(), e);
            0
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Cannot remove {}: {}", path.display(), e);
    }
}
