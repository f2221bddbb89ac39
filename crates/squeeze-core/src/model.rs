use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Source extensions the scanner accepts, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "bmp", "webp"];

/// Lowercase extension of `path`, if it has one in [`ALLOWED_EXTENSIONS`].
pub fn allowed_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// A file eligible for conversion. Identity is the normalized absolute path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFile {
    path: PathBuf,
    extension: String,
}

impl SourceFile {
    /// Returns `None` when the extension is not in the allow-list.
    pub fn new(path: PathBuf) -> Option<Self> {
        let extension = allowed_extension(&path)?;
        Some(Self { path, extension })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Deduplicated, filtered, path-ordered files for one batch.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    files: Vec<SourceFile>,
}

impl CandidateSet {
    /// Builds a set from already-normalized paths, dropping duplicates and
    /// anything outside the allow-list.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let unique: BTreeSet<SourceFile> = paths.into_iter().filter_map(SourceFile::new).collect();
        Self {
            files: unique.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceFile> {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a SourceFile;
    type IntoIter = std::slice::Iter<'a, SourceFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Result of converting one file. Failures and skips both carry zero savings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub display_name: String,
    pub saved_bytes: i64,
}

impl ConversionOutcome {
    pub fn saved(file: &SourceFile, saved_bytes: i64) -> Self {
        Self {
            display_name: file.display_name(),
            saved_bytes,
        }
    }

    pub fn unchanged(file: &SourceFile) -> Self {
        Self::saved(file, 0)
    }
}

/// Aggregate state of one batch, owned and mutated by the scheduler only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub processed: usize,
    pub saved_bytes: i64,
    pub last_file: Option<String>,
    pub scanning: bool,
    pub processing: bool,
}

impl BatchProgress {
    pub fn is_complete(&self) -> bool {
        !self.processing && self.processed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert_eq!(
            allowed_extension(Path::new("/tmp/IMG_0001.JPG")),
            Some("jpg".to_string())
        );
        assert_eq!(
            allowed_extension(Path::new("/tmp/scan.Tiff")),
            Some("tiff".to_string())
        );
        assert_eq!(allowed_extension(Path::new("/tmp/notes.txt")), None);
        assert_eq!(allowed_extension(Path::new("/tmp/no_extension")), None);
        assert_eq!(allowed_extension(Path::new("/tmp/archive.tif")), None);
    }

    #[test]
    fn test_candidate_set_dedupes_and_filters() {
        let set = CandidateSet::from_paths(vec![
            PathBuf::from("/photos/b.png"),
            PathBuf::from("/photos/a.jpg"),
            PathBuf::from("/photos/b.png"),
            PathBuf::from("/photos/readme.md"),
        ]);

        assert_eq!(set.len(), 2);
        let names: Vec<String> = set.iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["a.jpg".to_string(), "b.png".to_string()]);
    }

    #[test]
    fn test_empty_batch_is_complete_once_not_processing() {
        let progress = BatchProgress::default();
        assert!(progress.is_complete());

        let running = BatchProgress {
            total: 3,
            processed: 3,
            processing: true,
            ..Default::default()
        };
        assert!(!running.is_complete());
    }
}
