use crate::error::Error;
use crate::model::{allowed_extension, CandidateSet};
use dashmap::DashSet;
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// Expand files and directories into a deduplicated [`CandidateSet`].
///
/// Roots are walked in parallel. Hidden entries below a root, symlinks and
/// anything matching an ignore glob are skipped. Inputs that are missing or
/// unreadable are logged and skipped; they never fail the scan.
pub fn scan_inputs(
    input_paths: &[PathBuf],
    ignore_globs: &[&str],
    cancel_token: &AtomicBool,
) -> Result<CandidateSet, Error> {
    let found: DashSet<PathBuf> = DashSet::new();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    input_paths.par_iter().for_each(|input| {
        if cancel_token.load(Ordering::Relaxed) {
            return;
        }
        visit_input(input, &found, &ignore_patterns, cancel_token);
    });

    if cancel_token.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }

    Ok(CandidateSet::from_paths(found))
}

fn visit_input(
    input: &Path,
    found: &DashSet<PathBuf>,
    ignore_patterns: &[Pattern],
    cancel_token: &AtomicBool,
) {
    // Walking from the resolved root without following links keeps every
    // descendant path resolved as well.
    let root = match fs::canonicalize(input) {
        Ok(root) => root,
        Err(err) => {
            warn!("Skipping input {}: {}", input.display(), err);
            return;
        }
    };

    let metadata = match fs::metadata(&root) {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!("Skipping input {}: {}", root.display(), err);
            return;
        }
    };

    if metadata.is_file() {
        if allowed_extension(&root).is_some() && !is_ignored(&root, ignore_patterns) {
            found.insert(root);
        }
        return;
    }

    if !metadata.is_dir() {
        return;
    }

    let walker = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || (!is_hidden(entry) && !is_ignored(entry.path(), ignore_patterns))
        });

    for entry in walker {
        if cancel_token.load(Ordering::Relaxed) {
            return;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Error walking {}: {}", root.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() && allowed_extension(entry.path()).is_some() {
            found.insert(entry.into_path());
        }
    }

    debug!("Scanned {} ({} candidates so far)", root.display(), found.len());
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_ignored(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"not really an image").unwrap();
    }

    fn names(set: &CandidateSet) -> Vec<String> {
        let mut names: Vec<String> = set.iter().map(|f| f.display_name()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_recurses_and_filters_by_extension() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.png"));
        touch(&root.join("nested/deeper/b.JPEG"));
        touch(&root.join("nested/c.bmp"));
        touch(&root.join("nested/notes.txt"));
        touch(&root.join("d.gif"));

        let set = scan_inputs(&[root.to_path_buf()], &[], &AtomicBool::new(false)).unwrap();

        assert_eq!(names(&set), vec!["a.png", "b.JPEG", "c.bmp"]);
        let b = set.iter().find(|f| f.display_name() == "b.JPEG").unwrap();
        assert_eq!(b.extension(), "jpeg");
    }

    #[test]
    fn test_skips_hidden_entries() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("visible.png"));
        touch(&root.join(".hidden.png"));
        touch(&root.join(".thumbnails/cached.png"));

        let set = scan_inputs(&[root.to_path_buf()], &[], &AtomicBool::new(false)).unwrap();

        assert_eq!(names(&set), vec!["visible.png"]);
    }

    #[test]
    fn test_file_and_parent_directory_yield_one_candidate() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        let file = root.join("album/photo.png");
        touch(&file);

        let inputs = vec![
            file.clone(),
            root.join("album"),
            root.join("album/../album/photo.png"),
        ];
        let set = scan_inputs(&inputs, &[], &AtomicBool::new(false)).unwrap();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_missing_input_is_skipped() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("kept.png"));

        let inputs = vec![root.join("does_not_exist"), root.join("kept.png")];
        let set = scan_inputs(&inputs, &[], &AtomicBool::new(false)).unwrap();

        assert_eq!(names(&set), vec!["kept.png"]);
    }

    #[test]
    fn test_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("keep/a.png"));
        touch(&root.join("raw/b.png"));

        let set = scan_inputs(&[root.to_path_buf()], &["**/raw/**"], &AtomicBool::new(false))
            .unwrap();

        assert_eq!(names(&set), vec!["a.png"]);
    }

    #[test]
    fn test_cancelled_scan() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("a.png"));

        let result = scan_inputs(&[tmp.path().to_path_buf()], &[], &AtomicBool::new(true));

        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
