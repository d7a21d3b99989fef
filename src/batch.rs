//! Folder iteration and per-file failure capture

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A file the batch could not process, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// Results of a batch, in directory order, plus the files that failed.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub results: Vec<(PathBuf, T)>,
    pub failures: Vec<FileFailure>,
}

impl<T> BatchOutcome<T> {
    pub fn processed(&self) -> usize {
        self.results.len()
    }
}

/// Files directly inside `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by name.
pub fn list_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Run `process` over every file in parallel.
///
/// A failing file is logged and recorded; it never stops the others.
pub fn run_batch<T, F>(files: &[PathBuf], process: F) -> BatchOutcome<T>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let outcomes: Vec<(PathBuf, Result<T>)> = files
        .par_iter()
        .map(|path| {
            log::debug!("Processing {}", path.display());
            (path.clone(), process(path))
        })
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(value) => results.push((path, value)),
            Err(e) => {
                let file = file_name(&path);
                log::warn!("{}: {:#}", file, e);
                failures.push(FileFailure {
                    file,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    BatchOutcome { results, failures }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tarareo-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = scratch_dir("list");
        for name in ["b.mid", "a.MID", "c.wav", "notes.txt"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        fs::create_dir_all(dir.join("sub.mid")).unwrap();

        let files = list_files(&dir, &["mid".to_string()]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.MID", "b.mid"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let missing = std::env::temp_dir().join("tarareo-does-not-exist-7f3a");
        assert!(list_files(&missing, &["mid".to_string()]).is_err());
    }

    #[test]
    fn test_failures_do_not_abort() {
        let files: Vec<PathBuf> = ["one", "two", "three", "four"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let outcome = run_batch(&files, |path| {
            if path == Path::new("two") {
                anyhow::bail!("broken file");
            }
            Ok(path.display().to_string().len())
        });

        let lengths: Vec<usize> = outcome.results.iter().map(|(_, n)| *n).collect();
        assert_eq!(lengths, vec![3, 5, 4]);
        assert_eq!(
            outcome.failures,
            vec![FileFailure {
                file: "two".to_string(),
                reason: "broken file".to_string()
            }]
        );
        assert_eq!(outcome.processed(), 3);
    }
}
