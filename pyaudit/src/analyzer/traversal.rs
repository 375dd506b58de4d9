//! Project traversal: finds the Python source files for one scan.

use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Collects every `.py` file under `root`, skipping excluded folder
/// names at any depth. The result is sorted so downstream aggregation
/// is deterministic regardless of filesystem ordering.
#[must_use]
pub fn collect_python_files(root: &Path, exclude_folders: &[String]) -> Vec<PathBuf> {
    // filter_entry requires a 'static closure, so the set is owned
    let excludes: FxHashSet<String> = exclude_folders.iter().cloned().collect();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|t| t.is_dir()) {
                let name = entry.file_name().to_string_lossy();
                !excludes.contains(&*name)
            } else {
                true
            }
        })
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "py"))
        .collect();
    files.sort();
    files
}
