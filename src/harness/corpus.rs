//! Specification file discovery
//!
//! Enumeration is deterministic: a directory walk filtered by extension and
//! sorted lexicographically over full paths, so re-enumerating an unchanged
//! tree yields the identical sequence. A path naming a file is taken as-is,
//! bypassing the extension filter - the operator selected it deliberately.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directories never descended into during discovery.
const SKIP_DIRS: &[&str] = &["target", "node_modules"];

/// Discover specification files under `path`, ordered lexicographically.
pub fn discover_spec_files(path: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    if path.is_dir() {
        walk(path, ext, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, ext: &str, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry_path.is_dir() {
            let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with('.') && !SKIP_DIRS.contains(&name) {
                walk(&entry_path, ext, files)?;
            }
        } else if has_extension(&entry_path, ext) {
            files.push(entry_path);
        }
    }
    Ok(())
}

/// True when `path` carries exactly the extension `ext` (no leading dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == ext)
}
