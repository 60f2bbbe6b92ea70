//! Output directory lifecycle
//!
//! The working directory is the only resource shared across a run: the
//! compiler writes generated modules into it and the artifact executor reads
//! them back. It is reset exactly once per run, before the first
//! specification file is processed. No cleanup is guaranteed on abnormal
//! termination mid-run.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::HarnessError;

/// Handle to the shared working directory.
#[derive(Debug, Clone)]
pub struct Workdir {
    path: PathBuf,
}

impl Workdir {
    /// Validate `path` and wrap it.
    ///
    /// Rejects empty paths, `..` components, and filesystem roots - `reset`
    /// deletes the directory's contents, so a traversal here would be
    /// destructive. Absolute paths are allowed with a warning.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(HarnessError::OutputDir {
                path: path.to_path_buf(),
                reason: "path is empty".to_string(),
            });
        }

        for component in path.components() {
            if matches!(component, Component::ParentDir) {
                return Err(HarnessError::OutputDir {
                    path: path.to_path_buf(),
                    reason: "contains path traversal (..)".to_string(),
                });
            }
        }

        if path.parent().is_none() {
            return Err(HarnessError::OutputDir {
                path: path.to_path_buf(),
                reason: "refusing to reset a filesystem root".to_string(),
            });
        }

        if path.is_absolute() {
            warn!(
                "using absolute output path: {}. Consider using a relative path.",
                path.display()
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove any existing contents and recreate the directory empty.
    ///
    /// After this returns the directory exists and is empty, so no artifact
    /// can survive from a prior run into the current validation pass.
    pub fn reset(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&self.path)?;
        debug!(path = %self.path.display(), "output directory reset");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gencheck_workdir_{}_{}", name, std::process::id()))
    }

    #[test]
    fn reset_creates_a_missing_directory() {
        let dir = scratch("create");
        let _ = fs::remove_dir_all(&dir);

        let workdir = Workdir::new(&dir).unwrap();
        workdir.reset().unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reset_clears_stale_contents() {
        let dir = scratch("clear");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("stale.py"), "exit 1").unwrap();
        fs::write(dir.join("sub/deep.py"), "exit 1").unwrap();

        Workdir::new(&dir).unwrap().reset().unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn traversal_components_are_rejected() {
        let err = Workdir::new("out/../elsewhere").unwrap_err();
        assert!(matches!(err, HarnessError::OutputDir { .. }));
    }

    #[test]
    fn empty_and_root_paths_are_rejected() {
        assert!(Workdir::new("").is_err());
        assert!(Workdir::new("/").is_err());
    }
}
