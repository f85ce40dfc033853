//! Configuration files the application writes once it is installed.
//!
//! Their absence is what makes an environment clean: they must not exist
//! when a run starts and are removed again when it ends.

use log::warn;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, HarnessResult};
use crate::runner::EventEmitter;

pub const CONFIG_FILES: [&str; 3] = [
    "core/Configuration/Database.class.php",
    "core/Configuration/JWT.class.php",
    "core/Configuration/Mail.class.php",
];

pub fn artifact_paths(app_root: &Path) -> Vec<PathBuf> {
    CONFIG_FILES.iter().map(|f| app_root.join(f)).collect()
}

/// Delete every artifact that exists. Returns the paths removed.
pub fn clean_artifacts(app_root: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in artifact_paths(app_root) {
        if path.is_file() {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Holds the clean-environment precondition for the duration of a run.
///
/// [`ArtifactGuard::release`] removes whatever the application wrote; if the
/// guard is dropped without being released the files are still removed,
/// ignoring errors.
pub struct ArtifactGuard {
    paths: Vec<PathBuf>,
    released: bool,
}

impl ArtifactGuard {
    /// Check that no artifact exists. With `force`, leftovers are deleted
    /// instead of failing the run.
    pub fn acquire(app_root: &Path, force: bool, emitter: &EventEmitter) -> HarnessResult<Self> {
        let paths = artifact_paths(app_root);
        for path in &paths {
            if !path.is_file() {
                continue;
            }
            if !force {
                return Err(HarnessError::provisioning(format!(
                    "File {} exists. The testsuite is required to perform tests on a clean environment. Specify --force to delete those files",
                    path.display()
                )));
            }
            emitter.log(format!("[ ] Deleting existing configuration {}", path.display()));
            std::fs::remove_file(path)?;
        }

        Ok(Self {
            paths,
            released: false,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove the artifacts. Failures are returned as messages so they can be
    /// reported next to a test failure.
    pub fn release(mut self, emitter: &EventEmitter) -> Vec<String> {
        self.released = true;
        let mut errors = Vec::new();
        for path in &self.paths {
            if !path.is_file() {
                continue;
            }
            emitter.log(format!("[ ] Deleting configuration {}", path.display()));
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to delete {}: {}", path.display(), e);
                errors.push(format!("Failed to delete {}: {}", path.display(), e));
            }
        }
        errors
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in &self.paths {
            if path.is_file() {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}
