//! Writing generated modules to disk

use crate::assemble::ModuleUnit;
use crate::error::{CodegenError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The file existed and overwriting wasn't requested
    Skipped(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Skipped(path) => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub outcomes: Vec<WriteOutcome>,
}

impl WriteReport {
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            WriteOutcome::Written(path) => Some(path.as_path()),
            WriteOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            WriteOutcome::Skipped(path) => Some(path.as_path()),
            WriteOutcome::Written(_) => None,
        })
    }
}

/// Write every unit under `base`
///
/// Existing files are left alone unless `force` is set.
pub fn write_units(base: &Path, units: &[ModuleUnit], force: bool) -> Result<WriteReport> {
    let mut report = WriteReport::default();
    for unit in units {
        let path = base.join(&unit.relative_path);
        if path.exists() && !force {
            tracing::info!(path = %path.display(), "file exists, skipping");
            report.outcomes.push(WriteOutcome::Skipped(path));
            continue;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CodegenError::Other {
                message: format!("Failed to create directory {}", parent.display()),
                source: Some(Box::new(e)),
            })?;
        }
        std::fs::write(&path, &unit.source).map_err(|e| CodegenError::Other {
            message: format!("Failed to write {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        tracing::debug!(path = %path.display(), bytes = unit.source.len(), "wrote module");
        report.outcomes.push(WriteOutcome::Written(path));
    }
    Ok(report)
}
