//! SQL script discovery and loading
//!
//! Scripts run in ascending order of their full path string. That order is
//! the only way a script author expresses dependencies between scripts, so
//! directories and files are usually given numeric prefixes
//! (`01_raw/001_measurements.sql`, `02_presentation/001_daily.sql`, ...).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::pipeline::{PipelineError, PipelineResult};

/// File extension selected by [`collect_scripts`]
pub const SCRIPT_EXTENSION: &str = "sql";

/// A discovered SQL script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptFile {
    /// Path to the script
    pub path: PathBuf,
    /// Full path as a string; scripts execute in ascending order of this key
    pub ordinal_key: String,
}

impl ScriptFile {
    pub fn new(path: PathBuf) -> Self {
        let ordinal_key = path.to_string_lossy().into_owned();
        Self { path, ordinal_key }
    }

    /// Read the script contents
    pub fn read(&self) -> PipelineResult<String> {
        read_script(&self.path)
    }
}

/// Recursively collect `*.sql` files under `root`, in execution order
///
/// An existing directory without scripts yields an empty list. A missing
/// `root` is reported as [`PipelineError::NotFound`].
pub fn collect_scripts(root: &Path) -> PipelineResult<Vec<ScriptFile>> {
    if !root.is_dir() {
        return Err(PipelineError::NotFound(root.to_path_buf()));
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        SCRIPT_EXTENSION
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| PipelineError::Config(format!("invalid script pattern {pattern}: {e}")))?;

    let mut scripts = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    scripts.push(ScriptFile::new(path));
                }
            }
            Err(e) => {
                warn!("Error accessing path: {}", e);
            }
        }
    }

    scripts.sort_by(|a, b| a.ordinal_key.cmp(&b.ordinal_key));

    info!(
        root = %root.display(),
        count = scripts.len(),
        "Collected SQL scripts"
    );
    Ok(scripts)
}

/// Read the full text of one script
pub fn read_script(path: &Path) -> PipelineResult<String> {
    fs::read_to_string(path).map_err(|e| PipelineError::from_io(path, "reading script", e))
}
