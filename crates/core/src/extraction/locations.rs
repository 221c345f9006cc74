//! Location registry loading

use std::fs;
use std::path::Path;

use crate::pipeline::{PipelineError, PipelineResult};

/// Location identifiers and their metadata, in file order
///
/// The registry file is a JSON object keyed by location id. Only the keys
/// drive extraction; the metadata is kept for callers that want it.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    entries: serde_json::Map<String, serde_json::Value>,
}

impl LocationRegistry {
    /// Load a registry file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::from_io(path, "reading location registry", e))?;
        Self::from_json(&content).map_err(|message| PipelineError::Registry {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse a registry from JSON text
    pub fn from_json(content: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        match value {
            serde_json::Value::Object(entries) => Ok(Self { entries }),
            other => Err(format!(
                "expected a JSON object keyed by location id, found {}",
                json_kind(&other)
            )),
        }
    }

    /// Location identifiers in declared order
    pub fn location_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Metadata recorded for one location
    pub fn metadata(&self, location_id: &str) -> Option<&serde_json::Value> {
        self.entries.get(location_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the location identifiers from a registry file, in file order
pub fn expand_locations(registry_path: &Path) -> PipelineResult<Vec<String>> {
    Ok(LocationRegistry::load(registry_path)?.location_ids())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
