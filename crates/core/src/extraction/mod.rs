//! Extraction planning
//!
//! Expands a set of location ids and an inclusive month range into
//! [`ExtractionUnit`]s, and renders the source path and ingestion query for
//! each unit. Locations form the outer loop (registry order), months the
//! inner loop (chronological), so `["A", "B"] × 2023-11..=2024-01` plans
//! `A/2023-11, A/2023-12, A/2024-01, B/2023-11, ...`.

mod locations;
mod month;

use serde::{Deserialize, Serialize};

use crate::template::{self, TemplateError, TemplateVars};

pub use locations::{LocationRegistry, expand_locations};
pub use month::YearMonth;

/// Partition layout of the raw source data
pub const DEFAULT_PARTITION_TEMPLATE: &str =
    "locationid={{location_id}}/year={{year}}/month={{month}}/*";

/// Template variable receiving the full source path in the ingestion query
pub const DATA_FILE_PATH_VAR: &str = "data_file_path";

/// One (location, year, month) partition of raw source data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionUnit {
    pub location_id: String,
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
}

impl ExtractionUnit {
    pub fn new(location_id: impl Into<String>, period: YearMonth) -> Self {
        Self {
            location_id: location_id.into(),
            year: period.year(),
            month: period.month(),
        }
    }

    /// Variables exposed to the partition path template
    pub fn template_vars(&self) -> TemplateVars {
        template::vars([
            ("location_id", self.location_id.clone()),
            ("year", format!("{:04}", self.year)),
            ("month", format!("{:02}", self.month)),
        ])
    }
}

impl std::fmt::Display for ExtractionUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:04}-{:02}", self.location_id, self.year, self.month)
    }
}

/// Plan one unit per (location, month) pair
///
/// An empty list results when `start > end`; the range is not validated.
pub fn expand_units<S: AsRef<str>>(
    location_ids: &[S],
    start: YearMonth,
    end: YearMonth,
) -> Vec<ExtractionUnit> {
    location_ids
        .iter()
        .flat_map(|location_id| {
            YearMonth::range_inclusive(start, end)
                .map(move |period| ExtractionUnit::new(location_id.as_ref(), period))
        })
        .collect()
}

/// Render the source partition path of a unit
pub fn unit_to_path(unit: &ExtractionUnit, path_template: &str) -> Result<String, TemplateError> {
    template::render(path_template, &unit.template_vars())
}

/// Render the ingestion query for one unit path under `base_path`
pub fn unit_to_query(
    base_path: &str,
    unit_path: &str,
    query_template: &str,
) -> Result<String, TemplateError> {
    let data_file_path = join_source_path(base_path, unit_path);
    template::render(query_template, &template::vars([(DATA_FILE_PATH_VAR, data_file_path)]))
}

/// Join a base path (local directory or object-store prefix) and a unit path
pub fn join_source_path(base_path: &str, unit_path: &str) -> String {
    if base_path.is_empty() {
        return unit_path.to_string();
    }
    format!("{}/{}", base_path.trim_end_matches('/'), unit_path)
}
