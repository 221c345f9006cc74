//! Read-only access to the presentation tables consumed by the dashboard
//!
//! These tables are built by the transformation scripts; this module only
//! names them and reads them back. Nothing here creates or checks them.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "duckdb-backend")]
use crate::database::{DatabaseError, DuckDbConnection};

/// Presentation tables the dashboard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationTable {
    /// Most recent value of every parameter at every location (map view)
    LatestParamValuesPerLocation,
    /// Daily per-location, per-parameter statistics (time series view)
    DailyAirQualityStats,
}

impl PresentationTable {
    /// Schema-qualified table name
    pub fn qualified_name(&self) -> &'static str {
        match self {
            PresentationTable::LatestParamValuesPerLocation => {
                "presentation.latest_param_values_per_location"
            }
            PresentationTable::DailyAirQualityStats => "presentation.daily_air_quality_stats",
        }
    }

    /// `SELECT *` over the table, optionally limited
    pub fn select_sql(&self, limit: Option<usize>) -> String {
        match limit {
            Some(limit) => format!("SELECT * FROM {} LIMIT {}", self.qualified_name(), limit),
            None => format!("SELECT * FROM {}", self.qualified_name()),
        }
    }
}

impl fmt::Display for PresentationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

impl FromStr for PresentationTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "latest_param_values_per_location" => {
                Ok(PresentationTable::LatestParamValuesPerLocation)
            }
            "daily" | "daily_air_quality_stats" => Ok(PresentationTable::DailyAirQualityStats),
            _ => Err(format!(
                "Unknown presentation table: {} (expected 'latest' or 'daily')",
                s
            )),
        }
    }
}

/// Read a presentation table as JSON rows
#[cfg(feature = "duckdb-backend")]
pub fn read_presentation(
    conn: &DuckDbConnection,
    table: PresentationTable,
    limit: Option<usize>,
) -> Result<Vec<serde_json::Value>, DatabaseError> {
    conn.query(&table.select_sql(limit))
}
