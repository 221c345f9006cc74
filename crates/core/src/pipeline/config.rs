//! Pipeline configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use crate::database::ConnectionSettings;
use crate::extraction::{DEFAULT_PARTITION_TEMPLATE, YearMonth};

/// Default database file name
pub const DEFAULT_DATABASE_PATH: &str = "air_quality.db";

/// What a pipeline run does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Apply DDL scripts, fail-fast
    Setup { ddl_dir: PathBuf },
    /// Load raw partitions, skipping unavailable ones
    Extract(ExtractConfig),
    /// Run transformation scripts, fail-fast
    Transform { query_dir: PathBuf },
}

impl RunMode {
    /// Get mode name
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Setup { .. } => "setup",
            RunMode::Extract(_) => "extract",
            RunMode::Transform { .. } => "transform",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inputs of an extract run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// JSON registry keyed by location id
    pub locations_file_path: PathBuf,
    /// First month to load
    pub start_date: YearMonth,
    /// Last month to load (inclusive)
    pub end_date: YearMonth,
    /// SQL template with a `{{ data_file_path }}` placeholder
    pub extract_query_template_path: PathBuf,
    /// Local directory or object-store prefix holding the partitions
    pub source_base_path: String,
    /// Partition path layout below the base path
    pub partition_path_template: String,
}

impl ExtractConfig {
    /// Create an extract config with the default partition layout
    pub fn new(
        locations_file_path: impl Into<PathBuf>,
        start_date: YearMonth,
        end_date: YearMonth,
        extract_query_template_path: impl Into<PathBuf>,
        source_base_path: impl Into<String>,
    ) -> Self {
        Self {
            locations_file_path: locations_file_path.into(),
            start_date,
            end_date,
            extract_query_template_path: extract_query_template_path.into(),
            source_base_path: source_base_path.into(),
            partition_path_template: DEFAULT_PARTITION_TEMPLATE.to_string(),
        }
    }

    /// Override the partition path layout
    pub fn with_partition_path_template(mut self, template: impl Into<String>) -> Self {
        self.partition_path_template = template.into();
        self
    }

    /// Validate the configuration
    ///
    /// A reversed month range is deliberately accepted; it plans no units.
    pub fn validate(&self) -> Result<(), String> {
        if self.source_base_path.trim().is_empty() {
            return Err("Source base path must not be empty".to_string());
        }
        if self.partition_path_template.trim().is_empty() {
            return Err("Partition path template must not be empty".to_string());
        }
        Ok(())
    }
}

/// Optional TOML configuration file
///
/// Every value can also be given on the command line, which takes
/// precedence.
///
/// ```toml
/// database_path = "air_quality.db"
///
/// [connection]
/// s3_region = "us-east-1"
///
/// [setup]
/// ddl_query_parent_dir = "sql/ddl"
///
/// [extract]
/// locations_file_path = "locations.json"
/// start_date = "2024-01"
/// end_date = "2024-06"
/// extract_query_template_path = "sql/extract/extract_air_quality.sql"
/// source_base_path = "s3://openaq-data-archive/records/csv.gz"
///
/// [transform]
/// query_directory = "sql/transform"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database_path: Option<PathBuf>,
    pub connection: ConnectionSettings,
    pub setup: SetupSection,
    pub extract: ExtractSection,
    pub transform: TransformSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSection {
    pub ddl_query_parent_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    pub locations_file_path: Option<PathBuf>,
    pub start_date: Option<YearMonth>,
    pub end_date: Option<YearMonth>,
    pub extract_query_template_path: Option<PathBuf>,
    pub source_base_path: Option<String>,
    pub partition_path_template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSection {
    pub query_directory: Option<PathBuf>,
}

impl ConfigFile {
    /// Load a config file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::from_io(path, "reading config file", e))?;
        Self::parse(&content)
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> PipelineResult<Self> {
        toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_extract_config_defaults() {
        let config = ExtractConfig::new(
            "locations.json",
            ym("2024-01"),
            ym("2024-03"),
            "extract.sql",
            "/data",
        );
        assert_eq!(config.partition_path_template, DEFAULT_PARTITION_TEMPLATE);
        assert!(config.validate().is_ok());

        let config = config.with_partition_path_template("{{location_id}}/{{year}}{{month}}.csv");
        assert!(config.partition_path_template.ends_with(".csv"));
    }

    #[test]
    fn test_extract_config_validate() {
        let config = ExtractConfig::new("l.json", ym("2024-02"), ym("2024-01"), "e.sql", " ");
        assert!(config.validate().unwrap_err().contains("base path"));

        // Reversed range is not a validation error
        let config = ExtractConfig::new("l.json", ym("2024-02"), ym("2024-01"), "e.sql", "/d");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_parse() {
        let config = ConfigFile::parse(
            r#"
database_path = "air_quality.db"

[connection]
s3_region = "us-east-1"

[extract]
start_date = "2023-11"
end_date = "2024-01"
source_base_path = "s3://openaq-data-archive/records/csv.gz"

[transform]
query_directory = "sql/transform"
"#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("air_quality.db")));
        assert_eq!(config.connection.s3_region.as_deref(), Some("us-east-1"));
        assert_eq!(config.extract.start_date, Some(ym("2023-11")));
        assert_eq!(config.extract.locations_file_path, None);
        assert_eq!(
            config.transform.query_directory,
            Some(PathBuf::from("sql/transform"))
        );
        assert_eq!(config.setup, SetupSection::default());
    }

    #[test]
    fn test_config_file_rejects_bad_month() {
        let err = ConfigFile::parse("[extract]\nstart_date = \"2024-13\"\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_empty_config_file() {
        assert_eq!(ConfigFile::parse("").unwrap(), ConfigFile::default());
    }
}
