//! Configuration types for the cleaning pipeline.
//!
//! Uses the builder pattern like the rest of the crate; every field has a
//! default matching the employee dataset the pipeline was written for, so
//! `CleaningConfig::default()` is a working configuration.

use crate::types::ColumnRole;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default input path used when the CLI is invoked without `--input`.
pub const DEFAULT_INPUT_PATH: &str = "../data/raw/data_employes_to_clean.csv";

/// Column names bound to each role the pipeline knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub age: String,
    pub rating: String,
    pub salary: String,
    pub established: String,
    pub easy_apply: String,
    pub location: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            age: "Age".to_string(),
            rating: "Rating".to_string(),
            salary: "Salary".to_string(),
            established: "Established".to_string(),
            easy_apply: "Easy Apply".to_string(),
            location: "Location".to_string(),
        }
    }
}

impl ColumnNames {
    /// Column name bound to `role`.
    pub fn name_of(&self, role: ColumnRole) -> &str {
        match role {
            ColumnRole::Age => &self.age,
            ColumnRole::Rating => &self.rating,
            ColumnRole::Salary => &self.salary,
            ColumnRole::Established => &self.established,
            ColumnRole::EasyApply => &self.easy_apply,
            ColumnRole::Location => &self.location,
        }
    }
}

/// Configuration for a cleaning run.
///
/// Use [`CleaningConfig::builder()`] for a fluent setup, or deserialize it
/// from JSON with [`CleaningConfig::from_json_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Path of the delimited input file.
    pub input_path: PathBuf,

    /// Field separator of the input file.
    /// Default: ','
    pub separator: char,

    /// Column names per role.
    pub columns: ColumnNames,

    /// Value that stands for "missing" in the sentinel columns.
    /// Default: -1.0
    pub sentinel_value: f64,

    /// Number of neighbors for KNN imputation.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Number of rows drawn for the observation sample.
    /// Default: 5
    pub sample_rows: usize,

    /// Seed for the observation sample.
    /// Default: 42
    pub sample_seed: u64,

    /// Directory the cleaned table is written into (created if absent).
    /// Default: "preprocessed"
    pub output_dir: PathBuf,

    /// Output file name; the extension selects the format.
    /// Default: "clean_employes.csv"
    pub output_name: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            separator: ',',
            columns: ColumnNames::default(),
            sentinel_value: -1.0,
            knn_neighbors: 5,
            sample_rows: 5,
            sample_seed: 42,
            output_dir: PathBuf::from("preprocessed"),
            output_name: "clean_employes.csv".to_string(),
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| crate::error::CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Separator as the single byte polars expects.
    pub fn separator_byte(&self) -> u8 {
        self.separator as u8
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.separator.is_ascii() || self.separator.is_ascii_alphanumeric() {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if !self.sentinel_value.is_finite() {
            return Err(ConfigValidationError::InvalidSentinel(self.sentinel_value));
        }

        if self.output_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid separator {0:?} (must be a single ASCII punctuation or whitespace char)")]
    InvalidSeparator(char),

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid sentinel value: {0} (must be finite)")]
    InvalidSentinel(f64),

    #[error("Output file name must not be empty")]
    EmptyOutputName,
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    input_path: Option<PathBuf>,
    separator: Option<char>,
    columns: Option<ColumnNames>,
    sentinel_value: Option<f64>,
    knn_neighbors: Option<usize>,
    sample_rows: Option<usize>,
    sample_seed: Option<u64>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
}

impl CleaningConfigBuilder {
    /// Start from an existing configuration, e.g. one read from a JSON file.
    pub fn from_config(config: CleaningConfig) -> Self {
        Self {
            input_path: Some(config.input_path),
            separator: Some(config.separator),
            columns: Some(config.columns),
            sentinel_value: Some(config.sentinel_value),
            knn_neighbors: Some(config.knn_neighbors),
            sample_rows: Some(config.sample_rows),
            sample_seed: Some(config.sample_seed),
            output_dir: Some(config.output_dir),
            output_name: Some(config.output_name),
        }
    }

    /// Set the input file path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the field separator (`,` or `;` in practice).
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Override the column name bound to each role.
    pub fn columns(mut self, columns: ColumnNames) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Set the sentinel that marks missing values.
    pub fn sentinel_value(mut self, value: f64) -> Self {
        self.sentinel_value = Some(value);
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set how many rows the observation sample shows.
    pub fn sample_rows(mut self, n: usize) -> Self {
        self.sample_rows = Some(n);
        self
    }

    /// Set the seed used to draw the observation sample.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the output file name, extension included.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            separator: self.separator.unwrap_or(defaults.separator),
            columns: self.columns.unwrap_or(defaults.columns),
            sentinel_value: self.sentinel_value.unwrap_or(defaults.sentinel_value),
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
            sample_rows: self.sample_rows.unwrap_or(defaults.sample_rows),
            sample_seed: self.sample_seed.unwrap_or(defaults.sample_seed),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.separator, ',');
        assert_eq!(config.knn_neighbors, 5);
        assert_eq!(config.sentinel_value, -1.0);
        assert_eq!(config.columns.easy_apply, "Easy Apply");
        assert_eq!(config.output_name, "clean_employes.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = CleaningConfig::builder()
            .input_path("data/jobs.csv")
            .separator(';')
            .knn_neighbors(3)
            .output_dir("out")
            .output_name("jobs.xlsx")
            .build()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("data/jobs.csv"));
        assert_eq!(config.separator_byte(), b';');
        assert_eq!(config.knn_neighbors, 3);
        assert_eq!(config.output_name, "jobs.xlsx");
    }

    #[test]
    fn test_validation_invalid_knn_neighbors() {
        let result = CleaningConfig::builder().knn_neighbors(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidKnnNeighbors(0)
        ));
    }

    #[test]
    fn test_validation_invalid_separator() {
        let result = CleaningConfig::builder().separator('a').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator('a')
        ));

        let result = CleaningConfig::builder().separator('→').build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_output_name() {
        let result = CleaningConfig::builder().output_name("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyOutputName
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "separator": ";",
            "knn_neighbors": 7,
            "columns": { "location": "City" }
        }"#;

        let config: CleaningConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.separator, ';');
        assert_eq!(config.knn_neighbors, 7);
        assert_eq!(config.columns.location, "City");
        // untouched fields keep their defaults
        assert_eq!(config.columns.rating, "Rating");
        assert_eq!(config.output_dir, PathBuf::from("preprocessed"));
    }

    #[test]
    fn test_builder_from_config_roundtrips() {
        let original = CleaningConfig::builder().sample_seed(7).build().unwrap();
        let rebuilt = CleaningConfigBuilder::from_config(original.clone())
            .build()
            .unwrap();
        assert_eq!(rebuilt.sample_seed, 7);
        assert_eq!(rebuilt.columns, original.columns);
    }

    #[test]
    fn test_name_of_role() {
        let names = ColumnNames::default();
        assert_eq!(names.name_of(ColumnRole::Rating), "Rating");
        assert_eq!(names.name_of(ColumnRole::EasyApply), "Easy Apply");
    }
}
