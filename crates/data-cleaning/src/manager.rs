//! Stateful table manager driving the cleaning stages.
//!
//! A [`DataManager`] owns at most one table. Each stage mutates it in place
//! and returns a [`StageReport`]; when no table is loaded every stage is a
//! logged no-op.

use crate::cleaner::{
    add_salary_numeric, clean_text_series, count_sentinel, replace_sentinel, to_categorical,
    to_integer,
};
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result, ResultExt};
use crate::imputers::ImputationPolicy;
use crate::io::{load_csv, save_table};
use crate::types::{
    ColumnMissing, ColumnRole, MissingSummary, Observation, Stage, StageReport, ValueCounts,
};
use crate::utils::{is_categorical_dtype, is_text_dtype, render_value, value_counts};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of most frequent values reported after text cleaning.
const TOP_VALUES: usize = 5;

/// Owns the table being cleaned and runs the stages over it.
///
/// # Example
///
/// ```rust,ignore
/// use data_cleaning::{CleaningConfig, DataManager};
///
/// let config = CleaningConfig::builder()
///     .input_path("data/employes.csv")
///     .build()?;
/// let mut manager = DataManager::new(config);
///
/// if manager.load_data() {
///     manager.handle_missing_values()?;
///     manager.convert_datatypes()?;
///     manager.clean_text_column("Location");
///     manager.save_data();
/// }
/// ```
pub struct DataManager {
    config: CleaningConfig,
    policy: ImputationPolicy,
    df: Option<DataFrame>,
    saved_path: Option<PathBuf>,
}

static_assertions::assert_impl_all!(DataManager: Send);

fn no_data() -> String {
    CleaningError::NoDataLoaded.to_string()
}

impl DataManager {
    pub fn new(config: CleaningConfig) -> Self {
        info!(
            "DataManager initialized for the file: {}",
            config.input_path.display()
        );
        Self {
            config,
            policy: ImputationPolicy::default(),
            df: None,
            saved_path: None,
        }
    }

    /// Manager over an already materialized table.
    pub fn from_dataframe(config: CleaningConfig, df: DataFrame) -> Self {
        let mut manager = Self::new(config);
        manager.df = Some(df);
        manager
    }

    /// Replace the default imputation table.
    pub fn with_policy(mut self, policy: ImputationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn policy(&self) -> &ImputationPolicy {
        &self.policy
    }

    pub fn is_loaded(&self) -> bool {
        self.df.is_some()
    }

    /// The current table, `None` before a successful load.
    pub fn get_cleaned_data(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Take the table out of the manager.
    pub fn into_dataframe(self) -> Option<DataFrame> {
        self.df
    }

    /// Where the last successful save wrote to.
    pub fn saved_path(&self) -> Option<&Path> {
        self.saved_path.as_deref()
    }

    // =========================================================================
    // Load / observe
    // =========================================================================

    /// Load the configured input file. See [`DataManager::load_data`].
    pub fn load(&mut self) -> StageReport {
        let path = self.config.input_path.clone();
        match load_csv(&path, self.config.separator_byte()) {
            Ok(df) => {
                let mut report = StageReport::new(Stage::Load);
                report.info(format!(
                    "Data loaded successfully: {} rows x {} columns",
                    df.height(),
                    df.width()
                ));
                self.df = Some(df);
                report
            }
            Err(e) => {
                self.df = None;
                StageReport::skipped(
                    Stage::Load,
                    format!("Could not load {}: {}", path.display(), e),
                )
            }
        }
    }

    /// Load the configured input file.
    ///
    /// Returns `false` and leaves the table unset when the file is missing
    /// or cannot be parsed; no error escapes.
    pub fn load_data(&mut self) -> bool {
        !self.load().skipped
    }

    /// Shape, dtypes, a seeded row sample and frequency counts of the
    /// observed columns. `None` when no table is loaded.
    pub fn observe_data(&self) -> Option<Observation> {
        let Some(df) = self.df.as_ref() else {
            warn!("There is no data loaded to observe");
            return None;
        };

        let dtypes: Vec<(String, String)> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();
        let non_null: Vec<usize> = df
            .get_columns()
            .iter()
            .map(|c| c.len() - c.null_count())
            .collect();

        let sample_rows = self.sample_rows(df);

        let mut counts = Vec::new();
        for role in ColumnRole::OBSERVED_ROLES {
            let name = self.config.columns.name_of(role);
            let Ok(column) = df.column(name) else {
                continue;
            };
            // numeric columns have no meaningful frequency table
            if !is_text_dtype(column.dtype()) && !is_categorical_dtype(column.dtype()) {
                continue;
            }
            match value_counts(column.as_materialized_series()) {
                Ok(c) => counts.push(ValueCounts {
                    column: name.to_string(),
                    counts: c,
                }),
                Err(e) => warn!("Could not count values of '{}': {}", name, e),
            }
        }

        debug!("Observed table of shape {:?}", df.shape());
        Some(Observation {
            shape: df.shape(),
            dtypes,
            non_null,
            sample_rows,
            value_counts: counts,
        })
    }

    fn sample_rows(&self, df: &DataFrame) -> Vec<Vec<String>> {
        let sample_size = self.config.sample_rows.min(df.height());
        let mut rng = StdRng::seed_from_u64(self.config.sample_seed);
        let indices: Vec<usize> = (0..df.height()).collect();

        indices
            .choose_multiple(&mut rng, sample_size)
            .map(|&idx| {
                df.get_columns()
                    .iter()
                    .map(|c| {
                        c.get(idx)
                            .map(|v| render_value(&v))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    // =========================================================================
    // Missing values
    // =========================================================================

    /// Null count and percentage of every column holding nulls.
    pub fn missing_summary(&self) -> Option<MissingSummary> {
        let df = self.df.as_ref()?;
        let height = df.height();

        let columns = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| ColumnMissing {
                column: c.name().to_string(),
                count: c.null_count(),
                percentage: if height == 0 {
                    0.0
                } else {
                    c.null_count() as f64 / height as f64 * 100.0
                },
            })
            .collect();

        Some(MissingSummary { columns })
    }

    /// Report nulls per column, plus the sentinel entries that will count as
    /// missing once normalized.
    pub fn identify_missing_values(&self) -> StageReport {
        let (Some(df), Some(summary)) = (self.df.as_ref(), self.missing_summary()) else {
            return StageReport::skipped(Stage::IdentifyMissing, no_data());
        };

        let mut report = StageReport::new(Stage::IdentifyMissing);
        if summary.columns.is_empty() {
            report.info("No missing values");
        }
        for col in &summary.columns {
            report.info(format!(
                "Column '{}': {} missing ({:.2}%)",
                col.column, col.count, col.percentage
            ));
        }

        for role in ColumnRole::SENTINEL_ROLES {
            let name = self.config.columns.name_of(role);
            if let Ok(n) = count_sentinel(df, name, self.config.sentinel_value) {
                if n > 0 {
                    report.info(format!(
                        "Column '{}': {} sentinel values ({})",
                        name, n, self.config.sentinel_value
                    ));
                }
            }
        }
        report
    }

    /// Normalize sentinels to null, then run the imputation policy.
    ///
    /// Columns named by the policy but absent from the table are skipped
    /// with a diagnostic.
    pub fn handle_missing_values(&mut self) -> Result<StageReport> {
        let Some(df) = self.df.as_mut() else {
            return Ok(StageReport::skipped(Stage::Imputation, no_data()));
        };
        let mut report = StageReport::new(Stage::Imputation);
        let sentinel = self.config.sentinel_value;

        for role in ColumnRole::SENTINEL_ROLES {
            let name = self.config.columns.name_of(role);
            if df.column(name).is_err() {
                report.warn(format!(
                    "Column '{}' not found; no sentinel replacement",
                    name
                ));
                continue;
            }
            let replaced = replace_sentinel(df, name, sentinel)
                .map_err(|e| CleaningError::CleaningFailed(e.to_string()))?;
            report.info(format!(
                "Replaced {} values of {} with null in '{}'",
                replaced, sentinel, name
            ));
        }

        self.policy.apply(
            df,
            &self.config.columns,
            self.config.knn_neighbors,
            &mut report,
        )?;

        let remaining: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
        report.info(format!("Missing values remaining after imputation: {}", remaining));
        Ok(report)
    }

    // =========================================================================
    // Type conversion / text cleaning
    // =========================================================================

    /// Established to Int64, easy-apply to categorical, then the derived
    /// numeric salary.
    ///
    /// # Errors
    ///
    /// [`CleaningError::TypeConversionFailed`] when the established column
    /// still holds nulls. Nothing after it is converted in that case.
    pub fn convert_datatypes(&mut self) -> Result<StageReport> {
        let Some(df) = self.df.as_mut() else {
            return Ok(StageReport::skipped(Stage::TypeConversion, no_data()));
        };
        let mut report = StageReport::new(Stage::TypeConversion);
        let names = &self.config.columns;

        if df.column(&names.established).is_ok() {
            to_integer(df, &names.established)?;
            report.info(format!("Column '{}' converted to Int64", names.established));
        } else {
            report.warn(CleaningError::ColumnNotFound(names.established.clone()).to_string());
        }

        match df.column(&names.easy_apply).map(|c| c.dtype().clone()) {
            Ok(dtype) if is_categorical_dtype(&dtype) => {
                report.info(format!("Column '{}' is already categorical", names.easy_apply));
            }
            Ok(_) => {
                let n = to_categorical(df, &names.easy_apply)?;
                report.info(format!(
                    "Column '{}' converted to categorical ({} categories)",
                    names.easy_apply, n
                ));
            }
            Err(_) => {
                report.warn(CleaningError::ColumnNotFound(names.easy_apply.clone()).to_string());
            }
        }

        if df.column(&names.salary).is_ok() {
            add_salary_numeric(df, &names.salary, &mut report)
                .map_err(|e| CleaningError::CleaningFailed(e.to_string()))
                .context(format!("Parsing salary ranges in '{}'", names.salary))?;
        } else {
            report.warn(CleaningError::ColumnNotFound(names.salary.clone()).to_string());
        }

        report.info(format!(
            "Data types after conversion: {}",
            df.get_columns()
                .iter()
                .map(|c| format!("{}={}", c.name(), c.dtype()))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(report)
    }

    /// Strip a trailing `,XX` code and surrounding whitespace from every
    /// value of `column_name`.
    pub fn clean_text_column(&mut self, column_name: &str) -> StageReport {
        let Some(df) = self.df.as_mut() else {
            return StageReport::skipped(Stage::TextCleaning, no_data());
        };
        let Ok(column) = df.column(column_name) else {
            return StageReport::skipped(
                Stage::TextCleaning,
                CleaningError::ColumnNotFound(column_name.to_string()).to_string(),
            );
        };

        let mut report = StageReport::new(Stage::TextCleaning);
        let series = column.as_materialized_series().clone();
        if !is_text_dtype(series.dtype()) {
            report.warn(format!(
                "Column '{}' is {}, not text; cleaning its rendered values",
                column_name,
                series.dtype()
            ));
        }

        let cleaned = match clean_text_series(&series) {
            Ok(s) => s,
            Err(e) => {
                report.warn(format!("Could not clean '{}': {}", column_name, e));
                return report;
            }
        };
        if let Err(e) = df.replace(column_name, cleaned.clone()) {
            report.warn(format!("Could not replace '{}': {}", column_name, e));
            return report;
        }

        report.info(format!("Column '{}' cleaned", column_name));
        match value_counts(&cleaned) {
            Ok(counts) => {
                let top: Vec<String> = counts
                    .iter()
                    .take(TOP_VALUES)
                    .map(|(value, n)| format!("{} ({})", value, n))
                    .collect();
                report.info(format!("Top values: {}", top.join(", ")));
            }
            Err(e) => report.warn(format!("Could not count values of '{}': {}", column_name, e)),
        }
        report
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Save to the configured output directory and file name.
    pub fn save_data(&mut self) -> StageReport {
        let dir = self.config.output_dir.clone();
        let name = self.config.output_name.clone();
        self.save_to(&dir, &name)
    }

    /// Save to `output_dir/file_name`; the extension selects the format.
    ///
    /// Unsupported extensions and I/O failures end up as diagnostics.
    pub fn save_to(&mut self, output_dir: &Path, file_name: &str) -> StageReport {
        let Some(df) = self.df.as_mut() else {
            return StageReport::skipped(Stage::Save, no_data());
        };

        match save_table(df, output_dir, file_name) {
            Ok(path) => {
                let mut report = StageReport::new(Stage::Save);
                report.info(format!("Cleaned dataset saved to {}", path.display()));
                self.saved_path = Some(path);
                report
            }
            Err(e) => StageReport::skipped(
                Stage::Save,
                format!("Could not save the dataset ({}): {}", e.error_code(), e),
            ),
        }
    }
}
