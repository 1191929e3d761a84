use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Role a column plays in the cleaning pipeline.
///
/// Roles decouple the policy from the column names found in a given file;
/// see [`crate::config::ColumnNames`] for the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Numeric, few distinct outliers
    Age,
    /// Numeric rating with sentinel, inferred from other features
    Rating,
    /// Free-text salary range
    Salary,
    /// Year-like numeric with sentinel
    Established,
    /// Flag column that becomes categorical
    EasyApply,
    /// Free-text location
    Location,
}

impl ColumnRole {
    /// Roles whose `-1` entries mean "missing".
    pub const SENTINEL_ROLES: [ColumnRole; 2] = [ColumnRole::Rating, ColumnRole::Established];

    /// Roles whose frequency counts are shown when observing the table.
    pub const OBSERVED_ROLES: [ColumnRole; 3] = [
        ColumnRole::Location,
        ColumnRole::EasyApply,
        ColumnRole::Established,
    ];
}

/// Stages of the cleaning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    IdentifyMissing,
    Imputation,
    TypeConversion,
    TextCleaning,
    Save,
}

impl Stage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Load => "Loading Data",
            Self::IdentifyMissing => "Identifying Missing Values",
            Self::Imputation => "Handling Missing Values",
            Self::TypeConversion => "Converting Types",
            Self::TextCleaning => "Cleaning Text",
            Self::Save => "Saving Data",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// One diagnostic line produced by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Structured outcome of a single stage.
///
/// Stages return this instead of printing; every entry is mirrored to
/// `tracing` when it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    /// True when the stage did nothing (no table, column absent, ...).
    pub skipped: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            skipped: false,
            diagnostics: Vec::new(),
        }
    }

    /// Report for a stage that had nothing to work on.
    pub fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        let mut report = Self::new(stage);
        report.skipped = true;
        report.warn(reason);
        report
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("[{}] {}", self.stage, message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Info,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("[{}] {}", self.stage, message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// Whether any diagnostic contains `needle`. Handy in tests.
    pub fn mentions(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message.contains(needle))
    }
}

/// Null count of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// Columns that currently hold nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingSummary {
    pub columns: Vec<ColumnMissing>,
}

impl MissingSummary {
    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }

    pub fn count_for(&self, column: &str) -> usize {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

impl fmt::Display for MissingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "  No missing values");
        }
        writeln!(f, "  {:<24} {:>8} {:>12}", "Column", "Count", "Percentage")?;
        for col in &self.columns {
            writeln!(
                f,
                "  {:<24} {:>8} {:>11.2}%",
                col.column, col.count, col.percentage
            )?;
        }
        Ok(())
    }
}

/// Frequency table of one column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCounts {
    pub column: String,
    pub counts: Vec<(String, usize)>,
}

/// Human-oriented summary of the loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub shape: (usize, usize),
    /// `(column, dtype)` in column order.
    pub dtypes: Vec<(String, String)>,
    /// Non-null count per column, aligned with `dtypes`.
    pub non_null: Vec<usize>,
    /// Randomly sampled rows, values rendered as text.
    pub sample_rows: Vec<Vec<String>>,
    pub value_counts: Vec<ValueCounts>,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} rows x {} columns", self.shape.0, self.shape.1)?;
        writeln!(f, "  {:<24} {:>10}  {}", "Column", "Non-Null", "Dtype")?;
        for ((name, dtype), non_null) in self.dtypes.iter().zip(&self.non_null) {
            writeln!(f, "  {:<24} {:>10}  {}", name, non_null, dtype)?;
        }

        if !self.sample_rows.is_empty() {
            writeln!(f, "\nSample of {} rows:", self.sample_rows.len())?;
            for row in &self.sample_rows {
                writeln!(f, "  {}", row.join(" | "))?;
            }
        }

        for vc in &self.value_counts {
            writeln!(f, "\nValue counts for '{}':", vc.column)?;
            for (value, count) in &vc.counts {
                writeln!(f, "  {:<32} {}", value, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_report_records_severity() {
        let mut report = StageReport::new(Stage::Imputation);
        report.info("Column 'Age' imputed with the median: 30");
        assert!(!report.has_warnings());

        report.warn("Column 'Rating' not found");
        assert!(report.has_warnings());
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.mentions("median"));
    }

    #[test]
    fn test_skipped_report() {
        let report = StageReport::skipped(Stage::Save, "No data loaded");
        assert!(report.skipped);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_missing_summary_lookup() {
        let summary = MissingSummary {
            columns: vec![
                ColumnMissing {
                    column: "Rating".to_string(),
                    count: 2,
                    percentage: 20.0,
                },
                ColumnMissing {
                    column: "Age".to_string(),
                    count: 1,
                    percentage: 10.0,
                },
            ],
        };
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.count_for("Rating"), 2);
        assert_eq!(summary.count_for("Location"), 0);
        assert!(summary.to_string().contains("Rating"));
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::TypeConversion).unwrap();
        assert_eq!(json, "\"type_conversion\"");
    }
}
