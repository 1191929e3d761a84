use crate::error::CleaningError;
use crate::types::{MissingSummary, Observation, Severity, StageReport};
use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Run Report Types
// ============================================================================

/// Everything one cleaning run produced, in stage order.
///
/// Serialized as-is for `--json` and for the `<stem>_report.json` file;
/// [`fmt::Display`] renders the console summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the output file (if written)
    pub output_file: Option<String>,
    /// Table summary taken right after loading
    pub observation: Option<Observation>,
    /// Nulls per column before imputation (sentinels not yet counted)
    pub missing_before: Option<MissingSummary>,
    /// Nulls per column after the last stage
    pub missing_after: Option<MissingSummary>,
    pub stages: Vec<StageReport>,
    /// Stage errors the run continued past
    pub errors: Vec<ReportedError>,
}

/// Serialized form of a [`CleaningError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedError {
    pub code: String,
    pub message: String,
}

impl From<&CleaningError> for ReportedError {
    fn from(error: &CleaningError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl RunReport {
    pub fn new(input_file: impl AsRef<Path>) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.as_ref().display().to_string(),
            output_file: None,
            observation: None,
            missing_before: None,
            missing_after: None,
            stages: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn push_stage(&mut self, stage: StageReport) {
        self.stages.push(stage);
    }

    pub fn push_error(&mut self, error: &CleaningError) {
        self.errors.push(ReportedError::from(error));
    }

    /// Warnings across all stages.
    pub fn warning_count(&self) -> usize {
        self.stages
            .iter()
            .flat_map(|s| &s.diagnostics)
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// True when every stage ran and no error was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.stages.iter().all(|s| !s.skipped)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleaning run of {} ({})", self.input_file, self.generated_at)?;

        if let Some(observation) = &self.observation {
            writeln!(f, "\n--- Observation ---")?;
            write!(f, "{}", observation)?;
        }
        if let Some(missing) = &self.missing_before {
            writeln!(f, "\n--- Missing values before imputation ---")?;
            write!(f, "{}", missing)?;
        }

        for stage in &self.stages {
            let status = if stage.skipped { " (skipped)" } else { "" };
            writeln!(f, "\n--- {}{} ---", stage.stage, status)?;
            for diagnostic in &stage.diagnostics {
                let marker = match diagnostic.severity {
                    Severity::Info => "[+]",
                    Severity::Warning => "[!]",
                };
                writeln!(f, "{} {}", marker, diagnostic.message)?;
            }
        }

        if let Some(missing) = &self.missing_after {
            writeln!(f, "\n--- Missing values after cleaning ---")?;
            write!(f, "{}", missing)?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "\n--- Errors ---")?;
            for error in &self.errors {
                writeln!(f, "[{}] {}", error.code, error.message)?;
            }
        }

        match &self.output_file {
            Some(path) => writeln!(f, "\nOutput: {}", path),
            None => writeln!(f, "\nOutput: not written"),
        }
    }
}

// ============================================================================
// Report Writer
// ============================================================================

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `report` as pretty JSON to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(&self, report: &RunReport, report_base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
