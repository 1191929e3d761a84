//! Data Cleaning Pipeline Library
//!
//! A single-pass cleaning pipeline for delimited employee datasets, built on
//! Polars.
//!
//! # Overview
//!
//! A [`DataManager`] loads one table and runs a fixed sequence of stages
//! over it:
//!
//! - **Observe**: shape, dtypes, a seeded row sample, frequency counts
//! - **Identify missing**: nulls per column, plus `-1` sentinel entries
//! - **Impute**: sentinels to null, then a per-role [`ImputationPolicy`]
//!   (median for age and year, KNN over salary midpoint and age for rating)
//! - **Convert types**: year to Int64, easy-apply flag to categorical,
//!   salary ranges to a numeric `Salary_Numeric` column
//! - **Clean text**: strip a trailing `,XX` code from the location column
//! - **Save**: CSV or XLSX, chosen by extension
//!
//! Every stage returns a [`StageReport`] with its diagnostics instead of
//! printing them; the binary collects them into a [`RunReport`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use data_cleaning::{CleaningConfig, DataManager};
//!
//! let config = CleaningConfig::builder()
//!     .input_path("data/raw/data_employes_to_clean.csv")
//!     .output_dir("preprocessed")
//!     .build()?;
//!
//! let mut manager = DataManager::new(config);
//! if manager.load_data() {
//!     manager.identify_missing_values();
//!     manager.handle_missing_values()?;
//!     manager.convert_datatypes()?;
//!     manager.clean_text_column("Location");
//!     manager.save_data();
//! }
//! ```
//!
//! # Configuration
//!
//! [`CleaningConfig`] binds column names to roles and holds the sentinel,
//! `k` for KNN, the sample seed and the output location. It can be read
//! from JSON:
//!
//! ```rust,ignore
//! let config = CleaningConfig::from_json_file("cleaning.json")?;
//! ```
//!
//! # Pure helpers
//!
//! The per-value logic is exposed for reuse and testing:
//! [`parse_salary_range`], [`clean_location`] and [`KNNImputer`].

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod manager;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use cleaner::{SALARY_NUMERIC, clean_location, parse_salary_range};
pub use config::{CleaningConfig, CleaningConfigBuilder, ColumnNames, ConfigValidationError};
pub use error::{CleaningError, Result, ResultExt};
pub use imputers::{ImputationPolicy, ImputationStrategy, KNNImputer};
pub use io::OutputFormat;
pub use manager::DataManager;
pub use reporting::{ReportGenerator, RunReport};
pub use types::{
    ColumnRole, Diagnostic, MissingSummary, Observation, Severity, Stage, StageReport,
};

// Re-export polars for convenience
pub use polars;
