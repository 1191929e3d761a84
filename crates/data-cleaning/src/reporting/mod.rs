//! Run report generation.
//!
//! [`RunReport`] collects the stage reports of one run and is used for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--report` CLI flag)
//! - The human-readable console summary
//!
//! # Example
//!
//! ```rust,ignore
//! use data_cleaning::reporting::{ReportGenerator, RunReport};
//!
//! let mut report = RunReport::new("data/employes.csv");
//! report.push_stage(manager.identify_missing_values());
//!
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new("preprocessed");
//! generator.write_report_to_file(&report, "employes")?;
//! ```

mod generator;

pub use generator::{ReportGenerator, ReportedError, RunReport};
