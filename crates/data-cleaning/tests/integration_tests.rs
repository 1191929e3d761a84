//! Integration tests for the data cleaning pipeline.
//!
//! These tests run the full stage sequence over the CSV fixtures and check
//! the files it writes.

use calamine::{Reader, Xlsx, open_workbook};
use data_cleaning::{
    CleaningConfig, ColumnRole, DataManager, ImputationPolicy, ImputationStrategy,
    ReportGenerator, RunReport, SALARY_NUMERIC, Stage,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config_for(fixture: &str, output_dir: &Path) -> CleaningConfig {
    CleaningConfig::builder()
        .input_path(fixtures_path().join(fixture))
        .output_dir(output_dir)
        .build()
        .unwrap()
}

fn read_output(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

/// Run every stage in order, failing the test on a stage error.
fn run_all(manager: &mut DataManager) {
    assert!(manager.load_data(), "fixture should load");
    manager.identify_missing_values();
    manager.handle_missing_values().unwrap();
    manager.convert_datatypes().unwrap();
    let location = manager.config().columns.location.clone();
    manager.clean_text_column(&location);
    assert!(!manager.save_data().skipped);
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_employees() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));

    run_all(&mut manager);

    let output = manager.saved_path().unwrap().to_path_buf();
    assert_eq!(output, dir.path().join("clean_employes.csv"));

    let df = read_output(&output);
    assert_eq!(df.height(), 10);
    assert_eq!(
        df.get_column_names()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>(),
        vec![
            "Age",
            "Rating",
            "Salary",
            "Established",
            "Easy Apply",
            "Location",
            SALARY_NUMERIC
        ]
    );

    for col in ["Age", "Rating", "Established", SALARY_NUMERIC] {
        assert_eq!(df.column(col).unwrap().null_count(), 0, "{col}");
    }
}

#[test]
fn test_established_converts_to_exact_integers() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    let established = df.column("Established").unwrap();
    assert_eq!(established.dtype(), &DataType::Int64);

    let years: Vec<i64> = established.i64().unwrap().into_no_null_iter().collect();
    // The -1 row gets the median of the nine known years.
    assert_eq!(
        years,
        vec![1973, 2005, 1990, 1998, 2012, 1998, 1981, 2001, 2010, 1995]
    );
}

#[test]
fn test_rating_sentinels_are_imputed_within_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    let ratings: Vec<f64> = df
        .column("Rating")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();

    assert!(ratings.iter().all(|r| *r != -1.0));
    for idx in [2, 5] {
        assert!(
            (3.3..=4.5).contains(&ratings[idx]),
            "row {idx}: {}",
            ratings[idx]
        );
    }
}

#[test]
fn test_age_gets_median() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    let age = df.column("Age").unwrap().f64().unwrap().clone();
    // median of 34, 28, 45, 51, 39, 30, 42, 27
    assert_eq!(age.get(1), Some(36.5));
    assert_eq!(age.get(6), Some(36.5));
}

#[test]
fn test_salary_numeric_and_location() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    let salary = df.column(SALARY_NUMERIC).unwrap().f64().unwrap().clone();
    assert_eq!(salary.get(0), Some(71500.0));
    assert_eq!(salary.get(6), Some(79000.0));
    // The "N/A" salary takes the median of the nine parsed values.
    assert_eq!(salary.get(8), Some(79000.0));

    let location = df.column("Location").unwrap().str().unwrap().clone();
    assert_eq!(location.get(0), Some("New York"));
    assert_eq!(location.get(1), Some("India"));
    assert_eq!(location.get(3), Some("San Francisco"));
    assert_eq!(location.get(7), Some("Paris"));

    assert!(matches!(
        df.column("Easy Apply").unwrap().dtype(),
        DataType::Categorical(_, _)
    ));
}

#[test]
fn test_imputation_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    assert!(manager.load_data());

    manager.handle_missing_values().unwrap();
    let once = manager.get_cleaned_data().unwrap().clone();
    manager.handle_missing_values().unwrap();

    assert!(once.equals(manager.get_cleaned_data().unwrap()));
}

// ============================================================================
// Input Variants
// ============================================================================

#[test]
fn test_semicolon_separator() {
    let dir = tempfile::tempdir().unwrap();
    let config = CleaningConfig::builder()
        .input_path(fixtures_path().join("employees_semicolon.csv"))
        .separator(';')
        .output_dir(dir.path())
        .build()
        .unwrap();
    let mut manager = DataManager::new(config);
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    assert_eq!(df.shape(), (3, 7));

    let established: Vec<i64> = df
        .column("Established")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(established, vec![1999, 2003, 2008]);

    // Fewer donors than k: the mean of both.
    let rating = df.column("Rating").unwrap().f64().unwrap().get(0).unwrap();
    assert!((rating - 4.05).abs() < 1e-9);

    let location = df.column("Location").unwrap().str().unwrap().clone();
    assert_eq!(location.get(0), Some("Denver"));
    assert_eq!(location.get(2), Some("Lyon"));
}

#[test]
fn test_late_text_token_falls_back_to_full_inference() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees_late_text.csv", dir.path()));
    run_all(&mut manager);

    let df = manager.get_cleaned_data().unwrap();
    assert_eq!(df.height(), 151);

    let age = df.column("Age").unwrap();
    assert_eq!(age.dtype(), &DataType::Float64);
    assert_eq!(age.null_count(), 0);
    // "unknown" parses to null and takes the median of the 150 ages
    assert_eq!(age.f64().unwrap().get(150), Some(38.0));
    assert_eq!(age.f64().unwrap().get(0), Some(20.0));
}

#[test]
fn test_missing_columns_are_skipped_with_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees_no_rating.csv", dir.path()));
    assert!(manager.load_data());

    let imputation = manager.handle_missing_values().unwrap();
    assert!(imputation.mentions("'Rating' not found"));

    let conversion = manager.convert_datatypes().unwrap();
    assert!(conversion.mentions("'Easy Apply' not found"));

    let df = manager.get_cleaned_data().unwrap();
    let established: Vec<i64> = df
        .column("Established")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(established, vec![1988, 2003, 1995]);
    assert_eq!(df.width(), 5);
}

#[test]
fn test_load_nonexistent_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("does_not_exist.csv", dir.path()));

    assert!(!manager.load_data());
    assert!(manager.get_cleaned_data().is_none());

    let report = manager.save_data();
    assert!(report.skipped);
    assert!(!dir.path().join("clean_employes.csv").exists());
}

#[test]
fn test_convert_without_imputation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()))
        .with_policy(ImputationPolicy::default().with_rule(
            ColumnRole::Established,
            ImputationStrategy::Skip,
        ));
    assert!(manager.load_data());
    manager.handle_missing_values().unwrap();

    let err = manager.convert_datatypes().unwrap_err();
    assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    assert!(err.is_recoverable());
}

// ============================================================================
// Output Formats
// ============================================================================

#[test]
fn test_save_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let config = CleaningConfig::builder()
        .input_path(fixtures_path().join("employees.csv"))
        .output_dir(dir.path().join("nested").join("out"))
        .output_name("clean_employes.xlsx")
        .build()
        .unwrap();
    let mut manager = DataManager::new(config);
    run_all(&mut manager);

    let path = manager.saved_path().unwrap();
    assert!(path.ends_with("clean_employes.xlsx"));

    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0][4], "Easy Apply");
    // categorical cells carry the bare label, as in the CSV output
    let easy_apply: Vec<&str> = rows[1..].iter().map(|r| r[4].as_str()).collect();
    assert_eq!(
        easy_apply,
        vec!["-1", "TRUE", "-1", "TRUE", "-1", "-1", "TRUE", "-1", "-1", "TRUE"]
    );
    assert_eq!(rows[1][5], "New York");
    assert_eq!(rows[1][6], "71500");
}

#[test]
fn test_save_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    assert!(manager.load_data());

    let report = manager.save_to(dir.path(), "clean_employes.parquet");
    assert!(report.skipped);
    assert!(report.has_warnings());
    assert!(manager.saved_path().is_none());
}

// ============================================================================
// Configuration and Reports
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("cleaning.json");
    std::fs::write(
        &config_path,
        r#"{ "separator": ";", "knn_neighbors": 3, "output_name": "out.csv" }"#,
    )
    .unwrap();

    let config = CleaningConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.separator, ';');
    assert_eq!(config.knn_neighbors, 3);
    assert_eq!(config.output_name, "out.csv");
    assert_eq!(config.columns.easy_apply, "Easy Apply");
}

#[test]
fn test_config_from_json_file_rejects_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("cleaning.json");
    std::fs::write(&config_path, r#"{ "knn_neighbors": 0 }"#).unwrap();

    let err = CleaningConfig::from_json_file(&config_path).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}

#[test]
fn test_run_report_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config_for("employees.csv", dir.path()));
    let mut report = RunReport::new(&manager.config().input_path);

    report.push_stage(manager.load());
    report.observation = manager.observe_data();
    report.missing_before = manager.missing_summary();
    report.push_stage(manager.handle_missing_values().unwrap());
    report.missing_after = manager.missing_summary();

    let observation = report.observation.as_ref().unwrap();
    assert_eq!(observation.shape, (10, 6));
    assert_eq!(observation.sample_rows.len(), 5);
    assert_eq!(report.missing_before.as_ref().unwrap().count_for("Age"), 2);
    assert_eq!(report.missing_after.as_ref().unwrap().total(), 0);

    let path = ReportGenerator::new(dir.path())
        .write_report_to_file(&report, "employees")
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["stages"][1]["stage"], "imputation");
    assert_eq!(report.stages[0].stage, Stage::Load);
}
