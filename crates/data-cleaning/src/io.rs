//! Reading the input table and writing the cleaned one.

use crate::error::{CleaningError, Result};
use crate::utils::{is_categorical_dtype, is_numeric_dtype, render_value};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// Worksheet limits of the xlsx format.
const XLSX_MAX_ROWS: usize = 1_048_576;
const XLSX_MAX_COLS: usize = 16_384;

/// Output formats selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// Format for a file name, `None` for unsupported extensions.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Parse a delimited file with a header row.
///
/// Types are inferred from the first 100 rows. When a later row does not
/// fit the inferred type, the file is parsed again with inference over
/// every row.
pub fn load_csv(path: &Path, separator: u8) -> Result<DataFrame> {
    match read_csv(path, separator, Some(100)) {
        Ok(df) => {
            debug!("Parsed {:?} from {}", df.shape(), path.display());
            return Ok(df);
        }
        Err(e) if path.is_file() => {
            warn!("Sampled type inference failed for {}: {}", path.display(), e);
        }
        Err(e) => return Err(e.into()),
    }

    let df = read_csv(path, separator, None)?;
    debug!(
        "Parsed {:?} from {} with full type inference",
        df.shape(),
        path.display()
    );
    Ok(df)
}

fn read_csv(path: &Path, separator: u8, infer_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(infer_rows)
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Write `df` to `output_dir/file_name`, creating the directory and its
/// parents. The extension of `file_name` selects the format.
pub fn save_table(df: &mut DataFrame, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let format = OutputFormat::from_file_name(file_name)
        .ok_or_else(|| CleaningError::UnsupportedFormat(file_name.to_string()))?;

    fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(file_name);

    match format {
        OutputFormat::Csv => write_csv(df, &output_path)?,
        OutputFormat::Xlsx => write_xlsx(df, &output_path)?,
    }

    info!("Dataset saved: {}", output_path.display());
    Ok(output_path)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}

fn write_xlsx(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() + 1 > XLSX_MAX_ROWS || df.width() > XLSX_MAX_COLS {
        return Err(CleaningError::UnsupportedFormat(format!(
            "{:?} exceeds the xlsx sheet limits",
            df.shape()
        )));
    }

    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();

        for (col_idx, column) in df.get_columns().iter().enumerate() {
            let col = col_idx as u16;
            worksheet.write_string(0, col, column.name().as_str())?;

            let series = worksheet_series(column)?;
            let numeric = is_numeric_dtype(series.dtype());

            for row_idx in 0..series.len() {
                let row = row_idx as u32 + 1;
                let value = series.get(row_idx)?;
                match value {
                    AnyValue::Null => {}
                    AnyValue::Boolean(b) => {
                        worksheet.write_boolean(row, col, b)?;
                    }
                    ref v if numeric => match v.try_extract::<f64>() {
                        Ok(number) if number.is_finite() => {
                            worksheet.write_number(row, col, number)?;
                        }
                        _ => {
                            worksheet.write_string(row, col, render_value(v))?;
                        }
                    },
                    ref v => {
                        worksheet.write_string(row, col, render_value(v))?;
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Column values as they go into a worksheet: categoricals by label.
fn worksheet_series(column: &Column) -> PolarsResult<Series> {
    let series = column.as_materialized_series();
    if is_categorical_dtype(series.dtype()) {
        series.cast(&DataType::String)
    } else {
        Ok(series.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_output_format_from_file_name() {
        assert_eq!(OutputFormat::from_file_name("out.csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_file_name("OUT.XLSX"), Some(OutputFormat::Xlsx));
        assert_eq!(OutputFormat::from_file_name("out.parquet"), None);
        assert_eq!(OutputFormat::from_file_name("out"), None);
    }

    #[test]
    fn test_load_csv_with_semicolon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semi.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Age;Location").unwrap();
        writeln!(file, "30;New York,NY").unwrap();
        writeln!(file, "41;India,In").unwrap();

        let df = load_csv(&path, b';').unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(
            df.column("Location").unwrap().str().unwrap().get(0),
            Some("New York,NY")
        );
    }

    #[test]
    fn test_load_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_csv(&dir.path().join("nope.csv"), b',').is_err());
    }

    #[test]
    fn test_save_csv_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("a").join("b");
        let mut df = df!["x" => [1i64, 2], "y" => ["p", "q"]].unwrap();

        let path = save_table(&mut df, &out_dir, "clean.csv").unwrap();
        assert!(path.exists());

        let back = load_csv(&path, b',').unwrap();
        assert_eq!(back.shape(), (2, 2));
    }

    #[test]
    fn test_save_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = df![
            "x" => [Some(1.5), None],
            "flag" => [true, false],
            "name" => ["a", "b"],
        ]
        .unwrap();

        let path = save_table(&mut df, dir.path(), "clean.xlsx").unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_load_csv_late_type_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Age,Location").unwrap();
        for i in 0..150 {
            writeln!(file, "{},Lyon", 20 + i % 40).unwrap();
        }
        writeln!(file, "unknown,Lyon").unwrap();

        let df = load_csv(&path, b',').unwrap();
        assert_eq!(df.shape(), (151, 2));
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::String);
        assert_eq!(
            df.column("Age").unwrap().str().unwrap().get(150),
            Some("unknown")
        );
    }

    #[test]
    fn test_worksheet_series_uses_category_labels() {
        let mut df = df!["Easy Apply" => ["TRUE", "-1"]].unwrap();
        crate::cleaner::to_categorical(&mut df, "Easy Apply").unwrap();

        let series = worksheet_series(df.column("Easy Apply").unwrap()).unwrap();
        assert_eq!(series.dtype(), &DataType::String);
        assert_eq!(render_value(&series.get(0).unwrap()), "TRUE");
        assert_eq!(render_value(&series.get(1).unwrap()), "-1");
    }

    #[test]
    fn test_save_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = df!["x" => [1i64]].unwrap();

        let err = save_table(&mut df, dir.path(), "clean.json").unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(!dir.path().join("clean.json").exists());
    }
}
