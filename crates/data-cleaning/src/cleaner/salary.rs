//! Salary range parsing.
//!
//! Salaries arrive as free text such as `"44k-99k"`, `"$55K-$66K"` or
//! `"99k"`. Two derivations exist:
//!
//! - [`parse_salary_range`] turns a whole range into its midpoint and feeds
//!   the persisted `Salary_Numeric` column;
//! - [`salary_bounds`] extracts the `k`-suffixed lower and upper bounds that
//!   build the scratch features for the rating imputer.

use crate::types::StageReport;
use crate::utils::{f64_series, median_of};
use anyhow::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Persisted numeric salary column.
pub const SALARY_NUMERIC: &str = "Salary_Numeric";
/// Scratch column: lower bound of the range.
pub const SALARY_LOWER: &str = "Salary_Lower";
/// Scratch column: upper bound of the range.
pub const SALARY_UPPER: &str = "Salary_Upper";
/// Scratch column: midpoint of the bounds.
pub const SALARY_MID: &str = "Salary_Mid";

/// Columns that only live during rating imputation.
pub const SCRATCH_COLUMNS: [&str; 3] = [SALARY_LOWER, SALARY_UPPER, SALARY_MID];

static DIGIT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid regex: digit runs"));

// "k" as a thousands marker, i.e. right after a digit
static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)k").expect("Invalid regex: thousands marker"));

static LOWER_BOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)k").expect("Invalid regex: lower bound"));

static UPPER_BOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-\s*\$?(\d+)k").expect("Invalid regex: upper bound"));

/// Convert a salary range to a single number.
///
/// Lowercases, drops `$`, expands a `k` following a digit to `000` and
/// collects digit runs. Two runs give their mean, one run is returned as is,
/// anything else (no digits, more than two runs, missing input) is `None`.
pub fn parse_salary_range(raw: Option<&str>) -> Option<f64> {
    let lowered = raw?.to_lowercase().replace('$', "");
    let normalized = THOUSANDS.replace_all(&lowered, "${1}000");

    let numbers: Vec<f64> = DIGIT_RUNS
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    match numbers.as_slice() {
        [low, high] => Some((low + high) / 2.0),
        [single] => Some(*single),
        _ => None,
    }
}

/// Lower and upper `k`-suffixed bounds of a range, in units (x1000).
///
/// `"44k-99k"` gives `(Some(44000.0), Some(99000.0))`; a single `"99k"` has
/// no upper bound.
pub fn salary_bounds(raw: &str) -> (Option<f64>, Option<f64>) {
    let capture = |re: &Regex| {
        re.captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|v| v * 1000.0)
    };
    (capture(&LOWER_BOUND), capture(&UPPER_BOUND))
}

/// Text values of a column, nulls kept as `None`.
fn text_values(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(col_name)?.as_materialized_series();
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Add `Salary_Lower`, `Salary_Upper` and `Salary_Mid` derived from the
/// salary text. The midpoint is null whenever either bound is.
pub fn add_salary_features(df: &mut DataFrame, salary_col: &str) -> Result<()> {
    let texts = text_values(df, salary_col)?;

    let mut lower = Vec::with_capacity(texts.len());
    let mut upper = Vec::with_capacity(texts.len());
    let mut mid = Vec::with_capacity(texts.len());

    for text in &texts {
        let (lo, hi) = match text {
            Some(t) => salary_bounds(t),
            None => (None, None),
        };
        lower.push(lo);
        upper.push(hi);
        mid.push(lo.zip(hi).map(|(l, h)| (l + h) / 2.0));
    }

    df.with_column(f64_series(SALARY_LOWER, lower))?;
    df.with_column(f64_series(SALARY_UPPER, upper))?;
    df.with_column(f64_series(SALARY_MID, mid))?;
    Ok(())
}

/// Add `Salary_Numeric` parsed from the salary text, backfilling unparsable
/// entries with the median of the parsed ones.
pub fn add_salary_numeric(
    df: &mut DataFrame,
    salary_col: &str,
    report: &mut StageReport,
) -> Result<()> {
    let texts = text_values(df, salary_col)?;
    let mut parsed: Vec<Option<f64>> = texts
        .iter()
        .map(|t| parse_salary_range(t.as_deref()))
        .collect();

    let unparsed = parsed.iter().filter(|v| v.is_none()).count();
    if unparsed > 0 {
        match median_of(&parsed) {
            Some(median) => {
                for value in parsed.iter_mut().filter(|v| v.is_none()) {
                    *value = Some(median);
                }
                report.info(format!(
                    "{} unparsable salaries filled with the median: {}",
                    unparsed, median
                ));
            }
            None => report.warn(format!(
                "No salary in '{}' could be parsed; '{}' left empty",
                salary_col, SALARY_NUMERIC
            )),
        }
    }

    df.with_column(f64_series(SALARY_NUMERIC, parsed))?;
    report.info(format!(
        "Column '{}' created from '{}' (midpoint of the range)",
        SALARY_NUMERIC, salary_col
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn test_parse_range_midpoint() {
        assert_eq!(parse_salary_range(Some("44k-99k")), Some(71500.0));
        assert_eq!(parse_salary_range(Some("55k-66k")), Some(60500.0));
    }

    #[test]
    fn test_parse_single_value() {
        assert_eq!(parse_salary_range(Some("99k")), Some(99000.0));
        assert_eq!(parse_salary_range(Some("42000")), Some(42000.0));
    }

    #[test]
    fn test_parse_currency_and_uppercase() {
        assert_eq!(parse_salary_range(Some("$55K-$66K")), Some(60500.0));
    }

    #[test]
    fn test_parse_missing_or_malformed() {
        assert_eq!(parse_salary_range(None), None);
        assert_eq!(parse_salary_range(Some("")), None);
        assert_eq!(parse_salary_range(Some("unknown")), None);
        assert_eq!(parse_salary_range(Some("1k-2k-3k")), None);
    }

    #[test]
    fn test_salary_bounds() {
        assert_eq!(salary_bounds("44k-99k"), (Some(44000.0), Some(99000.0)));
        assert_eq!(salary_bounds("$55K-$66K"), (Some(55000.0), Some(66000.0)));
        assert_eq!(salary_bounds("99k"), (Some(99000.0), None));
        assert_eq!(salary_bounds("n/a"), (None, None));
    }

    #[test]
    fn test_add_salary_features() {
        let mut df = df![
            "Salary" => [Some("44k-99k"), Some("99k"), None],
        ]
        .unwrap();

        add_salary_features(&mut df, "Salary").unwrap();

        let mid = df.column(SALARY_MID).unwrap();
        assert_eq!(mid.get(0).unwrap().try_extract::<f64>().unwrap(), 71500.0);
        assert_eq!(mid.null_count(), 2);
        assert_eq!(df.column(SALARY_LOWER).unwrap().null_count(), 1);
    }

    #[test]
    fn test_add_salary_numeric_backfills_median() {
        let mut df = df![
            "Salary" => [Some("44k-99k"), Some("unknown"), Some("10k"), None, Some("20k")],
        ]
        .unwrap();
        let mut report = StageReport::new(Stage::TypeConversion);

        add_salary_numeric(&mut df, "Salary", &mut report).unwrap();

        let numeric = df.column(SALARY_NUMERIC).unwrap();
        assert_eq!(numeric.null_count(), 0);
        // median of [71500, 10000, 20000]
        assert_eq!(numeric.get(1).unwrap().try_extract::<f64>().unwrap(), 20000.0);
        assert_eq!(numeric.get(3).unwrap().try_extract::<f64>().unwrap(), 20000.0);
        // the source column is kept
        assert!(df.column("Salary").is_ok());
    }

    #[test]
    fn test_add_salary_numeric_nothing_parsable() {
        let mut df = df!["Salary" => ["n/a", "tbd"]].unwrap();
        let mut report = StageReport::new(Stage::TypeConversion);

        add_salary_numeric(&mut df, "Salary", &mut report).unwrap();

        assert_eq!(df.column(SALARY_NUMERIC).unwrap().null_count(), 2);
        assert!(report.has_warnings());
    }
}
