//! Statistical imputation methods.
//!
//! Median and mean filling for numeric columns.

use crate::types::StageReport;
use crate::utils::{fill_numeric_nulls, mean_of, median_of, to_f64_values};
use anyhow::Result;
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Apply median imputation to a numeric column.
    ///
    /// Returns the fill value, or `None` when the column had no nulls or no
    /// value to compute a median from. A column without nulls is left as is,
    /// dtype included.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        report: &mut StageReport,
    ) -> Result<Option<f64>> {
        Self::apply_with(df, col_name, report, "median", median_of)
    }

    /// Apply mean imputation to a numeric column.
    pub fn apply_numeric_mean(
        df: &mut DataFrame,
        col_name: &str,
        report: &mut StageReport,
    ) -> Result<Option<f64>> {
        Self::apply_with(df, col_name, report, "mean", mean_of)
    }

    fn apply_with(
        df: &mut DataFrame,
        col_name: &str,
        report: &mut StageReport,
        method: &str,
        statistic: fn(&[Option<f64>]) -> Option<f64>,
    ) -> Result<Option<f64>> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let values = to_f64_values(&series)?;

        if values.iter().all(Option::is_some) {
            report.info(format!("Column '{}' has no missing values", col_name));
            return Ok(None);
        }

        let Some(fill_value) = statistic(&values) else {
            report.warn(format!(
                "Column '{}' has no values to compute a {} from",
                col_name, method
            ));
            return Ok(None);
        };

        let filled = fill_numeric_nulls(&series, fill_value)?;
        df.replace(col_name, filled)?;

        report.info(format!(
            "Column '{}' imputed with the {}: {}",
            col_name, method, fill_value
        ));

        Ok(Some(fill_value))
    }
}
