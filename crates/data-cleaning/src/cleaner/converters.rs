//! Type conversion functions for cleaned columns.

use crate::error::{CleaningError, Result};
use crate::utils::to_f64_values;
use polars::prelude::*;

/// Convert a numeric column to Int64.
///
/// Every entry must be present: a remaining null (or an unparsable text
/// value) fails with [`CleaningError::TypeConversionFailed`]. Fractions are
/// truncated toward zero.
pub fn to_integer(df: &mut DataFrame, col_name: &str) -> Result<()> {
    let series = df.column(col_name)?.as_materialized_series().clone();
    let values = to_f64_values(&series)?;

    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(CleaningError::TypeConversionFailed {
            column: col_name.to_string(),
            target_type: "Int64".to_string(),
            reason: format!("{} missing values remain", missing),
        });
    }

    let integers: Vec<i64> = values.into_iter().flatten().map(|v| v.trunc() as i64).collect();
    df.replace(col_name, Series::new(col_name.into(), integers))?;
    Ok(())
}

/// Convert a column to a categorical over its observed values.
///
/// Non-text columns are rendered as text first so booleans and numbers
/// become categories too. Returns the number of distinct categories.
///
/// The result is a `Categorical` on the global registry, not an `Enum`.
/// Its values are exactly the distinct labels present at conversion.
pub fn to_categorical(df: &mut DataFrame, col_name: &str) -> Result<usize> {
    let series = df.column(col_name)?.as_materialized_series();
    let as_text = series.cast(&DataType::String)?;
    let categorical = as_text.cast(&DataType::from_categories(Categories::global()))?;

    let n_categories = categorical.drop_nulls().n_unique()?;
    df.replace(col_name, categorical)?;
    Ok(n_categories)
}
