//! Sentinel normalization: placeholder values that mean "missing".

use crate::utils::{f64_series, to_f64_values};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Replace every entry equal to `sentinel` with null.
///
/// The column becomes Float64 (text columns are parsed, unparsable text
/// becomes null). Returns how many entries were replaced.
pub fn replace_sentinel(df: &mut DataFrame, col_name: &str, sentinel: f64) -> Result<usize> {
    let series = df.column(col_name)?.as_materialized_series().clone();
    let mut values = to_f64_values(&series)?;

    let mut replaced = 0;
    for value in values.iter_mut() {
        if *value == Some(sentinel) {
            *value = None;
            replaced += 1;
        }
    }

    debug!(
        "Replaced {} sentinel values ({}) in '{}'",
        replaced, sentinel, col_name
    );
    df.replace(col_name, f64_series(col_name, values))?;
    Ok(replaced)
}

/// Count entries equal to `sentinel`.
pub fn count_sentinel(df: &DataFrame, col_name: &str, sentinel: f64) -> Result<usize> {
    let series = df.column(col_name)?.as_materialized_series();
    Ok(to_f64_values(series)?
        .iter()
        .filter(|v| **v == Some(sentinel))
        .count())
}
