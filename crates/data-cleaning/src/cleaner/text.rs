//! Regex normalization of free-text columns.

use anyhow::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// ",NY" / ",In" at the very end of the value
static TRAILING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",([A-Za-z]{2,})$").expect("Invalid regex: trailing code"));

/// Strip a trailing comma-delimited letter code and surrounding whitespace.
///
/// `"New York,NY"` becomes `"New York"`; a value without such a suffix is
/// only trimmed.
pub fn clean_location(value: &str) -> String {
    TRAILING_CODE.replace(value, "").trim().to_string()
}

/// Apply [`clean_location`] to every value of a series.
///
/// Non-text series are rendered as text first; nulls stay null.
pub fn clean_text_series(series: &Series) -> Result<Series> {
    let str_series = series.cast(&DataType::String)?;
    let cleaned: Vec<Option<String>> = str_series
        .str()?
        .into_iter()
        .map(|v| v.map(clean_location))
        .collect();

    Ok(Series::new(series.name().clone(), cleaned))
}
