//! Column-level cleaning operations.
//!
//! This module provides functionality for:
//! - Sentinel normalization (`-1` meaning "missing")
//! - Salary range parsing and derived salary features
//! - Integer and categorical type conversion
//! - Regex normalization of free-text columns

mod converters;
mod salary;
mod sentinel;
mod text;

pub use converters::{to_categorical, to_integer};
pub use salary::{
    SALARY_LOWER, SALARY_MID, SALARY_NUMERIC, SALARY_UPPER, SCRATCH_COLUMNS, add_salary_features,
    add_salary_numeric, parse_salary_range, salary_bounds,
};
pub use sentinel::{count_sentinel, replace_sentinel};
pub use text::{clean_location, clean_text_series};
