//! Imputation module for handling missing values.
//!
//! This module provides:
//! - KNN imputation over a dense feature matrix
//! - Statistical imputation (mean, median)
//! - The per-role policy table tying strategies to columns

mod knn;
mod policy;
mod statistical;

pub use knn::KNNImputer;
pub use policy::{
    ImputationPolicy, ImputationStrategy, drop_scratch_columns, ensure_no_scratch_columns,
};
pub use statistical::StatisticalImputer;
