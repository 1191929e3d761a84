//! Per-role imputation policy.
//!
//! The policy is an ordered table of `(role, strategy)` rules. Order matters:
//! the KNN rule reads its companion feature, so the companion's own rule has
//! to run first (age before rating in the default table).

use super::{KNNImputer, StatisticalImputer};
use crate::cleaner::{SALARY_MID, SCRATCH_COLUMNS, add_salary_features};
use crate::config::ColumnNames;
use crate::error::{CleaningError, Result};
use crate::types::{ColumnRole, StageReport};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the missing entries of one column are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Fill with the median of the present values
    Median,
    /// Fill with the mean of the present values
    Mean,
    /// KNN over the salary midpoint derived from `derive_from` and the
    /// `companion` column
    Knn {
        derive_from: ColumnRole,
        companion: ColumnRole,
    },
    /// Leave the column alone
    Skip,
}

/// Ordered table of imputation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationPolicy {
    rules: Vec<(ColumnRole, ImputationStrategy)>,
}

impl Default for ImputationPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                (ColumnRole::Age, ImputationStrategy::Median),
                (
                    ColumnRole::Rating,
                    ImputationStrategy::Knn {
                        derive_from: ColumnRole::Salary,
                        companion: ColumnRole::Age,
                    },
                ),
                (ColumnRole::Established, ImputationStrategy::Median),
            ],
        }
    }
}

impl ImputationPolicy {
    /// Empty policy; every role resolves to [`ImputationStrategy::Skip`].
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Set the strategy for `role`, replacing an existing rule in place or
    /// appending a new one.
    pub fn with_rule(mut self, role: ColumnRole, strategy: ImputationStrategy) -> Self {
        match self.rules.iter_mut().find(|(r, _)| *r == role) {
            Some(rule) => rule.1 = strategy,
            None => self.rules.push((role, strategy)),
        }
        self
    }

    pub fn strategy_for(&self, role: ColumnRole) -> ImputationStrategy {
        self.rules
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, s)| *s)
            .unwrap_or(ImputationStrategy::Skip)
    }

    pub fn rules(&self) -> &[(ColumnRole, ImputationStrategy)] {
        &self.rules
    }

    /// Apply every rule in order to `df`.
    ///
    /// A rule whose column is absent is skipped with a warning. Afterwards no
    /// scratch column may remain in the table.
    pub fn apply(
        &self,
        df: &mut DataFrame,
        names: &ColumnNames,
        knn_neighbors: usize,
        report: &mut StageReport,
    ) -> Result<()> {
        for (role, strategy) in &self.rules {
            let col_name = names.name_of(*role);
            if df.column(col_name).is_err() {
                report.warn(format!(
                    "Column '{}' not found; skipping {:?} imputation",
                    col_name, strategy
                ));
                continue;
            }

            debug!("Imputing '{}' with {:?}", col_name, strategy);
            let outcome = match strategy {
                ImputationStrategy::Median => {
                    StatisticalImputer::apply_numeric_median(df, col_name, report).map(|_| ())
                }
                ImputationStrategy::Mean => {
                    StatisticalImputer::apply_numeric_mean(df, col_name, report).map(|_| ())
                }
                ImputationStrategy::Knn {
                    derive_from,
                    companion,
                } => {
                    let salary = names.name_of(*derive_from);
                    let companion = names.name_of(*companion);
                    let result = impute_knn(df, col_name, salary, companion, knn_neighbors, report);
                    drop_scratch_columns(df);
                    result
                }
                ImputationStrategy::Skip => Ok(()),
            };

            outcome.map_err(|e| CleaningError::ImputationFailed {
                column: col_name.to_string(),
                reason: e.to_string(),
            })?;
        }

        ensure_no_scratch_columns(df)
    }
}

/// Fill `target` with KNN over {salary midpoint, companion, target}.
///
/// Scratch salary columns are added to `df`; the caller drops them.
fn impute_knn(
    df: &mut DataFrame,
    target: &str,
    salary: &str,
    companion: &str,
    k: usize,
    report: &mut StageReport,
) -> anyhow::Result<()> {
    let missing = df.column(target)?.null_count();
    if missing == 0 {
        report.info(format!("Column '{}' has no missing values", target));
        return Ok(());
    }

    let mut features = Vec::new();
    if df.column(salary).is_ok() {
        add_salary_features(df, salary)?;
        StatisticalImputer::apply_numeric_mean(df, SALARY_MID, report)?;
        features.push(SALARY_MID.to_string());
    } else {
        report.warn(format!(
            "Column '{}' not found; KNN for '{}' runs without salary features",
            salary, target
        ));
    }
    if df.column(companion).is_ok() {
        features.push(companion.to_string());
    } else {
        report.warn(format!(
            "Column '{}' not found; KNN for '{}' runs without it",
            companion, target
        ));
    }
    features.push(target.to_string());

    let imputer = KNNImputer::new(k);
    let filled = imputer.fit_transform(df, &features, target)?;
    df.replace(target, filled)?;

    report.info(format!(
        "Column '{}' imputed with KNN (k={}, features: {:?}); {} values filled",
        target,
        imputer.n_neighbors(),
        features,
        missing
    ));
    Ok(())
}

/// Remove any scratch salary column still present.
pub fn drop_scratch_columns(df: &mut DataFrame) {
    for name in SCRATCH_COLUMNS {
        if df.column(name).is_ok() {
            let _ = df.drop_in_place(name);
        }
    }
}

/// Fail when a scratch column survived imputation.
pub fn ensure_no_scratch_columns(df: &DataFrame) -> Result<()> {
    let leftover: Vec<&str> = SCRATCH_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_ok())
        .collect();

    if leftover.is_empty() {
        Ok(())
    } else {
        Err(CleaningError::SchemaViolation {
            stage: "imputation".to_string(),
            reason: format!("scratch columns left in table: {:?}", leftover),
        })
    }
}
