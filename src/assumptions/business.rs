//! New-business plan per target cohort year

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Number of target cohort years tracked separately for CSM
pub const COHORT_COUNT: usize = 5;

/// Financial-year horizon of the cohort expense table
pub const FINANCIAL_YEARS: usize = 30;

/// Business projection for one cohort year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CohortPlan {
    /// Policies written in the cohort year (scales the unit model-point block)
    pub policy_count: f64,

    /// Total maintenance expense budgeted for the financial year equal to this cohort year
    pub maintenance_expense: f64,

    /// Total acquisition expense for the cohort's new business
    pub acquisition_expense: f64,

    /// Total vendor fixed fee budgeted for the financial year equal to this cohort year
    pub vendor_fixed_fee: f64,
}

/// Business plan keyed by cohort year (`"2025"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessPlan {
    pub cohorts: BTreeMap<String, CohortPlan>,
}

impl BusinessPlan {
    /// Plan for a cohort year; absent years behave as an all-zero plan
    pub fn cohort(&self, cohort_year: &str) -> CohortPlan {
        self.cohorts.get(cohort_year).cloned().unwrap_or_default()
    }

    /// Plan whose maintenance and vendor budgets cover a calendar financial year
    pub fn budget_for_year(&self, year: i32) -> Option<&CohortPlan> {
        self.cohorts.get(&year.to_string())
    }
}

/// The five validated target cohort years, in ascending order.
///
/// The first year is the base of the financial-year axis: offset `k` of the
/// cohort expense table is financial year `base + k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortYears {
    labels: Vec<String>,
    years: Vec<i32>,
}

impl CohortYears {
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.len() != COHORT_COUNT {
            return Err(EngineError::InvalidCohortYears(format!(
                "expected {} cohort years, got {}",
                COHORT_COUNT,
                labels.len()
            )));
        }

        let mut years = Vec::with_capacity(COHORT_COUNT);
        for label in labels {
            let label = label.as_ref().trim();
            let year: i32 = label.parse().map_err(|_| {
                EngineError::InvalidCohortYears(format!("'{}' is not a year", label))
            })?;
            years.push(year);
        }

        if years.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(EngineError::InvalidCohortYears(format!(
                "cohort years must be strictly ascending: {:?}",
                years
            )));
        }
        if (years[COHORT_COUNT - 1] - years[0]) as usize >= FINANCIAL_YEARS {
            return Err(EngineError::InvalidCohortYears(format!(
                "cohort years span more than {} financial years",
                FINANCIAL_YEARS
            )));
        }

        Ok(Self {
            labels: years.iter().map(|y| y.to_string()).collect(),
            years,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn base_year(&self) -> i32 {
        self.years[0]
    }

    /// Offset of a cohort from the base year on the financial-year axis
    pub fn offset(&self, index: usize) -> usize {
        (self.years[index] - self.years[0]) as usize
    }

    pub(crate) fn len(&self) -> usize {
        self.years.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().enumerate().map(|(i, l)| (i, l.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cohort_years() {
        let years = CohortYears::parse(&["2025", "2026", "2027", "2028", "2029"]).unwrap();
        assert_eq!(years.base_year(), 2025);
        assert_eq!(years.offset(3), 3);
        assert_eq!(years.label(4), "2029");
        assert_eq!(years.len(), 5);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(CohortYears::parse(&["2025", "2026"]).is_err());
        assert!(CohortYears::parse(&["2025", "2026", "x", "2028", "2029"]).is_err());
        assert!(CohortYears::parse(&["2025", "2025", "2027", "2028", "2029"]).is_err());
        assert!(CohortYears::parse(&["2025", "2026", "2027", "2028", "2070"]).is_err());
    }

    #[test]
    fn test_missing_plan_is_zero() {
        let plan: BusinessPlan = serde_json::from_str(
            r#"{"2025": {"policyCount": 1000, "maintenanceExpense": 50000}}"#,
        )
        .unwrap();
        assert_eq!(plan.cohort("2025").policy_count, 1000.0);
        assert_eq!(plan.cohort("2025").acquisition_expense, 0.0);
        assert_eq!(plan.cohort("2030"), CohortPlan::default());
    }
}
