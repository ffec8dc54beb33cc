//! Cohort expense allocation
//!
//! Planned maintenance expense and vendor fixed fee for each financial year
//! (taken from the business plan of that calendar year) are shared across the
//! target cohorts in proportion to their active policy counts, then turned
//! into per-policy annual rates used by the cohort passes. Years without a
//! plan escalate the prior year's allocation.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::assumptions::{AssumptionSet, CohortYears, FINANCIAL_YEARS};
use crate::error::{EngineError, Result};
use crate::lookup::{add_months, format_iso_date, safe_div};
use crate::policy::ModelPoint;

use super::row::ProjectionRow;

/// Parallel `[cohort][financial-year offset]` arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortExpenseTable {
    pub cohort_years: Vec<String>,
    /// Financial year at offset 0
    pub base_year: i32,
    /// Policy count in force at the year end times the cohort's new business
    pub active_policy_count: Vec<Vec<f64>>,
    pub maintenance_expense: Vec<Vec<f64>>,
    pub vendor_fixed_fee: Vec<Vec<f64>>,
    /// In-force count of the unit block at the cohort's year end
    pub policy_count: Vec<Vec<f64>>,
    /// Annual maintenance expense per policy
    pub maintenance_rate: Vec<Vec<f64>>,
    /// Annual vendor fixed fee per policy
    pub vendor_fee_rate: Vec<Vec<f64>>,
}

impl CohortExpenseTable {
    fn zeroed(cohort_years: &CohortYears) -> Self {
        let grid = vec![vec![0.0; FINANCIAL_YEARS]; cohort_years.len()];
        Self {
            cohort_years: cohort_years.labels().to_vec(),
            base_year: cohort_years.base_year(),
            active_policy_count: grid.clone(),
            maintenance_expense: grid.clone(),
            vendor_fixed_fee: grid.clone(),
            policy_count: grid.clone(),
            maintenance_rate: grid.clone(),
            vendor_fee_rate: grid,
        }
    }

    /// Per-policy annual rates for a cohort at a financial-year offset;
    /// offsets past the horizon yield zero
    pub fn rates(&self, cohort: usize, offset: usize) -> (f64, f64) {
        let maintenance = self
            .maintenance_rate
            .get(cohort)
            .and_then(|r| r.get(offset))
            .copied()
            .unwrap_or(0.0);
        let vendor = self
            .vendor_fee_rate
            .get(cohort)
            .and_then(|r| r.get(offset))
            .copied()
            .unwrap_or(0.0);
        (maintenance, vendor)
    }
}

/// Weighted end-of-period in-force count per valuation date across all model points
pub fn inforce_by_date(
    projections: &[Vec<ProjectionRow>],
    model_points: &[ModelPoint],
) -> HashMap<String, f64> {
    let mut inforce: HashMap<String, f64> = HashMap::new();
    for (rows, model_point) in projections.iter().zip(model_points) {
        for row in rows {
            *inforce.entry(row.valuation_date.clone()).or_insert(0.0) +=
                model_point.weight * row.no_p_eop;
        }
    }
    inforce
}

/// Build the cohort expense table from the completed base passes
pub fn allocate_cohort_expenses(
    projections: &[Vec<ProjectionRow>],
    model_points: &[ModelPoint],
    valuation_date: NaiveDate,
    cohort_years: &CohortYears,
    assumptions: &AssumptionSet,
) -> Result<CohortExpenseTable> {
    let inforce = inforce_by_date(projections, model_points);

    // In-force count at the end of each year since valuation
    let mut year_end_counts = Vec::with_capacity(FINANCIAL_YEARS);
    for t in 0..FINANCIAL_YEARS {
        let date = add_months(valuation_date, 12 * (t as i32 + 1)).ok_or_else(|| {
            EngineError::InvalidDate(format!(
                "{} + {} years is out of range",
                valuation_date,
                t + 1
            ))
        })?;
        year_end_counts.push(inforce.get(&format_iso_date(date)).copied().unwrap_or(0.0));
    }

    let mut table = CohortExpenseTable::zeroed(cohort_years);
    let plans: Vec<_> = cohort_years
        .iter()
        .map(|(_, label)| assumptions.business_plan.cohort(label))
        .collect();

    for (c, plan) in plans.iter().enumerate() {
        if plan.policy_count <= 0.0 {
            warn!(
                "Cohort {} has no new business; its expense rates are zero",
                cohort_years.label(c)
            );
        }
        let offset = cohort_years.offset(c);
        for k in offset..FINANCIAL_YEARS {
            table.policy_count[c][k] = year_end_counts[k - offset];
            table.active_policy_count[c][k] = table.policy_count[c][k] * plan.policy_count;
        }
    }

    let cohorts = cohort_years.len();
    for k in 0..FINANCIAL_YEARS {
        let total_active: f64 = (0..cohorts).map(|c| table.active_policy_count[c][k]).sum();
        let budget = assumptions
            .business_plan
            .budget_for_year(table.base_year + k as i32);

        for c in 0..cohorts {
            let active = table.active_policy_count[c][k];
            let (maintenance, vendor_fee) = match budget {
                Some(plan) => {
                    let share = safe_div(active, total_active);
                    (plan.maintenance_expense * share, plan.vendor_fixed_fee * share)
                }
                None if k == 0 => (0.0, 0.0),
                None => {
                    // Unplanned years roll the prior allocation forward with the active count
                    let growth = (1.0 + assumptions.expense_escalation)
                        * safe_div(active, table.active_policy_count[c][k - 1]);
                    (
                        table.maintenance_expense[c][k - 1] * growth,
                        table.vendor_fixed_fee[c][k - 1] * growth,
                    )
                }
            };
            table.maintenance_expense[c][k] = maintenance;
            table.vendor_fixed_fee[c][k] = vendor_fee;

            let policies = table.policy_count[c][k] * plans[c].policy_count;
            table.maintenance_rate[c][k] = safe_div(maintenance, policies);
            table.vendor_fee_rate[c][k] = safe_div(vendor_fee, policies);
        }
    }

    debug!(
        "Allocated cohort expenses over {} financial years from {}",
        FINANCIAL_YEARS, table.base_year
    );
    Ok(table)
}
