//! Expense view by cohort and financial year

use serde::Serialize;

use crate::assumptions::{AssumptionSet, CohortYears, FINANCIAL_YEARS};
use crate::projection::CohortExpenseTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub cohort_years: Vec<String>,
    pub financial_years: Vec<i32>,
    /// `[cohort][financial year]`; acquisition falls in the cohort's own year
    pub acquisition: Vec<Vec<f64>>,
    pub maintenance: Vec<Vec<f64>>,
    pub vendor_fee: Vec<Vec<f64>>,
    /// All cohorts and expense types per financial year
    pub total: Vec<f64>,
}

fn cell(grid: &[Vec<f64>], cohort: usize, year: usize) -> f64 {
    grid.get(cohort).and_then(|r| r.get(year)).copied().unwrap_or(0.0)
}

/// Build the view from a run's expense table; a table from a run that never
/// happened (empty arrays) gives zeros
pub fn expense_summary(
    table: &CohortExpenseTable,
    cohort_years: &CohortYears,
    assumptions: &AssumptionSet,
) -> ExpenseSummary {
    let cohorts = cohort_years.len();
    let mut acquisition = vec![vec![0.0; FINANCIAL_YEARS]; cohorts];
    let mut maintenance = vec![vec![0.0; FINANCIAL_YEARS]; cohorts];
    let mut vendor_fee = vec![vec![0.0; FINANCIAL_YEARS]; cohorts];
    let mut total = vec![0.0; FINANCIAL_YEARS];

    for (c, label) in cohort_years.iter() {
        acquisition[c][cohort_years.offset(c)] =
            assumptions.business_plan.cohort(label).acquisition_expense;
        for k in 0..FINANCIAL_YEARS {
            maintenance[c][k] = cell(&table.maintenance_expense, c, k);
            vendor_fee[c][k] = cell(&table.vendor_fixed_fee, c, k);
            total[k] += acquisition[c][k] + maintenance[c][k] + vendor_fee[c][k];
        }
    }

    ExpenseSummary {
        cohort_years: cohort_years.labels().to_vec(),
        financial_years: (0..FINANCIAL_YEARS as i32)
            .map(|k| cohort_years.base_year() + k)
            .collect(),
        acquisition,
        maintenance,
        vendor_fee,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{BusinessPlan, CohortPlan};

    #[test]
    fn test_acquisition_in_cohort_year_and_zero_table() {
        let years = CohortYears::parse(&["2025", "2026", "2028", "2029", "2031"]).unwrap();
        let mut cohorts = std::collections::BTreeMap::new();
        cohorts.insert(
            "2028".to_string(),
            CohortPlan {
                acquisition_expense: 9_000.0,
                ..Default::default()
            },
        );
        let assumptions = AssumptionSet {
            business_plan: BusinessPlan { cohorts },
            ..Default::default()
        };

        let summary = expense_summary(&CohortExpenseTable::default(), &years, &assumptions);
        assert_eq!(summary.acquisition[2][3], 9_000.0);
        assert_eq!(summary.total[3], 9_000.0);
        assert_eq!(summary.total.iter().sum::<f64>(), 9_000.0);
        assert_eq!(summary.financial_years[0], 2025);
        assert_eq!(summary.maintenance[4].len(), FINANCIAL_YEARS);
    }
}
