//! Financial-year reporting views over an extraction result
//!
//! Every view re-filters the flat rows by calendar `Year` and scales by the
//! cohort's new-business count. Cohort `c` written in year `y_c` is the unit
//! model-point block shifted by `y_c - base`, so financial year `base + k`
//! reads rows whose `Year` is `valuation year + k - (y_c - base)`.

mod ifrs4;
mod ifrs17;
mod expenses;

pub use ifrs4::{ifrs4_summary, Ifrs4Summary};
pub use ifrs17::{ifrs17_summary, Ifrs17Summary};
pub use expenses::{expense_summary, ExpenseSummary};

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::assumptions::{CohortYears, FINANCIAL_YEARS};
use crate::error::{EngineError, Result};
use crate::extract::EngineInput;
use crate::lookup::parse_iso_date;
use crate::projection::{cohort_column, ExtractionResult, FlatProjectionRow};

/// Which column a metric is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Base column shared by all cohorts, e.g. `premiumIncome`
    Base(&'a str),
    /// Cohort metric, read as `<metric>_<cohortYear>`
    Cohort(&'a str),
}

/// Sums named columns by financial year across cohorts
pub struct FinancialYearFilter<'a> {
    cohort_years: CohortYears,
    valuation_year: i32,
    new_business: Vec<f64>,
    /// Rows by calendar year
    year_rows: BTreeMap<i32, Vec<&'a FlatProjectionRow>>,
    /// Last row of each model point within each calendar year
    year_end_rows: BTreeMap<i32, Vec<&'a FlatProjectionRow>>,
}

impl<'a> FinancialYearFilter<'a> {
    pub fn new(result: &'a ExtractionResult, input: &EngineInput) -> Result<Self> {
        let cohort_years = CohortYears::parse(&input.target_cohort_years)?;
        let valuation_year = parse_iso_date(&input.valuation_date)
            .ok_or_else(|| EngineError::InvalidDate(input.valuation_date.clone()))?
            .year();
        let new_business = cohort_years
            .labels()
            .iter()
            .map(|label| input.assumptions.business_plan.cohort(label).policy_count)
            .collect();

        let mut year_rows: BTreeMap<i32, Vec<&FlatProjectionRow>> = BTreeMap::new();
        let mut year_end_rows: BTreeMap<i32, Vec<&FlatProjectionRow>> = BTreeMap::new();
        for (i, row) in result.rows.iter().enumerate() {
            year_rows.entry(row.base.year).or_default().push(row);

            // Rows of one model point are contiguous and restart at month 0
            let is_year_end = match result.rows.get(i + 1) {
                Some(next) => next.base.month == 0 || next.base.year != row.base.year,
                None => true,
            };
            if is_year_end {
                year_end_rows.entry(row.base.year).or_default().push(row);
            }
        }

        Ok(Self {
            cohort_years,
            valuation_year,
            new_business,
            year_rows,
            year_end_rows,
        })
    }

    pub fn base_year(&self) -> i32 {
        self.cohort_years.base_year()
    }

    /// Calendar years of the financial-year axis
    pub fn financial_years(&self) -> Vec<i32> {
        (0..FINANCIAL_YEARS as i32).map(|k| self.base_year() + k).collect()
    }

    pub fn cohort_years(&self) -> &CohortYears {
        &self.cohort_years
    }

    /// Flow metric: sum over every row in each financial year
    pub fn flow(&self, scope: Scope<'_>) -> Vec<f64> {
        self.aggregate(&self.year_rows, scope)
    }

    /// Stock metric: year-end value summed over model points
    pub fn stock(&self, scope: Scope<'_>) -> Vec<f64> {
        self.aggregate(&self.year_end_rows, scope)
    }

    /// Flow of a metric for a single cohort, scaled by its new business
    pub fn cohort_flow(&self, cohort: usize, scope: Scope<'_>) -> Vec<f64> {
        let mut series = vec![0.0; FINANCIAL_YEARS];
        self.add_cohort(&mut series, &self.year_rows, cohort, scope);
        series
    }

    fn aggregate(
        &self,
        rows: &BTreeMap<i32, Vec<&FlatProjectionRow>>,
        scope: Scope<'_>,
    ) -> Vec<f64> {
        let mut series = vec![0.0; FINANCIAL_YEARS];
        for cohort in 0..self.cohort_years.len() {
            self.add_cohort(&mut series, rows, cohort, scope);
        }
        series
    }

    fn add_cohort(
        &self,
        series: &mut [f64],
        rows: &BTreeMap<i32, Vec<&FlatProjectionRow>>,
        cohort: usize,
        scope: Scope<'_>,
    ) {
        let new_business = self.new_business[cohort];
        if new_business == 0.0 {
            return;
        }
        let offset = self.cohort_years.offset(cohort);
        let column = match scope {
            Scope::Base(name) => name.to_string(),
            Scope::Cohort(metric) => cohort_column(metric, self.cohort_years.label(cohort)),
        };

        for (k, value) in series.iter_mut().enumerate().skip(offset) {
            let year = self.valuation_year + (k - offset) as i32;
            let total: f64 = rows
                .get(&year)
                .map(|rows| rows.iter().filter_map(|row| row.column(&column)).sum())
                .unwrap_or(0.0);
            *value += total * new_business;
        }
    }
}

/// Element-wise sum of series
pub(crate) fn sum_series<S: AsRef<[f64]>>(series: &[S]) -> Vec<f64> {
    let mut total = vec![0.0; FINANCIAL_YEARS];
    for s in series {
        for (t, v) in total.iter_mut().zip(s.as_ref()) {
            *t += v;
        }
    }
    total
}
