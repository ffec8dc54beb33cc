//! Projection engine: builds the month rows for each model point and runs
//! the passes in order

use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::assumptions::{AssumptionSet, CohortYears};
use crate::error::{EngineError, Result};
use crate::lookup::{add_months, format_iso_date, nearest_valid_term};
use crate::policy::ModelPoint;

use super::cohort::project_cohorts;
use super::expenses::{allocate_cohort_expenses, CohortExpenseTable};
use super::output::{flatten_rows, ExtractionResult};
use super::passes::*;
use super::row::ProjectionRow;

/// Run-level settings shared by every model point
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Month 0 of every projection
    pub valuation_date: NaiveDate,

    /// Target cohort years for the cohort passes
    pub cohort_years: CohortYears,
}

/// Main projection engine
pub struct ProjectionEngine<'a> {
    assumptions: &'a AssumptionSet,
    config: ProjectionConfig,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(assumptions: &'a AssumptionSet, config: ProjectionConfig) -> Self {
        Self { assumptions, config }
    }

    /// Empty rows for months 0 through the maturity month, with dates set
    pub fn build_rows(&self, model_point: &ModelPoint) -> Result<Vec<ProjectionRow>> {
        let valuation_date = self.config.valuation_date;
        (0..model_point.row_count() as u32)
            .map(|month| {
                let date = add_months(valuation_date, month as i32).ok_or_else(|| {
                    EngineError::InvalidDate(format!(
                        "{} + {} months is out of range",
                        valuation_date, month
                    ))
                })?;
                Ok(ProjectionRow::new(
                    model_point.id,
                    month,
                    format_iso_date(date),
                    date.year(),
                ))
            })
            .collect()
    }

    /// Passes 1-7 for one model point
    pub fn project_base(&self, model_point: &ModelPoint) -> Result<Vec<ProjectionRow>> {
        let snapped = nearest_valid_term(model_point.premium_term);
        if snapped != model_point.premium_term {
            warn!(
                "Model point {}: premium term {} looked up as {}",
                model_point.id, model_point.premium_term, snapped
            );
        }

        let mut rows = self.build_rows(model_point)?;
        let a = self.assumptions;

        project_decrements_and_fund(&mut rows, model_point, a);
        project_claims_and_reinsurance(&mut rows, model_point, a);
        discount_base_reserves(&mut rows, model_point);
        measure_base_liability(&mut rows, a);
        accumulate_coverage_units(&mut rows, model_point);
        release_base_margins(&mut rows);
        correct_opening_balances(&mut rows);

        debug!("Model point {}: base passes done over {} rows", model_point.id, rows.len());
        Ok(rows)
    }

    /// Passes 8-10 for one model point's completed base rows
    pub fn project_cohorts(
        &self,
        rows: &mut [ProjectionRow],
        model_point: &ModelPoint,
        expenses: &CohortExpenseTable,
    ) {
        project_cohorts(rows, model_point, self.assumptions, expenses, &self.config.cohort_years);
        debug!("Model point {}: cohort passes done", model_point.id);
    }

    /// Project every model point and assemble the flat result.
    ///
    /// Model points run in parallel; results keep input order.
    pub fn run(&self, model_points: &[ModelPoint]) -> Result<ExtractionResult> {
        info!(
            "Projecting {} model points from {}",
            model_points.len(),
            self.config.valuation_date
        );

        let base: Vec<Vec<ProjectionRow>> = model_points
            .par_iter()
            .map(|mp| self.project_base(mp))
            .collect::<Result<_>>()?;

        let expenses = allocate_cohort_expenses(
            &base,
            model_points,
            self.config.valuation_date,
            &self.config.cohort_years,
            self.assumptions,
        )?;

        let rows: Vec<_> = base
            .into_par_iter()
            .zip(model_points.par_iter())
            .map(|(mut rows, mp)| {
                self.project_cohorts(&mut rows, mp, &expenses);
                flatten_rows(rows, &self.config.cohort_years)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        info!("Projection complete: {} rows", rows.len());
        Ok(ExtractionResult {
            rows,
            cohort_expenses: expenses,
        })
    }
}
