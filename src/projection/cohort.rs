//! Cohort-crossed passes
//!
//! The base rows are re-read once per target cohort year. Each cohort builds
//! its own column of [`CohortMetrics`] from the shared base fields and the
//! cohort's expense rates; no cohort reads another's column.
//!
//! 8. [`allocate_cohort_cashflows`] forward: cohort expenses and net cashflow
//! 9. [`discount_cohort_reserves`] backward: statutory and IFRS17 non-unit reserves
//! 10. [`roll_cohort_margins`] forward: BEL, RA, CSM with loss component split

use crate::assumptions::{AssumptionSet, CohortYears};
use crate::lookup::safe_div;
use crate::policy::ModelPoint;

use super::expenses::CohortExpenseTable;
use super::passes::reserve_step;
use super::row::{CohortMetrics, ProjectionRow};

/// Identity of the cohort a column is being built for
#[derive(Debug, Clone, Copy)]
pub struct CohortContext<'a> {
    pub index: usize,
    pub label: &'a str,
    /// Financial-year offset of the cohort from the base year
    pub offset: usize,
    pub base_year: i32,
}

impl<'a> CohortContext<'a> {
    pub fn new(cohort_years: &'a CohortYears, index: usize) -> Self {
        Self {
            index,
            label: cohort_years.label(index),
            offset: cohort_years.offset(index),
            base_year: cohort_years.base_year(),
        }
    }

    /// Financial-year offset a row falls in for this cohort
    pub fn financial_year_offset(&self, policy_year: u32) -> usize {
        self.offset + policy_year.saturating_sub(1) as usize
    }
}

/// Cohort expenses and net cashflow per row
pub fn allocate_cohort_cashflows(
    rows: &[ProjectionRow],
    metrics: &mut [CohortMetrics],
    model_point: &ModelPoint,
    assumptions: &AssumptionSet,
    expenses: &CohortExpenseTable,
    cohort: CohortContext<'_>,
) {
    let term_months = model_point.term_months();
    let weight = model_point.weight;
    let plan = assumptions.business_plan.cohort(cohort.label);
    let acquisition_per_policy = safe_div(plan.acquisition_expense, plan.policy_count);

    for (row, m) in rows.iter().zip(metrics.iter_mut()) {
        let offset = cohort.financial_year_offset(row.policy_year);
        let (maintenance_rate, vendor_fee_rate) = expenses.rates(cohort.index, offset);
        let in_force = weight * row.no_p_bop;
        let in_term = row.month >= 1 && row.month <= term_months;

        m.financial_year = cohort.base_year + offset as i32;
        m.maintenance_rate = maintenance_rate;
        m.vendor_fee_rate = vendor_fee_rate;

        m.initial_expense = if row.month == 1 {
            acquisition_per_policy * in_force
        } else {
            0.0
        };
        if in_term {
            m.renewal_expense = maintenance_rate / 12.0 * in_force;
            m.vendor_fixed_fee = vendor_fee_rate / 12.0 * in_force;
        }
        m.vendor_commission =
            row.premium_income * assumptions.vendor_commission_fraction(row.policy_year);

        m.net_cashflow = row.non_unit_cashflow - m.cohort_expenses();
    }
}

/// Statutory and IFRS17 non-unit reserves on the cohort's net cashflow
pub fn discount_cohort_reserves(
    rows: &[ProjectionRow],
    metrics: &mut [CohortMetrics],
    model_point: &ModelPoint,
) {
    let term_months = model_point.term_months();

    for i in (0..metrics.len()).rev() {
        let (head, tail) = metrics.split_at_mut(i + 1);
        let m = &mut head[i];
        m.non_unit_reserve = match (tail.first(), rows.get(i + 1)) {
            (Some(next), Some(next_row)) => reserve_step(
                &rows[i],
                term_months,
                next.non_unit_reserve,
                next.net_cashflow,
                next_row.monthly_interest_rate,
            ),
            _ => 0.0,
        };
        m.ifrs17_non_unit_reserve = m.non_unit_reserve;
    }

    // Month 0 IFRS17 reserve is seeded from month 1
    if let (Some(first), Some(first_row)) = (metrics.get(1).cloned(), rows.get(1)) {
        metrics[0].ifrs17_non_unit_reserve = (first.non_unit_reserve - first.net_cashflow)
            / (1.0 + first_row.monthly_interest_rate);
    }
}

fn split_margin(net: f64) -> (f64, f64) {
    (net.max(0.0), (-net).max(0.0))
}

/// BEL, RA and the CSM/loss-component roll-forward
pub fn roll_cohort_margins(
    rows: &[ProjectionRow],
    metrics: &mut [CohortMetrics],
    assumptions: &AssumptionSet,
) {
    let ra_pct = assumptions.risk_adjustment_pct;

    for i in 0..metrics.len() {
        let (done, rest) = metrics.split_at_mut(i);
        let prev = done.last();
        let m = &mut rest[0];
        let row = &rows[i];
        let rate = row.monthly_interest_rate;

        m.bel = m.ifrs17_non_unit_reserve + row.unit_fund_inforce;
        m.risk_adjustment = ra_pct * (m.bel + row.pv_premium);

        let Some(p) = prev else {
            continue;
        };

        m.delta_non_unit_reserve = m.non_unit_reserve - p.non_unit_reserve;
        m.interest_on_non_unit_reserve = p.non_unit_reserve * rate;
        m.profit = m.net_cashflow + m.interest_on_non_unit_reserve - m.delta_non_unit_reserve;

        m.variable_fee = p.bel
            + row.premium_income
            + row.investment_income
            + p.ifrs17_non_unit_reserve * rate
            - row.benefit_and_expense_outgo()
            - m.cohort_expenses()
            - m.bel;

        // Signed margin: positive is CSM, negative is loss component
        let (opening_net, opening_ra) = if row.month == 1 {
            (-(p.bel + p.risk_adjustment), p.risk_adjustment)
        } else {
            (p.net_csm, p.closing_ra)
        };
        let pattern = row.csm_release_pattern;

        let release = pattern * (opening_net + m.variable_fee);
        m.net_csm = opening_net + m.variable_fee - release;

        (m.opening_csm, m.opening_loss_component) = split_margin(opening_net);
        (m.csm_release, m.loss_component_release) = split_margin(release);
        (m.closing_csm, m.closing_loss_component) = split_margin(m.net_csm);

        m.opening_ra = opening_ra;
        m.ra_release = pattern * opening_ra;
        m.closing_ra = opening_ra - m.ra_release;
    }
}

/// Run the cohort passes for every target cohort and attach the results to the rows
pub fn project_cohorts(
    rows: &mut [ProjectionRow],
    model_point: &ModelPoint,
    assumptions: &AssumptionSet,
    expenses: &CohortExpenseTable,
    cohort_years: &CohortYears,
) {
    for index in 0..cohort_years.len() {
        let cohort = CohortContext::new(cohort_years, index);
        let mut metrics = vec![CohortMetrics::default(); rows.len()];

        allocate_cohort_cashflows(rows, &mut metrics, model_point, assumptions, expenses, cohort);
        discount_cohort_reserves(rows, &mut metrics, model_point);
        roll_cohort_margins(rows, &mut metrics, assumptions);

        for (row, m) in rows.iter_mut().zip(metrics) {
            row.cohorts.insert(cohort.label.to_string(), m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{BusinessPlan, CohortPlan, FINANCIAL_YEARS};
    use crate::policy::{DeathBenefitOption, Sex, Smoker};
    use crate::projection::passes::*;
    use approx::assert_relative_eq;

    fn model_point() -> ModelPoint {
        ModelPoint {
            id: 7,
            age: 35,
            sex: Sex::Female,
            smoker: Smoker::NonSmoker,
            policy_term: 5,
            premium_term: 5,
            annual_premium: 6_000.0,
            sum_assured: 50_000.0,
            death_benefit: DeathBenefitOption::SumAssuredPlusFundValue,
            weight: 1.5,
        }
    }

    fn assumptions() -> AssumptionSet {
        let mut cohorts = std::collections::BTreeMap::new();
        cohorts.insert(
            "2025".to_string(),
            CohortPlan {
                policy_count: 200.0,
                maintenance_expense: 0.0,
                acquisition_expense: 40_000.0,
                vendor_fixed_fee: 0.0,
            },
        );
        let mut mortality = crate::assumptions::RateTable::default();
        for age in 35..41 {
            mortality.insert(&[age.to_string(), "F".to_string()], 0.002);
        }
        AssumptionSet {
            mortality,
            lapse: crate::assumptions::RateTable::from_pairs((1..=5).map(|py| (py, 0.05))),
            vendor_commission: crate::assumptions::RateTable::from_pairs([(1, 2.0)]),
            investment_income_rate: 0.04,
            fund_management_charge: 0.01,
            admin_fee: 3.0,
            business_plan: BusinessPlan { cohorts },
            ..Default::default()
        }
    }

    fn expense_table(years: &CohortYears) -> CohortExpenseTable {
        let grid = |value: f64| vec![vec![value; FINANCIAL_YEARS]; years.len()];
        CohortExpenseTable {
            cohort_years: years.labels().to_vec(),
            base_year: years.base_year(),
            active_policy_count: grid(1.0),
            maintenance_expense: grid(0.0),
            vendor_fixed_fee: grid(0.0),
            policy_count: grid(1.0),
            maintenance_rate: grid(120.0),
            vendor_fee_rate: grid(24.0),
        }
    }

    fn run() -> Vec<ProjectionRow> {
        let mp = model_point();
        let a = assumptions();
        let years = CohortYears::parse(&["2025", "2026", "2027", "2028", "2029"]).unwrap();
        let mut rows: Vec<ProjectionRow> = (0..mp.row_count() as u32)
            .map(|m| ProjectionRow::new(mp.id, m, String::new(), 2025))
            .collect();
        project_decrements_and_fund(&mut rows, &mp, &a);
        project_claims_and_reinsurance(&mut rows, &mp, &a);
        discount_base_reserves(&mut rows, &mp);
        measure_base_liability(&mut rows, &a);
        accumulate_coverage_units(&mut rows, &mp);
        release_base_margins(&mut rows);
        correct_opening_balances(&mut rows);
        project_cohorts(&mut rows, &mp, &a, &expense_table(&years), &years);
        rows
    }

    #[test]
    fn test_every_row_has_every_cohort() {
        let rows = run();
        for row in &rows {
            assert_eq!(row.cohorts.len(), 5);
        }
        assert_eq!(rows[1].cohorts["2025"].financial_year, 2025);
        assert_eq!(rows[13].cohorts["2025"].financial_year, 2026);
        assert_eq!(rows[13].cohorts["2027"].financial_year, 2028);
    }

    #[test]
    fn test_cohort_expenses() {
        let rows = run();
        let m1 = &rows[1].cohorts["2025"];
        assert_relative_eq!(m1.initial_expense, 40_000.0 / 200.0 * 1.5, epsilon = 1e-9);
        assert_relative_eq!(m1.renewal_expense, 10.0 * 1.5, epsilon = 1e-9);
        assert_relative_eq!(m1.vendor_fixed_fee, 2.0 * 1.5, epsilon = 1e-9);
        assert_relative_eq!(m1.vendor_commission, rows[1].premium_income * 0.02, epsilon = 1e-9);

        // No plan for 2026: no acquisition expense
        assert_eq!(rows[1].cohorts["2026"].initial_expense, 0.0);
        assert_eq!(rows[2].cohorts["2025"].initial_expense, 0.0);
        assert_eq!(rows[0].cohorts["2025"].renewal_expense, 0.0);

        for row in &rows {
            let m = &row.cohorts["2025"];
            assert_relative_eq!(
                m.net_cashflow,
                row.non_unit_cashflow - m.cohort_expenses(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_cohort_reserve_recursion() {
        let rows = run();
        let last = rows.len() - 1;
        for cohort in ["2025", "2029"] {
            assert_eq!(rows[0].cohorts[cohort].non_unit_reserve, 0.0);
            assert_eq!(rows[last].cohorts[cohort].non_unit_reserve, 0.0);
            for i in 1..last {
                let next = &rows[i + 1].cohorts[cohort];
                let expected = (next.non_unit_reserve - next.net_cashflow)
                    / (1.0 + rows[i + 1].monthly_interest_rate);
                assert_relative_eq!(
                    rows[i].cohorts[cohort].non_unit_reserve,
                    expected,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_loss_component_split() {
        let rows = run();
        for row in &rows[1..] {
            for m in row.cohorts.values() {
                assert!(m.opening_csm >= 0.0 && m.opening_loss_component >= 0.0);
                assert!(m.opening_csm == 0.0 || m.opening_loss_component == 0.0);
                assert!(m.closing_csm >= 0.0 && m.closing_loss_component >= 0.0);
                assert!(m.csm_release >= 0.0);
                assert_relative_eq!(
                    m.closing_csm - m.closing_loss_component,
                    m.net_csm,
                    epsilon = 1e-9
                );
            }
        }
        for pair in rows[1..].windows(2) {
            let (a, b) = (&pair[0].cohorts["2025"], &pair[1].cohorts["2025"]);
            assert_eq!(b.opening_csm, a.closing_csm);
            assert_eq!(b.opening_loss_component, a.closing_loss_component);
            assert_eq!(b.opening_ra, a.closing_ra);
        }
    }
}
