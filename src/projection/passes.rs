//! Base projection passes over one model point's rows
//!
//! Each pass walks the row buffer once, forward or backward, and only reads
//! fields that earlier passes (or earlier rows of the same pass) have
//! completed:
//!
//! 1. [`project_decrements_and_fund`] forward: rates, policy counts, unit fund
//! 2. [`project_claims_and_reinsurance`] forward: claims, expenses, reinsurance, net cashflows
//! 3. [`discount_base_reserves`] backward: non-unit and RI reserves, PV premium and recoveries
//! 4. [`measure_base_liability`] forward: reserve movements, BEL, RA, variable fee, CSM seed
//! 5. [`accumulate_coverage_units`] backward: remaining coverage units
//! 6. [`release_base_margins`] forward: release patterns and CSM/RA release
//! 7. [`correct_opening_balances`] forward: openings re-derived from prior closings

use crate::assumptions::AssumptionSet;
use crate::lookup::{
    annual_to_monthly_decrement, annual_to_monthly_rate, nearest_valid_term, safe_div,
};
use crate::policy::ModelPoint;

use super::row::ProjectionRow;

/// Rates, decrements, premium and unit fund mechanics
pub fn project_decrements_and_fund(
    rows: &mut [ProjectionRow],
    model_point: &ModelPoint,
    assumptions: &AssumptionSet,
) {
    let term_months = model_point.term_months();
    let maturity_month = model_point.maturity_month();
    let snapped_term = nearest_valid_term(model_point.premium_term);
    let monthly_interest = annual_to_monthly_rate(assumptions.investment_income_rate);
    let monthly_fmc = annual_to_monthly_rate(assumptions.fund_management_charge);
    let weight = model_point.weight;

    for i in 0..rows.len() {
        let (done, rest) = rows.split_at_mut(i);
        let prev = done.last();
        let row = &mut rest[0];

        let month = row.month;
        let in_term = month >= 1 && month <= term_months;

        // Timing
        row.policy_year = model_point.policy_year(month);
        row.attained_age = model_point.attained_age(month);

        // Rates
        let policy_year_started = prev.map_or(false, |p| p.policy_year != row.policy_year);
        row.loyalty_bonus_rate = if in_term && policy_year_started {
            assumptions.loyalty_bonus_fraction(row.policy_year)
        } else {
            0.0
        };
        row.surrender_charge_fixed = assumptions.surrender_charge_fixed(row.policy_year);
        row.surrender_charge_pct = assumptions.surrender_charge_fraction(row.policy_year);
        row.commission_pct = assumptions.commission_pct(row.policy_year, snapped_term);
        row.allocation_charge_pct = if row.policy_year > model_point.premium_term {
            0.0
        } else {
            assumptions.allocation_charge_pct(row.policy_year, snapped_term)
        };
        row.monthly_interest_rate = monthly_interest;
        row.monthly_fmc_rate = monthly_fmc;

        if in_term {
            let annual_mortality = assumptions
                .annual_mortality_rate(row.attained_age, model_point.sex)
                * assumptions.mortality_multiplier;
            row.mortality_rate = annual_to_monthly_decrement(annual_mortality);
            row.lapse_rate =
                annual_to_monthly_decrement(assumptions.annual_lapse_rate(row.policy_year));
            row.coi_rate =
                assumptions.coi_rate(row.attained_age, model_point.sex, model_point.smoker);
        }

        // Policy counts
        row.no_p_bop = match (month, prev) {
            (0, _) | (_, None) => 0.0,
            (1, _) => 1.0,
            (_, Some(p)) => p.no_p_eop - p.no_maturities,
        };
        row.no_deaths = row.mortality_rate * (1.0 - 0.5 * row.lapse_rate) * row.no_p_bop;
        row.no_surrenders = row.lapse_rate * row.no_p_bop;
        row.no_maturities = match prev {
            Some(p) if month == maturity_month => p.no_p_eop,
            _ => 0.0,
        };
        row.no_p_eop = row.no_p_bop - row.no_deaths - row.no_surrenders - row.no_maturities;

        // Premium
        let in_force = weight * row.no_p_bop;
        row.premium_per_policy = model_point.premium_due(month);
        row.premium_income = row.premium_per_policy * in_force;
        row.allocation_charge = row.premium_income * row.allocation_charge_pct / 100.0;
        row.allocated_premium = row.premium_income - row.allocation_charge;

        // Per-policy fund, undecremented
        let prior_fund_per_policy = prev.map_or(0.0, |p| p.fund_value_per_policy);
        if in_term {
            let allocated_per_policy =
                row.premium_per_policy * (1.0 - row.allocation_charge_pct / 100.0);
            let fund_bod = prior_fund_per_policy + allocated_per_policy;
            row.sum_at_risk = model_point
                .death_benefit
                .sum_at_risk(model_point.sum_assured, fund_bod);
            let coi = row.coi_rate * row.sum_at_risk / 12.0;
            let after_deduction = ((fund_bod - assumptions.admin_fee).max(0.0) - coi).max(0.0);
            let with_bonus = after_deduction * (1.0 + row.loyalty_bonus_rate);
            let grown = with_bonus * (1.0 + monthly_interest);
            row.fund_value_per_policy = (grown - grown * monthly_fmc).max(0.0);
        } else {
            row.sum_at_risk = 0.0;
            row.fund_value_per_policy = 0.0;
        }

        // Decremented unit fund
        let prior_inforce = prev.map_or(0.0, |p| p.unit_fund_inforce);
        row.maturity_outgo = if month == maturity_month { prior_inforce } else { 0.0 };
        row.unit_fund_bod = (prior_inforce + row.allocated_premium - row.maturity_outgo).max(0.0);

        row.admin_charge = if in_term { assumptions.admin_fee * in_force } else { 0.0 };
        row.decremented_sum_at_risk = row.sum_at_risk * in_force;
        row.coi_charge = row.coi_rate * row.decremented_sum_at_risk / 12.0;
        row.unit_fund_after_deduction =
            ((row.unit_fund_bod - row.admin_charge).max(0.0) - row.coi_charge).max(0.0);

        row.loyalty_bonus = row.unit_fund_after_deduction * row.loyalty_bonus_rate;
        row.pre_growth_fund = row.unit_fund_after_deduction + row.loyalty_bonus;
        row.investment_income = row.pre_growth_fund * monthly_interest;
        row.fmc_amount = (row.pre_growth_fund + row.investment_income) * monthly_fmc;
        let net_fund = row.pre_growth_fund + row.investment_income - row.fmc_amount;

        // Surrender charge, capped at the surrendering policies' share of the fund
        let pre_growth_per_policy = safe_div(row.pre_growth_fund, in_force);
        let surrender_share = net_fund * safe_div(row.no_surrenders, row.no_p_bop);
        let charge = pre_growth_per_policy * weight * row.surrender_charge_pct * row.no_surrenders
            + weight * row.surrender_charge_fixed * row.no_surrenders;
        row.surrender_charge = charge.min(surrender_share).max(0.0);

        row.death_unit_outgo = net_fund * safe_div(row.no_deaths, row.no_p_bop);
        row.surrender_outgo = surrender_share - row.surrender_charge;

        row.unit_fund_inforce = (net_fund
            - row.surrender_charge
            - row.death_unit_outgo
            - row.surrender_outgo)
            .max(0.0);
    }
}

/// Death claims, commission, investment expense, reinsurance and net cashflows
pub fn project_claims_and_reinsurance(
    rows: &mut [ProjectionRow],
    model_point: &ModelPoint,
    assumptions: &AssumptionSet,
) {
    let term_months = model_point.term_months();
    let weight = model_point.weight;
    let quota_share = assumptions.reinsurance_quota_share;

    for row in rows.iter_mut() {
        let in_term = row.month >= 1 && row.month <= term_months;

        row.death_benefit_per_policy = row.sum_at_risk + row.fund_value_per_policy;
        row.death_outgo = row.death_benefit_per_policy * row.no_deaths * weight;
        row.non_unit_death_claim = row.death_outgo - row.death_unit_outgo;

        row.commission = row.premium_income * row.commission_pct / 100.0;
        row.investment_expense = assumptions.fund_expense_rate / 12.0 * row.unit_fund_inforce;

        // Reinsurance premium is charged annually at the start of each policy year
        row.ri_sum_at_risk = row.decremented_sum_at_risk * quota_share;
        let first_month_of_year = in_term && (row.month - 1) % 12 == 0;
        row.ri_premium = if first_month_of_year {
            assumptions.reinsurance_rate(row.attained_age, model_point.sex, model_point.smoker)
                * row.ri_sum_at_risk
        } else {
            0.0
        };
        row.ri_recovery = row.sum_at_risk * quota_share * row.no_deaths * weight;

        row.non_unit_cashflow = row.allocation_charge
            + row.admin_charge
            + row.coi_charge
            + row.fmc_amount
            + row.surrender_charge
            - row.commission
            - row.non_unit_death_claim
            - row.investment_expense
            - row.loyalty_bonus;
        row.ri_net_cost = row.ri_premium - row.ri_recovery;
    }
}

/// Backward recursion for a reserve: `(next_reserve - next_cashflow) / (1 + next_rate)`,
/// zero at month 0, beyond the term, and when nobody is in force
pub(crate) fn reserve_step(
    row: &ProjectionRow,
    term_months: u32,
    next_reserve: f64,
    next_cashflow: f64,
    next_rate: f64,
) -> f64 {
    if row.month == 0 || row.month > term_months || row.no_p_bop <= 0.0 {
        0.0
    } else {
        (next_reserve - next_cashflow) / (1.0 + next_rate)
    }
}

/// Non-unit reserve, RI reserve, PV premium and PV RI recovery
pub fn discount_base_reserves(rows: &mut [ProjectionRow], model_point: &ModelPoint) {
    let term_months = model_point.term_months();
    let maturity_month = model_point.maturity_month();

    for i in (0..rows.len()).rev() {
        let (head, tail) = rows.split_at_mut(i + 1);
        let row = &mut head[i];

        let Some(next) = tail.first() else {
            row.non_unit_reserve = 0.0;
            row.ri_reserve = 0.0;
            row.pv_premium = 0.0;
            row.pv_ri_recovery = 0.0;
            continue;
        };

        let rate = next.monthly_interest_rate;
        row.non_unit_reserve = reserve_step(
            row,
            term_months,
            next.non_unit_reserve,
            next.non_unit_cashflow,
            rate,
        );
        // RI net cost is an outflow, so it enters with the opposite sign
        row.ri_reserve = reserve_step(row, term_months, next.ri_reserve, -next.ri_net_cost, rate);

        if row.month == 0 || row.month >= maturity_month {
            row.pv_premium = 0.0;
            row.pv_ri_recovery = 0.0;
        } else {
            row.pv_premium = (next.pv_premium + next.premium_income) / (1.0 + rate);
            row.pv_ri_recovery = (next.pv_ri_recovery + next.ri_recovery) / (1.0 + rate);
        }
    }
}

/// Reserve movements, BEL, risk adjustment, variable fee and the CSM seed.
///
/// Openings after month 1 are taken from the prior row's closing balance,
/// which has not been computed yet at this point; the correction pass
/// re-derives them.
pub fn measure_base_liability(rows: &mut [ProjectionRow], assumptions: &AssumptionSet) {
    let ra_pct = assumptions.risk_adjustment_pct;

    // Month 0 IFRS reserves are seeded from month 1's cashflows
    let (seed_non_unit, seed_ri) = match rows.get(1) {
        Some(first) => {
            let discount = 1.0 + first.monthly_interest_rate;
            (
                (first.non_unit_reserve - first.non_unit_cashflow) / discount,
                (first.ri_reserve + first.ri_net_cost) / discount,
            )
        }
        None => (0.0, 0.0),
    };

    for i in 0..rows.len() {
        let (done, rest) = rows.split_at_mut(i);
        let prev = done.last();
        let row = &mut rest[0];

        if i == 0 {
            row.ifrs_non_unit_reserve = seed_non_unit;
            row.ifrs_ri_reserve = seed_ri;
        } else {
            row.ifrs_non_unit_reserve = row.non_unit_reserve;
            row.ifrs_ri_reserve = row.ri_reserve;
        }

        if let Some(p) = prev {
            row.delta_unit_fund = row.unit_fund_inforce - p.unit_fund_inforce;
            row.delta_non_unit_reserve = row.non_unit_reserve - p.non_unit_reserve;
            row.delta_ri_reserve = row.ri_reserve - p.ri_reserve;
            row.interest_on_non_unit_reserve = p.ifrs_non_unit_reserve * row.monthly_interest_rate;
            row.interest_on_ri_reserve = p.ifrs_ri_reserve * row.monthly_interest_rate;
        }

        row.bel = row.ifrs_non_unit_reserve + row.unit_fund_inforce;
        row.risk_adjustment = ra_pct * (row.bel + row.pv_premium);
        row.ri_risk_adjustment = ra_pct * row.pv_ri_recovery;

        // Change in BEL reconciled against the month's cash in and out
        row.csm_variable_fee = match prev {
            Some(p) => {
                p.bel
                    + row.premium_income
                    + row.investment_income
                    + row.interest_on_non_unit_reserve
                    - row.benefit_and_expense_outgo()
                    - row.bel
            }
            None => 0.0,
        };

        match (row.month, prev) {
            (1, Some(p)) => {
                row.opening_csm = -(p.bel + p.risk_adjustment);
                row.opening_ra = p.risk_adjustment;
                row.opening_ri_csm = -(p.ifrs_ri_reserve - p.ri_risk_adjustment);
            }
            (_, Some(p)) => {
                row.opening_csm = p.closing_csm;
                row.opening_ra = p.closing_ra;
                row.opening_ri_csm = p.closing_ri_csm;
            }
            (_, None) => {
                row.opening_csm = 0.0;
                row.opening_ra = 0.0;
                row.opening_ri_csm = 0.0;
            }
        }
    }
}

/// Coverage units remaining from each month to maturity
pub fn accumulate_coverage_units(rows: &mut [ProjectionRow], model_point: &ModelPoint) {
    let term_months = model_point.term_months();
    let mut gross = 0.0;
    let mut reinsured = 0.0;

    for row in rows.iter_mut().rev() {
        if row.month >= 1 && row.month <= term_months {
            gross += model_point.sum_assured * model_point.weight * row.no_p_bop;
            reinsured += row.ri_sum_at_risk;
        }
        row.coverage_units = gross;
        row.ri_coverage_units = reinsured;
    }
}

/// Share of remaining coverage provided in the month
pub(crate) fn release_pattern(current_units: f64, next_units: f64) -> f64 {
    if current_units > 0.0 {
        1.0 - next_units / current_units
    } else {
        0.0
    }
}

fn apply_release(row: &mut ProjectionRow) {
    row.csm_release = (row.csm_release_pattern * (row.opening_csm + row.csm_variable_fee)).max(0.0);
    row.closing_csm = row.opening_csm + row.csm_variable_fee - row.csm_release;

    row.ra_release = row.csm_release_pattern * row.opening_ra;
    row.closing_ra = row.opening_ra - row.ra_release;

    row.ri_csm_release = row.ri_release_pattern * row.opening_ri_csm;
    row.closing_ri_csm = row.opening_ri_csm - row.ri_csm_release;
}

/// Release patterns and CSM/RA release against the openings set so far
pub fn release_base_margins(rows: &mut [ProjectionRow]) {
    for i in 0..rows.len() {
        let (head, tail) = rows.split_at_mut(i + 1);
        let row = &mut head[i];
        let (next_units, next_ri_units) = tail
            .first()
            .map_or((0.0, 0.0), |n| (n.coverage_units, n.ri_coverage_units));

        row.csm_release_pattern = release_pattern(row.coverage_units, next_units);
        row.ri_release_pattern = release_pattern(row.ri_coverage_units, next_ri_units);
        apply_release(row);
    }
}

/// Re-derive every opening balance from the previous row's closing balance,
/// in row order, and recompute release and closing amounts
pub fn correct_opening_balances(rows: &mut [ProjectionRow]) {
    for i in 2..rows.len() {
        let (done, rest) = rows.split_at_mut(i);
        let prev = &done[i - 1];
        let row = &mut rest[0];

        row.opening_csm = prev.closing_csm;
        row.opening_ra = prev.closing_ra;
        row.opening_ri_csm = prev.closing_ri_csm;
        apply_release(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::RateTable;
    use crate::policy::{DeathBenefitOption, Sex, Smoker};
    use approx::assert_relative_eq;

    fn model_point() -> ModelPoint {
        ModelPoint {
            id: 1,
            age: 40,
            sex: Sex::Male,
            smoker: Smoker::NonSmoker,
            policy_term: 10,
            premium_term: 5,
            annual_premium: 12_000.0,
            sum_assured: 100_000.0,
            death_benefit: DeathBenefitOption::MaxOfSumAssuredAndFundValue,
            weight: 2.0,
        }
    }

    fn assumptions() -> AssumptionSet {
        let mut mortality = RateTable::default();
        let mut coi = RateTable::default();
        let mut reinsurance = RateTable::default();
        for age in 30..80 {
            let q = 0.0005 + 0.0001 * f64::from(age - 30);
            mortality.insert(&[age.to_string(), "M".to_string()], q);
            coi.insert(
                &[
                    age.to_string(),
                    "M".to_string(),
                    "NS".to_string(),
                    "UL".to_string(),
                ],
                q * 1.2,
            );
            reinsurance.insert(&[age.to_string(), "M".to_string(), "NS".to_string()], q * 1.1);
        }
        let mut allocation = RateTable::default();
        allocation.insert(&["1", "5"], 40.0);
        allocation.insert(&["2", "5"], 90.0);

        AssumptionSet {
            lapse: RateTable::from_pairs((1..=10).map(|py| (py, 0.08))),
            surrender_charge_percent: RateTable::from_pairs([(1, 20.0), (2, 10.0)]),
            surrender_charge_fixed: RateTable::from_pairs([(1, 50.0)]),
            commission: serde_json::from_str(r#"{"1": {"5": 30.0}, "2": {"5": 10.0}}"#).unwrap(),
            allocation,
            loyalty_bonus: RateTable::from_pairs([(6, 1.5)]),
            mortality,
            coi,
            reinsurance,
            investment_income_rate: 0.05,
            fund_management_charge: 0.015,
            fund_expense_rate: 0.002,
            admin_fee: 5.0,
            reinsurance_quota_share: 0.5,
            ..Default::default()
        }
    }

    fn run() -> Vec<ProjectionRow> {
        let mp = model_point();
        let a = assumptions();
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
        rows
    }

    #[test]
    fn test_count_conservation() {
        let rows = run();
        for row in &rows {
            assert_relative_eq!(
                row.no_p_eop,
                row.no_p_bop - row.no_deaths - row.no_surrenders - row.no_maturities,
                epsilon = 1e-12
            );
        }
        for pair in rows[1..].windows(2) {
            assert_relative_eq!(
                pair[1].no_p_bop,
                pair[0].no_p_eop - pair[0].no_maturities,
                epsilon = 1e-12
            );
        }
        assert_eq!(rows[1].no_p_bop, 1.0);
    }

    #[test]
    fn test_terminal_decrement() {
        let rows = run();
        let last = rows.last().unwrap();
        assert_eq!(last.month, 121);
        assert_relative_eq!(last.no_maturities, rows[120].no_p_eop, epsilon = 1e-12);
        assert_relative_eq!(last.no_p_eop, 0.0, epsilon = 1e-12);
        assert_eq!(last.unit_fund_inforce, 0.0);
        assert!(rows.iter().filter(|r| r.month > 60).all(|r| r.premium_income == 0.0));
        assert!(rows
            .iter()
            .filter(|r| (1..=60).contains(&r.month))
            .all(|r| r.premium_income > 0.0));
    }

    #[test]
    fn test_allocation_charge_uses_snapped_term_and_stops_after_premium_term() {
        let rows = run();
        assert_eq!(rows[1].allocation_charge_pct, 60.0);
        assert_eq!(rows[13].allocation_charge_pct, 10.0);
        // Year 3 has no allocation entry: full allocation
        assert_eq!(rows[25].allocation_charge_pct, 0.0);
        assert_eq!(rows[61].allocation_charge_pct, 0.0);
        assert_eq!(rows[1].commission_pct, 30.0);
    }

    #[test]
    fn test_loyalty_bonus_once_per_policy_year() {
        let rows = run();
        let bonus_months: Vec<u32> = rows
            .iter()
            .filter(|r| r.loyalty_bonus_rate > 0.0)
            .map(|r| r.month)
            .collect();
        assert_eq!(bonus_months, vec![61]);
        assert!(rows[61].loyalty_bonus > 0.0);
    }

    #[test]
    fn test_non_negative_funds() {
        let rows = run();
        for row in &rows {
            assert!(row.unit_fund_bod >= 0.0);
            assert!(row.unit_fund_after_deduction >= 0.0);
            assert!(row.unit_fund_inforce >= 0.0);
            assert!(row.fund_value_per_policy >= 0.0);
            assert!(row.csm_release >= 0.0);
            assert!(row.surrender_charge >= 0.0);
        }
    }

    #[test]
    fn test_surrender_charge_capped_at_surrendering_share() {
        let mp = ModelPoint {
            annual_premium: 1_200.0,
            ..model_point()
        };
        let a = AssumptionSet {
            lapse: RateTable::from_pairs([(1, 0.5)]),
            surrender_charge_fixed: RateTable::from_pairs([(1, 500.0)]),
            investment_income_rate: 0.05,
            ..Default::default()
        };
        let mut rows: Vec<ProjectionRow> = (0..mp.row_count() as u32)
            .map(|m| ProjectionRow::new(mp.id, m, String::new(), 2025))
            .collect();
        project_decrements_and_fund(&mut rows, &mp, &a);

        // Per-policy fund stays below the fixed charge for the first quarter
        for row in &rows[1..=3] {
            let net_fund = row.pre_growth_fund + row.investment_income - row.fmc_amount;
            let surrendering = net_fund * row.no_surrenders / row.no_p_bop;
            let staying = net_fund * row.no_p_eop / row.no_p_bop;
            assert_relative_eq!(row.surrender_charge, surrendering, max_relative = 1e-12);
            assert_eq!(row.surrender_outgo, 0.0);
            assert_relative_eq!(row.unit_fund_inforce, staying, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_reserve_boundaries_and_recursion() {
        let rows = run();
        assert_eq!(rows[0].non_unit_reserve, 0.0);
        assert_eq!(rows[0].ri_reserve, 0.0);
        assert_eq!(rows[121].non_unit_reserve, 0.0);
        assert_eq!(rows[121].ri_reserve, 0.0);

        for i in 1..=120 {
            let next = &rows[i + 1];
            let expected = (next.non_unit_reserve - next.non_unit_cashflow)
                / (1.0 + next.monthly_interest_rate);
            assert_relative_eq!(
                rows[i].non_unit_reserve,
                expected,
                max_relative = 1e-9,
                epsilon = 1e-9
            );
            let expected_ri =
                (next.ri_reserve + next.ri_net_cost) / (1.0 + next.monthly_interest_rate);
            assert_relative_eq!(
                rows[i].ri_reserve,
                expected_ri,
                max_relative = 1e-9,
                epsilon = 1e-9
            );
        }

        assert_eq!(rows[0].pv_premium, 0.0);
        assert_eq!(rows[121].pv_premium, 0.0);
        assert!(rows[1].pv_premium > 0.0);
    }

    #[test]
    fn test_ri_premium_annual() {
        let rows = run();
        let charged: Vec<u32> = rows
            .iter()
            .filter(|r| r.ri_premium > 0.0)
            .map(|r| r.month)
            .collect();
        assert_eq!(charged, (0..10u32).map(|y| y * 12 + 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_ifrs_seed_and_bel() {
        let rows = run();
        let first = &rows[1];
        let seed = (first.non_unit_reserve - first.non_unit_cashflow)
            / (1.0 + first.monthly_interest_rate);
        assert_relative_eq!(rows[0].ifrs_non_unit_reserve, seed, epsilon = 1e-9);
        for row in &rows {
            assert_relative_eq!(
                row.bel,
                row.ifrs_non_unit_reserve + row.unit_fund_inforce,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                row.risk_adjustment,
                0.022 * (row.bel + row.pv_premium),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_coverage_units_and_patterns() {
        let rows = run();
        assert_eq!(rows[121].coverage_units, 0.0);
        assert!(rows[1].coverage_units > rows[2].coverage_units);
        assert_relative_eq!(rows[120].csm_release_pattern, 1.0, epsilon = 1e-12);
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.csm_release_pattern));
        }
    }

    #[test]
    fn test_openings_follow_prior_closings() {
        let rows = run();
        assert_relative_eq!(
            rows[1].opening_csm,
            -(rows[0].bel + rows[0].risk_adjustment),
            epsilon = 1e-9
        );
        for pair in rows[1..].windows(2) {
            assert_eq!(pair[1].opening_csm, pair[0].closing_csm);
            assert_eq!(pair[1].opening_ra, pair[0].closing_ra);
            assert_eq!(pair[1].opening_ri_csm, pair[0].closing_ri_csm);
            assert_relative_eq!(
                pair[1].closing_csm,
                pair[1].opening_csm + pair[1].csm_variable_fee - pair[1].csm_release,
                epsilon = 1e-9
            );
        }
    }
}
