//! Actuarial assumptions: decrement, charge and commission tables plus the
//! new-business plan that drives cohort expense allocation

mod tables;
mod business;
pub mod loader;

pub use tables::RateTable;
pub use business::{BusinessPlan, CohortPlan, CohortYears, COHORT_COUNT, FINANCIAL_YEARS};

use serde::{Deserialize, Serialize};

use crate::policy::{Sex, Smoker};

fn default_risk_adjustment_pct() -> f64 {
    0.022
}

fn default_one() -> f64 {
    1.0
}

fn default_expense_escalation() -> f64 {
    0.05
}

fn default_product() -> String {
    "UL".to_string()
}

/// Read-only assumption bundle for one engine run.
///
/// Percentages stored in tables (commission, allocation, surrender percent,
/// loyalty bonus, vendor commission) are in percent; scalar rates are
/// decimals. Every table accessor resolves a missing entry to 0 unless its
/// doc says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionSet {
    /// Annual lapse rate by policy year
    #[serde(default)]
    pub lapse: RateTable,

    /// Fixed surrender charge per policy by policy year
    #[serde(default)]
    pub surrender_charge_fixed: RateTable,

    /// Surrender charge percent of fund by policy year
    #[serde(default)]
    pub surrender_charge_percent: RateTable,

    /// Commission percent of premium by policy year, then premium term
    #[serde(default)]
    pub commission: RateTable,

    /// Allocation rate percent of premium by policy year, then premium term
    #[serde(default)]
    pub allocation: RateTable,

    /// Loyalty bonus percent of fund by policy year
    #[serde(default)]
    pub loyalty_bonus: RateTable,

    /// Annual mortality rate by attained age, then sex
    #[serde(default)]
    pub mortality: RateTable,

    /// Annual cost-of-insurance rate by attained age, sex, smoker status, product
    #[serde(default)]
    pub coi: RateTable,

    /// Annual reinsurance rate by attained age, sex, smoker status
    #[serde(default)]
    pub reinsurance: RateTable,

    /// Vendor commission percent of premium by policy year
    #[serde(default)]
    pub vendor_commission: RateTable,

    /// Multiplier applied to table mortality before monthly conversion
    #[serde(default = "default_one")]
    pub mortality_multiplier: f64,

    /// Product code used as the last COI key
    #[serde(default = "default_product")]
    pub product: String,

    /// Flat annual investment income rate (also the discount rate)
    #[serde(default)]
    pub investment_income_rate: f64,

    /// Annual fund management charge
    #[serde(default)]
    pub fund_management_charge: f64,

    /// Annual investment expense rate on the in-force fund
    #[serde(default)]
    pub fund_expense_rate: f64,

    /// Monthly administration fee per policy
    #[serde(default)]
    pub admin_fee: f64,

    /// Share of sum at risk ceded to the reinsurer
    #[serde(default)]
    pub reinsurance_quota_share: f64,

    /// Risk adjustment as a share of (BEL + PV premium)
    #[serde(default = "default_risk_adjustment_pct")]
    pub risk_adjustment_pct: f64,

    /// Annual escalation of allocated expenses beyond the planned years
    #[serde(default = "default_expense_escalation")]
    pub expense_escalation: f64,

    /// New-business plan by cohort year
    #[serde(default)]
    pub business_plan: BusinessPlan,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            lapse: RateTable::default(),
            surrender_charge_fixed: RateTable::default(),
            surrender_charge_percent: RateTable::default(),
            commission: RateTable::default(),
            allocation: RateTable::default(),
            loyalty_bonus: RateTable::default(),
            mortality: RateTable::default(),
            coi: RateTable::default(),
            reinsurance: RateTable::default(),
            vendor_commission: RateTable::default(),
            mortality_multiplier: default_one(),
            product: default_product(),
            investment_income_rate: 0.0,
            fund_management_charge: 0.0,
            fund_expense_rate: 0.0,
            admin_fee: 0.0,
            reinsurance_quota_share: 0.0,
            risk_adjustment_pct: default_risk_adjustment_pct(),
            expense_escalation: default_expense_escalation(),
            business_plan: BusinessPlan::default(),
        }
    }
}

impl AssumptionSet {
    pub fn annual_lapse_rate(&self, policy_year: u32) -> f64 {
        self.lapse.lookup(&[policy_year.to_string()]).unwrap_or(0.0)
    }

    pub fn surrender_charge_fixed(&self, policy_year: u32) -> f64 {
        self.surrender_charge_fixed
            .lookup(&[policy_year.to_string()])
            .unwrap_or(0.0)
    }

    /// Surrender charge percent as a fraction of fund
    pub fn surrender_charge_fraction(&self, policy_year: u32) -> f64 {
        self.surrender_charge_percent
            .lookup(&[policy_year.to_string()])
            .unwrap_or(0.0)
            / 100.0
    }

    /// Commission percent; `term` must already be snapped to a valid premium term
    pub fn commission_pct(&self, policy_year: u32, term: u32) -> f64 {
        self.commission
            .lookup(&[policy_year.to_string(), term.to_string()])
            .unwrap_or(0.0)
    }

    /// Allocation charge percent = 100 - allocation rate.
    ///
    /// A missing allocation entry means no charge (full allocation), so a
    /// sparse table never swallows the whole premium.
    pub fn allocation_charge_pct(&self, policy_year: u32, term: u32) -> f64 {
        self.allocation
            .lookup(&[policy_year.to_string(), term.to_string()])
            .map(|allocation| 100.0 - allocation)
            .unwrap_or(0.0)
    }

    /// Loyalty bonus as a fraction of fund
    pub fn loyalty_bonus_fraction(&self, policy_year: u32) -> f64 {
        self.loyalty_bonus
            .lookup(&[policy_year.to_string()])
            .unwrap_or(0.0)
            / 100.0
    }

    pub fn annual_mortality_rate(&self, attained_age: u32, sex: Sex) -> f64 {
        self.mortality
            .lookup(&[attained_age.to_string(), sex.code().to_string()])
            .unwrap_or(0.0)
    }

    pub fn coi_rate(&self, attained_age: u32, sex: Sex, smoker: Smoker) -> f64 {
        self.coi
            .lookup(&[
                attained_age.to_string(),
                sex.code().to_string(),
                smoker.code().to_string(),
                self.product.clone(),
            ])
            .unwrap_or(0.0)
    }

    pub fn reinsurance_rate(&self, attained_age: u32, sex: Sex, smoker: Smoker) -> f64 {
        self.reinsurance
            .lookup(&[
                attained_age.to_string(),
                sex.code().to_string(),
                smoker.code().to_string(),
            ])
            .unwrap_or(0.0)
    }

    /// Vendor commission as a fraction of premium
    pub fn vendor_commission_fraction(&self, policy_year: u32) -> f64 {
        self.vendor_commission
            .lookup(&[policy_year.to_string()])
            .unwrap_or(0.0)
            / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssumptionSet {
        serde_json::from_str(
            r#"{
                "lapse": {"1": 0.05, "2": 0.08},
                "surrenderChargePercent": {"1": 10.0},
                "commission": {"1": {"1": 3.0, "5": 25.0}},
                "allocation": {"1": {"5": 40.0}, "2": {"5": 95.0}},
                "loyaltyBonus": {"5": 2.0},
                "mortality": {"30": {"M": 0.0011, "F": 0.0006}},
                "coi": {"30": {"M": {"NS": {"UL": 0.0015}}}},
                "reinsurance": {"30": {"M": {"NS": 0.0009}}},
                "investmentIncomeRate": 0.05
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_from_json() {
        let a = sample();
        assert_eq!(a.risk_adjustment_pct, 0.022);
        assert_eq!(a.mortality_multiplier, 1.0);
        assert_eq!(a.product, "UL");
        assert_eq!(a.expense_escalation, 0.05);
    }

    #[test]
    fn test_table_accessors() {
        let a = sample();
        assert_eq!(a.annual_lapse_rate(2), 0.08);
        assert_eq!(a.annual_lapse_rate(9), 0.0);
        assert_eq!(a.surrender_charge_fraction(1), 0.10);
        assert_eq!(a.commission_pct(1, 5), 25.0);
        assert_eq!(a.commission_pct(1, 10), 0.0);
        assert_eq!(a.allocation_charge_pct(1, 5), 60.0);
        assert_eq!(a.allocation_charge_pct(3, 5), 0.0);
        assert_eq!(a.loyalty_bonus_fraction(5), 0.02);
        assert_eq!(a.annual_mortality_rate(30, Sex::Female), 0.0006);
        assert_eq!(a.coi_rate(30, Sex::Male, Smoker::NonSmoker), 0.0015);
        assert_eq!(a.coi_rate(30, Sex::Male, Smoker::Smoker), 0.0);
        assert_eq!(a.reinsurance_rate(30, Sex::Male, Smoker::NonSmoker), 0.0009);
    }
}
