//! Month-indexed projection state for one model point

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One (model point, month) row.
///
/// Every field is declared up front and starts at zero; the passes fill them
/// in dependency order. Money amounts are totals for the model point
/// (scaled by weight and in-force count) unless the name says per policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    // Timing
    pub model_point_id: u32,
    pub month: u32,
    pub policy_year: u32,
    pub attained_age: u32,
    #[serde(rename = "ValuationDate")]
    pub valuation_date: String,
    #[serde(rename = "Year")]
    pub year: i32,

    // Rates
    pub loyalty_bonus_rate: f64,
    pub surrender_charge_fixed: f64,
    pub surrender_charge_pct: f64,
    pub commission_pct: f64,
    pub allocation_charge_pct: f64,
    pub monthly_interest_rate: f64,
    pub monthly_fmc_rate: f64,
    pub mortality_rate: f64,
    pub lapse_rate: f64,
    pub coi_rate: f64,

    // Policy counts (per unit of weight)
    #[serde(rename = "noPBoP")]
    pub no_p_bop: f64,
    #[serde(rename = "noDeaths")]
    pub no_deaths: f64,
    #[serde(rename = "noSurrenders")]
    pub no_surrenders: f64,
    #[serde(rename = "noMaturities")]
    pub no_maturities: f64,
    #[serde(rename = "noPEoP")]
    pub no_p_eop: f64,

    // Fund mechanics
    pub premium_per_policy: f64,
    pub premium_income: f64,
    pub allocation_charge: f64,
    pub allocated_premium: f64,
    pub unit_fund_bod: f64,
    pub admin_charge: f64,
    pub sum_at_risk: f64,
    pub decremented_sum_at_risk: f64,
    pub coi_charge: f64,
    pub unit_fund_after_deduction: f64,
    pub loyalty_bonus: f64,
    pub pre_growth_fund: f64,
    pub investment_income: f64,
    pub fmc_amount: f64,
    pub surrender_charge: f64,
    pub death_unit_outgo: f64,
    pub surrender_outgo: f64,
    pub maturity_outgo: f64,
    pub unit_fund_inforce: f64,
    pub fund_value_per_policy: f64,

    // Claims, expenses and reinsurance
    pub death_benefit_per_policy: f64,
    pub death_outgo: f64,
    pub non_unit_death_claim: f64,
    pub commission: f64,
    pub investment_expense: f64,
    pub ri_sum_at_risk: f64,
    pub ri_premium: f64,
    pub ri_recovery: f64,
    pub non_unit_cashflow: f64,
    pub ri_net_cost: f64,

    // Reserves
    pub non_unit_reserve: f64,
    pub ri_reserve: f64,
    pub pv_premium: f64,
    pub pv_ri_recovery: f64,
    pub delta_unit_fund: f64,
    pub delta_non_unit_reserve: f64,
    pub delta_ri_reserve: f64,
    pub interest_on_non_unit_reserve: f64,
    pub interest_on_ri_reserve: f64,
    pub ifrs_non_unit_reserve: f64,
    pub ifrs_ri_reserve: f64,

    // Base IFRS17 measurement
    pub bel: f64,
    pub risk_adjustment: f64,
    pub ri_risk_adjustment: f64,
    pub csm_variable_fee: f64,
    pub coverage_units: f64,
    pub ri_coverage_units: f64,
    pub csm_release_pattern: f64,
    pub ri_release_pattern: f64,
    pub opening_csm: f64,
    pub csm_release: f64,
    pub closing_csm: f64,
    pub opening_ra: f64,
    pub ra_release: f64,
    pub closing_ra: f64,
    pub opening_ri_csm: f64,
    pub ri_csm_release: f64,
    pub closing_ri_csm: f64,

    /// Cohort-scoped state keyed by cohort year; flattened on output
    #[serde(skip)]
    pub cohorts: BTreeMap<String, CohortMetrics>,
}

impl ProjectionRow {
    pub fn new(model_point_id: u32, month: u32, valuation_date: String, year: i32) -> Self {
        Self {
            model_point_id,
            month,
            valuation_date,
            year,
            ..Default::default()
        }
    }

    /// Numeric columns in output order, named as in the serialized row
    pub fn numeric_columns(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("modelPointId", f64::from(self.model_point_id)),
            ("month", f64::from(self.month)),
            ("policyYear", f64::from(self.policy_year)),
            ("attainedAge", f64::from(self.attained_age)),
            ("Year", f64::from(self.year)),
            ("loyaltyBonusRate", self.loyalty_bonus_rate),
            ("surrenderChargeFixed", self.surrender_charge_fixed),
            ("surrenderChargePct", self.surrender_charge_pct),
            ("commissionPct", self.commission_pct),
            ("allocationChargePct", self.allocation_charge_pct),
            ("monthlyInterestRate", self.monthly_interest_rate),
            ("monthlyFmcRate", self.monthly_fmc_rate),
            ("mortalityRate", self.mortality_rate),
            ("lapseRate", self.lapse_rate),
            ("coiRate", self.coi_rate),
            ("noPBoP", self.no_p_bop),
            ("noDeaths", self.no_deaths),
            ("noSurrenders", self.no_surrenders),
            ("noMaturities", self.no_maturities),
            ("noPEoP", self.no_p_eop),
            ("premiumPerPolicy", self.premium_per_policy),
            ("premiumIncome", self.premium_income),
            ("allocationCharge", self.allocation_charge),
            ("allocatedPremium", self.allocated_premium),
            ("unitFundBod", self.unit_fund_bod),
            ("adminCharge", self.admin_charge),
            ("sumAtRisk", self.sum_at_risk),
            ("decrementedSumAtRisk", self.decremented_sum_at_risk),
            ("coiCharge", self.coi_charge),
            ("unitFundAfterDeduction", self.unit_fund_after_deduction),
            ("loyaltyBonus", self.loyalty_bonus),
            ("preGrowthFund", self.pre_growth_fund),
            ("investmentIncome", self.investment_income),
            ("fmcAmount", self.fmc_amount),
            ("surrenderCharge", self.surrender_charge),
            ("deathUnitOutgo", self.death_unit_outgo),
            ("surrenderOutgo", self.surrender_outgo),
            ("maturityOutgo", self.maturity_outgo),
            ("unitFundInforce", self.unit_fund_inforce),
            ("fundValuePerPolicy", self.fund_value_per_policy),
            ("deathBenefitPerPolicy", self.death_benefit_per_policy),
            ("deathOutgo", self.death_outgo),
            ("nonUnitDeathClaim", self.non_unit_death_claim),
            ("commission", self.commission),
            ("investmentExpense", self.investment_expense),
            ("riSumAtRisk", self.ri_sum_at_risk),
            ("riPremium", self.ri_premium),
            ("riRecovery", self.ri_recovery),
            ("nonUnitCashflow", self.non_unit_cashflow),
            ("riNetCost", self.ri_net_cost),
            ("nonUnitReserve", self.non_unit_reserve),
            ("riReserve", self.ri_reserve),
            ("pvPremium", self.pv_premium),
            ("pvRiRecovery", self.pv_ri_recovery),
            ("deltaUnitFund", self.delta_unit_fund),
            ("deltaNonUnitReserve", self.delta_non_unit_reserve),
            ("deltaRiReserve", self.delta_ri_reserve),
            ("interestOnNonUnitReserve", self.interest_on_non_unit_reserve),
            ("interestOnRiReserve", self.interest_on_ri_reserve),
            ("ifrsNonUnitReserve", self.ifrs_non_unit_reserve),
            ("ifrsRiReserve", self.ifrs_ri_reserve),
            ("bel", self.bel),
            ("riskAdjustment", self.risk_adjustment),
            ("riRiskAdjustment", self.ri_risk_adjustment),
            ("csmVariableFee", self.csm_variable_fee),
            ("coverageUnits", self.coverage_units),
            ("riCoverageUnits", self.ri_coverage_units),
            ("csmReleasePattern", self.csm_release_pattern),
            ("riReleasePattern", self.ri_release_pattern),
            ("openingCsm", self.opening_csm),
            ("csmRelease", self.csm_release),
            ("closingCsm", self.closing_csm),
            ("openingRa", self.opening_ra),
            ("raRelease", self.ra_release),
            ("closingRa", self.closing_ra),
            ("openingRiCsm", self.opening_ri_csm),
            ("riCsmRelease", self.ri_csm_release),
            ("closingRiCsm", self.closing_ri_csm),
        ]
    }

    /// Total outgo paid out of the unit and non-unit funds in the month
    pub fn benefit_and_expense_outgo(&self) -> f64 {
        self.death_outgo
            + self.surrender_outgo
            + self.maturity_outgo
            + self.commission
            + self.investment_expense
    }
}

/// Reserve and margin state for one cohort year on one row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMetrics {
    pub financial_year: i32,
    pub maintenance_rate: f64,
    pub vendor_fee_rate: f64,

    pub initial_expense: f64,
    pub renewal_expense: f64,
    pub vendor_commission: f64,
    pub vendor_fixed_fee: f64,
    pub net_cashflow: f64,

    pub non_unit_reserve: f64,
    pub ifrs17_non_unit_reserve: f64,
    pub delta_non_unit_reserve: f64,
    pub interest_on_non_unit_reserve: f64,
    pub profit: f64,

    pub bel: f64,
    pub risk_adjustment: f64,
    pub variable_fee: f64,

    pub opening_ra: f64,
    pub ra_release: f64,
    pub closing_ra: f64,

    pub opening_csm: f64,
    pub csm_release: f64,
    pub closing_csm: f64,
    pub opening_loss_component: f64,
    pub loss_component_release: f64,
    pub closing_loss_component: f64,
    /// Signed closing margin: CSM when positive, loss component when negative
    pub net_csm: f64,
}

impl CohortMetrics {
    /// Expenses charged to the cohort in the month
    pub fn cohort_expenses(&self) -> f64 {
        self.initial_expense + self.renewal_expense + self.vendor_commission + self.vendor_fixed_fee
    }

    /// Metric names and values in output order
    pub fn columns(&self) -> [(&'static str, f64); 26] {
        [
            ("financialYear", f64::from(self.financial_year)),
            ("maintenanceRate", self.maintenance_rate),
            ("vendorFeeRate", self.vendor_fee_rate),
            ("initialExpense", self.initial_expense),
            ("renewalExpense", self.renewal_expense),
            ("vendorCommission", self.vendor_commission),
            ("vendorFixedFee", self.vendor_fixed_fee),
            ("netCashflow", self.net_cashflow),
            ("nonUnitReserve", self.non_unit_reserve),
            ("ifrs17NonUnitReserve", self.ifrs17_non_unit_reserve),
            ("deltaNonUnitReserve", self.delta_non_unit_reserve),
            ("interestOnNonUnitReserve", self.interest_on_non_unit_reserve),
            ("profit", self.profit),
            ("bel", self.bel),
            ("riskAdjustment", self.risk_adjustment),
            ("variableFee", self.variable_fee),
            ("openingRa", self.opening_ra),
            ("raRelease", self.ra_release),
            ("closingRa", self.closing_ra),
            ("openingCsm", self.opening_csm),
            ("csmRelease", self.csm_release),
            ("closingCsm", self.closing_csm),
            ("openingLossComponent", self.opening_loss_component),
            ("lossComponentRelease", self.loss_component_release),
            ("closingLossComponent", self.closing_loss_component),
            ("netCsm", self.net_csm),
        ]
    }

    /// Metric names in output order
    pub fn column_names() -> Vec<&'static str> {
        CohortMetrics::default().columns().iter().map(|(name, _)| *name).collect()
    }
}

/// Flat column name for a cohort metric: `<metric>_<cohortYear>`
pub fn cohort_column(metric: &str, cohort_year: &str) -> String {
    format!("{}_{}", metric, cohort_year)
}
