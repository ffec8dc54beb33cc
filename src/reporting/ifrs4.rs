//! IFRS4 (local statutory) profit view

use serde::Serialize;

use super::{sum_series, FinancialYearFilter, Scope};
use crate::projection::irr::{calculate_irr, npv};

/// Per financial year statutory revenue account with profit measures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ifrs4Summary {
    pub financial_years: Vec<i32>,
    pub premium: Vec<f64>,
    pub investment_income: Vec<f64>,
    /// Death, surrender and maturity outgo
    pub claims: Vec<f64>,
    pub commission: Vec<f64>,
    /// Cohort expenses plus investment expense
    pub expenses: Vec<f64>,
    pub reinsurance_net_cost: Vec<f64>,
    /// Increase in unit fund and non-unit reserve
    pub change_in_reserves: Vec<f64>,
    pub profit: Vec<f64>,
    /// Profit discounted at the risk discount rate
    pub npv: f64,
    pub irr: Option<f64>,
}

pub fn ifrs4_summary(filter: &FinancialYearFilter<'_>, risk_discount_rate: f64) -> Ifrs4Summary {
    let base = |name| filter.flow(Scope::Base(name));
    let cohort = |name| filter.flow(Scope::Cohort(name));

    let premium = base("premiumIncome");
    let investment_income = sum_series(&[
        base("investmentIncome"),
        cohort("interestOnNonUnitReserve"),
    ]);
    let claims = sum_series(&[
        base("deathOutgo"),
        base("surrenderOutgo"),
        base("maturityOutgo"),
    ]);
    let commission = base("commission");
    let expenses = sum_series(&[
        base("investmentExpense"),
        cohort("initialExpense"),
        cohort("renewalExpense"),
        cohort("vendorCommission"),
        cohort("vendorFixedFee"),
    ]);
    let reinsurance_net_cost = base("riNetCost");
    let change_in_reserves = sum_series(&[
        base("deltaUnitFund"),
        cohort("deltaNonUnitReserve"),
    ]);

    let profit: Vec<f64> = (0..premium.len())
        .map(|k| {
            premium[k] + investment_income[k]
                - claims[k]
                - commission[k]
                - expenses[k]
                - reinsurance_net_cost[k]
                - change_in_reserves[k]
        })
        .collect();

    Ifrs4Summary {
        financial_years: filter.financial_years(),
        npv: npv(&profit, risk_discount_rate),
        irr: calculate_irr(&profit, 1),
        premium,
        investment_income,
        claims,
        commission,
        expenses,
        reinsurance_net_cost,
        change_in_reserves,
        profit,
    }
}
