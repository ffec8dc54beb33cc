//! IFRS17 margin view: CSM, RA, loss component and insurance service result

use serde::Serialize;

use super::{sum_series, FinancialYearFilter, Scope};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ifrs17Summary {
    pub financial_years: Vec<i32>,
    pub csm_release: Vec<f64>,
    pub ra_release: Vec<f64>,
    pub loss_component_release: Vec<f64>,
    pub closing_csm: Vec<f64>,
    pub closing_loss_component: Vec<f64>,
    pub closing_risk_adjustment: Vec<f64>,
    pub bel: Vec<f64>,
    /// Expected claims and expenses plus CSM and RA release
    pub insurance_revenue: Vec<f64>,
    /// Non-unit claims and cohort expenses incurred
    pub insurance_service_expense: Vec<f64>,
    pub insurance_service_result: Vec<f64>,
}

pub fn ifrs17_summary(filter: &FinancialYearFilter<'_>) -> Ifrs17Summary {
    let flow = |name| filter.flow(Scope::Cohort(name));
    let stock = |name| filter.stock(Scope::Cohort(name));

    let csm_release = flow("csmRelease");
    let ra_release = flow("raRelease");
    let service_expense = sum_series(&[
        filter.flow(Scope::Base("nonUnitDeathClaim")),
        flow("initialExpense"),
        flow("renewalExpense"),
        flow("vendorCommission"),
        flow("vendorFixedFee"),
    ]);
    let insurance_revenue = sum_series(&[
        service_expense.clone(),
        csm_release.clone(),
        ra_release.clone(),
    ]);
    let insurance_service_result = insurance_revenue
        .iter()
        .zip(&service_expense)
        .map(|(revenue, expense)| revenue - expense)
        .collect();

    Ifrs17Summary {
        financial_years: filter.financial_years(),
        loss_component_release: flow("lossComponentRelease"),
        closing_csm: stock("closingCsm"),
        closing_loss_component: stock("closingLossComponent"),
        closing_risk_adjustment: stock("closingRa"),
        bel: stock("bel"),
        csm_release,
        ra_release,
        insurance_revenue,
        insurance_service_expense: service_expense,
        insurance_service_result,
    }
}
