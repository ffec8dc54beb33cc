//! Model point data structures matching the model-point grid format

use serde::{Deserialize, Serialize};

/// Sex key used by mortality, COI and reinsurance tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    #[serde(rename = "M", alias = "Male")]
    Male,
    #[serde(rename = "F", alias = "Female")]
    Female,
}

impl Sex {
    /// Table key
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

/// Smoker key used by COI and reinsurance tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Smoker {
    #[default]
    #[serde(rename = "NS", alias = "NonSmoker")]
    NonSmoker,
    #[serde(rename = "S", alias = "Smoker")]
    Smoker,
}

impl Smoker {
    pub fn code(&self) -> &'static str {
        match self {
            Smoker::NonSmoker => "NS",
            Smoker::Smoker => "S",
        }
    }
}

/// Death benefit design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathBenefitOption {
    /// Sum assured paid on top of the fund value
    #[serde(rename = "Sum Assured + Fund Value", alias = "SumAssuredPlusFundValue")]
    SumAssuredPlusFundValue,
    /// Greater of sum assured and fund value
    #[serde(rename = "Max(Sum Assured, Fund Value)", alias = "MaxOfSumAssuredAndFundValue")]
    MaxOfSumAssuredAndFundValue,
}

impl DeathBenefitOption {
    /// Per-policy sum at risk given the fund value it is netted against
    pub fn sum_at_risk(&self, sum_assured: f64, fund_value: f64) -> f64 {
        match self {
            DeathBenefitOption::SumAssuredPlusFundValue => sum_assured,
            DeathBenefitOption::MaxOfSumAssuredAndFundValue => (sum_assured - fund_value).max(0.0),
        }
    }
}

/// A single model point: one representative policy scaled by `weight`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPoint {
    /// Model point identifier
    #[serde(default)]
    pub id: u32,

    /// Age at entry
    pub age: u32,

    #[serde(default)]
    pub sex: Sex,

    #[serde(default)]
    pub smoker: Smoker,

    /// Policy term in years
    pub policy_term: u32,

    /// Premium payment term in years (1 = single premium)
    pub premium_term: u32,

    pub annual_premium: f64,

    pub sum_assured: f64,

    pub death_benefit: DeathBenefitOption,

    /// Policy-count proxy scaling every money amount
    pub weight: f64,
}

impl ModelPoint {
    /// Last month of cover (`policy_term * 12`)
    pub fn term_months(&self) -> u32 {
        self.policy_term * 12
    }

    /// Month in which the remaining policies mature (`policy_term * 12 + 1`)
    pub fn maturity_month(&self) -> u32 {
        self.term_months() + 1
    }

    /// Number of projection rows (months 0 through the maturity month)
    pub fn row_count(&self) -> usize {
        self.maturity_month() as usize + 1
    }

    /// Policy year at a projection month; month 0 is policy year 0
    pub fn policy_year(&self, month: u32) -> u32 {
        if month == 0 {
            0
        } else {
            (month - 1) / 12 + 1
        }
    }

    /// Attained age; increments at the start of each policy year after the first
    pub fn attained_age(&self, month: u32) -> u32 {
        self.age + self.policy_year(month).saturating_sub(1)
    }

    /// Contractual premium per policy due in a month, before decrements
    pub fn premium_due(&self, month: u32) -> f64 {
        if month == 0 {
            0.0
        } else if self.premium_term == 1 {
            if month == 1 {
                self.annual_premium
            } else {
                0.0
            }
        } else if month <= self.premium_term * 12 {
            self.annual_premium / 12.0
        } else {
            0.0
        }
    }

    /// Check the structural constraints the passes rely on
    pub fn validate(&self) -> Result<(), String> {
        if self.policy_term == 0 {
            return Err("policy term must be at least 1 year".to_string());
        }
        if self.premium_term == 0 || self.premium_term > self.policy_term {
            return Err(format!(
                "premium term {} must be between 1 and the policy term {}",
                self.premium_term, self.policy_term
            ));
        }
        for (name, value) in [
            ("annual premium", self.annual_premium),
            ("sum assured", self.sum_assured),
            ("weight", self.weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite non-negative number, got {}", name, value));
            }
        }
        Ok(())
    }
}
