//! Load model points from a model-point grid CSV

use super::{DeathBenefitOption, ModelPoint, Sex, Smoker};
use crate::error::{EngineError, Result};
use csv::Reader;
use std::path::Path;

/// Raw CSV row matching the model-point grid columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "Sex", default)]
    sex: Option<String>,
    #[serde(rename = "Smoker", default)]
    smoker: Option<String>,
    #[serde(rename = "PolicyTerm")]
    policy_term: u32,
    #[serde(rename = "PremiumTerm")]
    premium_term: u32,
    #[serde(rename = "AnnualPremium")]
    annual_premium: f64,
    #[serde(rename = "SumAssured")]
    sum_assured: f64,
    #[serde(rename = "DeathBenefit")]
    death_benefit: String,
    #[serde(rename = "Weight")]
    weight: f64,
}

impl CsvRow {
    fn into_model_point(self) -> Result<ModelPoint> {
        let sex = match self.sex.as_deref().map(str::trim) {
            None | Some("") | Some("M") | Some("Male") => Sex::Male,
            Some("F") | Some("Female") => Sex::Female,
            Some(other) => {
                return Err(EngineError::invalid_model_point(
                    self.id,
                    format!("unknown sex: {}", other),
                ))
            }
        };

        let smoker = match self.smoker.as_deref().map(str::trim) {
            None | Some("") | Some("NS") | Some("NonSmoker") => Smoker::NonSmoker,
            Some("S") | Some("Smoker") => Smoker::Smoker,
            Some(other) => {
                return Err(EngineError::invalid_model_point(
                    self.id,
                    format!("unknown smoker status: {}", other),
                ))
            }
        };

        let death_benefit = match self.death_benefit.trim() {
            "Sum Assured + Fund Value" | "SumAssuredPlusFundValue" | "SA+FV" => {
                DeathBenefitOption::SumAssuredPlusFundValue
            }
            "Max(Sum Assured, Fund Value)" | "MaxOfSumAssuredAndFundValue" | "MAX(SA,FV)" => {
                DeathBenefitOption::MaxOfSumAssuredAndFundValue
            }
            other => {
                return Err(EngineError::invalid_model_point(
                    self.id,
                    format!("unknown death benefit option: {}", other),
                ))
            }
        };

        Ok(ModelPoint {
            id: self.id,
            age: self.age,
            sex,
            smoker,
            policy_term: self.policy_term,
            premium_term: self.premium_term,
            annual_premium: self.annual_premium,
            sum_assured: self.sum_assured,
            death_benefit,
            weight: self.weight,
        })
    }
}

/// Load all model points from a CSV file
pub fn load_model_points<P: AsRef<Path>>(path: P) -> Result<Vec<ModelPoint>> {
    let file = std::fs::File::open(path)?;
    load_model_points_from_reader(file)
}

/// Load model points from any reader (e.g., string buffer, upload body)
pub fn load_model_points_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ModelPoint>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut model_points = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        model_points.push(row.into_model_point()?);
    }

    Ok(model_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "\
Id,Age,Sex,Smoker,PolicyTerm,PremiumTerm,AnnualPremium,SumAssured,DeathBenefit,Weight
1,30,M,NS,20,1,30000,33000,Sum Assured + Fund Value,1
2,45,F,S,15,5,12000,150000,\"Max(Sum Assured, Fund Value)\",0.25
";

    #[test]
    fn test_load_model_points() {
        let model_points = load_model_points_from_reader(GRID.as_bytes()).unwrap();
        assert_eq!(model_points.len(), 2);

        let second = &model_points[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.sex, Sex::Female);
        assert_eq!(second.smoker, Smoker::Smoker);
        assert_eq!(second.premium_term, 5);
        assert_eq!(second.death_benefit, DeathBenefitOption::MaxOfSumAssuredAndFundValue);
        assert_eq!(second.weight, 0.25);
    }

    #[test]
    fn test_non_numeric_term_is_an_error() {
        let grid = "\
Id,Age,Sex,Smoker,PolicyTerm,PremiumTerm,AnnualPremium,SumAssured,DeathBenefit,Weight
1,30,M,NS,twenty,1,30000,33000,Sum Assured + Fund Value,1
";
        assert!(matches!(
            load_model_points_from_reader(grid.as_bytes()),
            Err(EngineError::Csv(_))
        ));
    }

    #[test]
    fn test_unknown_death_benefit() {
        let grid = "\
Id,Age,Sex,Smoker,PolicyTerm,PremiumTerm,AnnualPremium,SumAssured,DeathBenefit,Weight
7,30,M,NS,20,1,30000,33000,Return of Premium,1
";
        assert!(matches!(
            load_model_points_from_reader(grid.as_bytes()),
            Err(EngineError::InvalidModelPoint { id: 7, .. })
        ));
    }
}
