//! Engine entry point
//!
//! One call takes a full parameter snapshot and returns every projected row
//! plus the cohort expense table. A run either completes or fails as a whole.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::assumptions::{AssumptionSet, CohortYears};
use crate::error::{EngineError, Result};
use crate::lookup::parse_iso_date;
use crate::policy::ModelPoint;
use crate::projection::{ExtractionResult, ProjectionConfig, ProjectionEngine};

/// Full parameter snapshot for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInput {
    pub assumptions: AssumptionSet,
    pub model_points: Vec<ModelPoint>,
    /// ISO `YYYY-MM-DD`
    pub valuation_date: String,
    pub target_cohort_years: Vec<String>,
}

impl EngineInput {
    /// Check every model point, the valuation date and the cohort years
    pub fn validate(&self) -> Result<ProjectionConfig> {
        for mp in &self.model_points {
            mp.validate()
                .map_err(|reason| EngineError::invalid_model_point(mp.id, reason))?;
        }

        let valuation_date = parse_iso_date(&self.valuation_date)
            .ok_or_else(|| EngineError::InvalidDate(self.valuation_date.clone()))?;
        let cohort_years = CohortYears::parse(&self.target_cohort_years)?;

        Ok(ProjectionConfig {
            valuation_date,
            cohort_years,
        })
    }
}

/// Validate the input and run every pass for every model point
pub fn run_extraction(input: &EngineInput) -> Result<ExtractionResult> {
    let config = input.validate()?;
    let engine = ProjectionEngine::new(&input.assumptions, config);
    engine.run(&input.model_points)
}

/// Boundary result: `{"success": true, "rows": .., "cohortExpenses": ..}` or
/// `{"success": false, "message": ..}`, never partial rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub result: Option<ExtractionResult>,
}

impl EngineResponse {
    pub fn success(result: ExtractionResult) -> Self {
        Self {
            success: true,
            message: None,
            result: Some(result),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            result: None,
        }
    }
}

/// Run the engine, turning errors and panics into a failure response
pub fn run_engine(input: &EngineInput) -> EngineResponse {
    let outcome = catch_unwind(AssertUnwindSafe(|| run_extraction(input)))
        .unwrap_or_else(|panic| Err(EngineError::Panicked(panic_message(panic.as_ref()))));

    match outcome {
        Ok(result) => {
            info!("Engine run succeeded with {} rows", result.rows.len());
            EngineResponse::success(result)
        }
        Err(e) => {
            error!("Engine run failed: {}", e);
            EngineResponse::failure(e.to_string())
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
