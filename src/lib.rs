//! UL Projection - monthly projection engine for unit-linked life policies
//!
//! This library provides:
//! - Month-by-month decrement, unit fund and non-unit cashflow projection
//! - Statutory and reinsurance reserves by backward recursion
//! - IFRS17 BEL, risk adjustment and CSM roll-forward, overall and per cohort year
//! - Cohort expense allocation from a new-business plan
//! - Financial-year IFRS4, IFRS17 and expense reporting views

pub mod error;
pub mod lookup;
pub mod policy;
pub mod assumptions;
pub mod projection;
pub mod extract;
pub mod reporting;
pub mod worker;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use policy::{ModelPoint, DeathBenefitOption, Sex, Smoker};
pub use assumptions::{AssumptionSet, RateTable, CohortYears};
pub use projection::{ExtractionResult, FlatProjectionRow, ProjectionRow, CohortExpenseTable};
pub use extract::{run_engine, run_extraction, EngineInput, EngineResponse};
pub use worker::ProjectionWorker;
