//! Monthly projection of model points: base passes, cohort expense
//! allocation, cohort passes and flat output

pub mod row;
pub mod passes;
pub mod expenses;
pub mod cohort;
pub mod output;
pub mod irr;
mod engine;

pub use row::{cohort_column, CohortMetrics, ProjectionRow};
pub use expenses::{allocate_cohort_expenses, CohortExpenseTable};
pub use output::{flatten_rows, write_rows_csv, ExtractionResult, FlatProjectionRow};
pub use engine::{ProjectionConfig, ProjectionEngine};
