//! Model point data structures and grid loading

mod data;
pub mod loader;

pub use data::{DeathBenefitOption, ModelPoint, Sex, Smoker};
pub use loader::{load_model_points, load_model_points_from_reader};
