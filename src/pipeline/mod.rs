// Evaluation pipeline — per-model runs and result persistence.

pub mod evaluate;
pub mod results;

pub use evaluate::{evaluate_model, ModelEvaluation, ModelRun};
