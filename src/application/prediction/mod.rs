pub mod advisory;
pub mod orchestrator;
pub mod profitability;

pub use orchestrator::PredictionOrchestrator;
