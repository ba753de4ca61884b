pub mod heuristic_predictor;
pub mod metadata;
pub mod model_registry;
pub mod predictor;
pub mod smartcore_predictor;

pub use model_registry::{ModelPaths, ModelRegistry, RegistryHandle};
pub use predictor::{SuitabilityEstimator, YieldEstimate, YieldEstimator};
