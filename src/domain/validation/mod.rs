// Request payload validation
pub mod feature_validator;

pub use feature_validator::FeatureValidator;
