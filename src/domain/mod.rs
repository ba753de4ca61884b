// Crop catalogue, soil tables and pricing
pub mod agronomy;

// Domain-specific error types
pub mod errors;

// Validated model inputs and their vector encoding
pub mod features;

// Prediction results and persisted records
pub mod prediction;

// Repository traits
pub mod repositories;

// Input validation
pub mod validation;
