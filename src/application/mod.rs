pub mod bootstrap;

// Model artifacts, estimators and the shared registry
pub mod ml;

// Best-effort storage of results
pub mod persistence;

// Turning features into a result
pub mod prediction;

// Inbound façade
pub mod service;
