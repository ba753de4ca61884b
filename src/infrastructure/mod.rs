pub mod observability;
pub mod persistence;
pub mod repositories;

pub use repositories::InMemoryPredictionRepository;
