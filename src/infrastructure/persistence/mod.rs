pub mod database;
pub mod repositories;

pub use database::{Database, PoolSettings};
pub use repositories::SqlitePredictionRepository;
