//! Pull-free observability: counters and histograms in a private prometheus
//! registry, rendered to text on demand.

pub mod latency_tracker;
pub mod metrics;

pub use latency_tracker::LatencyGuard;
pub use metrics::Metrics;
