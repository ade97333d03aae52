/// CSV writers for run results.
pub mod export;
