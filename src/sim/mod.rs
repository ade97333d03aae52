/// Tick clock over a simulated time range.
pub mod clock;
pub mod controller;
pub mod kpi;
/// Fleet load aggregation.
pub mod load;
/// Archetype-to-agent population expansion.
pub mod population;
pub mod simulator;
pub mod types;
