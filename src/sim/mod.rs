/// Simulation clocks and the wall-clock abstraction.
pub mod clock;
pub mod engine;
/// Scripted shed requests.
pub mod event;
pub mod kpi;
/// Random high-priority overrides.
pub mod operator;
/// Output load profiles.
pub mod schedule;
pub mod types;
