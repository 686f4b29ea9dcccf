//! Flight CLI - scripted scenarios for the flight simulation engine.
//!
//! A scenario is a JSON file holding an optional engine config, the obstacles and no-fly zones
//! to register, and an ordered command list replayed against one `FlightSession`.

pub mod scenario;

pub use scenario::{
    execute, parse_point, run_scenario, CommandOutcome, Scenario, ScenarioCommand, StepRecord,
};
