//! Headless runner for Warband simulations.
//!
//! Loads a RON [`Scenario`], drives the simulation with synthetic frame
//! timestamps and reports a JSON [`RunSummary`]. Worlds can be saved to and
//! resumed from snapshot files.
//!
//! # Example
//!
//! ```bash
//! # Run a scenario for ten seconds of 60 Hz frames
//! cargo run -p warband_headless -- run --scenario assets/scenarios/skirmish.ron --ticks 600
//!
//! # Check a scenario's references
//! cargo run -p warband_headless -- validate --scenario assets/scenarios/skirmish.ron
//! ```

pub mod persistence;
pub mod runner;
pub mod scenario;

pub use persistence::{load_snapshot, save_snapshot, RunError, SaveFormat};
pub use runner::{run, RunOptions, RunSummary};
pub use scenario::{Scenario, ScenarioError, ValidationIssue};
