//! Simulation systems.
//!
//! A system scans the registry once per tick and mutates components for a
//! single concern. Systems run in registration order, and that order is
//! part of the simulation's contract: the default order is movement, then
//! combat, then AI, so a chase target written by combat is visible to the
//! AI in the same tick and AI decisions take effect on the next movement
//! pass.

pub mod ai;
pub mod combat;
pub mod movement;
pub mod targeting;

pub use ai::AiSystem;
pub use combat::{calculate_damage, CombatSystem};
pub use movement::{step_toward, MoveStep, MovementSystem};
pub use targeting::nearest_hostile;

use crate::math::Fixed;
use crate::simulation::SimContext;

/// A per-tick processor over every entity.
pub trait System {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Advance this system's concern by `delta` seconds.
    ///
    /// Must not fail: entities lacking the components a system needs are
    /// skipped.
    fn update(&mut self, ctx: &mut SimContext, delta: Fixed);
}

/// The built-in systems in their fixed order.
#[must_use]
pub fn default_systems() -> Vec<Box<dyn System>> {
    vec![
        Box::new(MovementSystem),
        Box::new(CombatSystem),
        Box::new(AiSystem),
    ]
}
