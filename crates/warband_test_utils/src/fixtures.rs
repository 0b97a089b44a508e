//! Test fixtures and helpers.
//!
//! Pre-built worlds and entity configurations for consistent testing.

use fixed::types::I32F32;
use warband_core::components::ResourceKind;
use warband_core::data::{ResourceRecord, StatBlock, UnitRecord};
use warband_core::factions::{Faction, FactionId};
use warband_core::math::Vec2Fixed;
use warband_core::prelude::{EntityId, SimulationConfig};
use warband_core::simulation::Simulation;

/// Faction id used for the player in fixtures.
pub const PLAYER: u32 = 1;
/// Faction id used for the opponent in fixtures.
pub const ENEMY: u32 = 2;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer point.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// Empty simulation with the player and enemy factions registered.
#[must_use]
pub fn sim_with_factions() -> Simulation {
    sim_with_config(SimulationConfig::default())
}

/// Like [`sim_with_factions`] with a custom config.
#[must_use]
pub fn sim_with_config(config: SimulationConfig) -> Simulation {
    let mut sim = Simulation::with_config(config);
    sim.register_faction(Faction::new(FactionId::new(PLAYER), "Player", "#0066cc"));
    sim.register_faction(Faction::new(FactionId::new(ENEMY), "Enemy", "#cc0000"));
    sim
}

/// Spawn an AI-controlled unit with default stats.
pub fn unit_at(sim: &mut Simulation, x: i32, y: i32, faction: u32) -> EntityId {
    unit_with_stats(sim, x, y, faction, StatBlock::default())
}

/// Spawn an AI-controlled unit with stat overrides.
pub fn unit_with_stats(sim: &mut Simulation, x: i32, y: i32, faction: u32, stats: StatBlock) -> EntityId {
    sim.spawn_unit(&UnitRecord {
        x: f64::from(x),
        y: f64::from(y),
        faction: Some(faction),
        stats,
        ..UnitRecord::default()
    })
}

/// Spawn a player-controlled unit with default stats.
pub fn player_unit_at(sim: &mut Simulation, x: i32, y: i32) -> EntityId {
    sim.spawn_unit(&UnitRecord {
        x: f64::from(x),
        y: f64::from(y),
        faction: Some(PLAYER),
        player_controlled: true,
        ..UnitRecord::default()
    })
}

/// Spawn a gold node holding `amount`.
pub fn resource_at(sim: &mut Simulation, x: i32, y: i32, amount: i32) -> EntityId {
    sim.spawn_resource(&ResourceRecord {
        kind: ResourceKind::Gold,
        x: f64::from(x),
        y: f64::from(y),
        amount: Some(f64::from(amount)),
        regeneration: None,
    })
}

/// Two lines of AI units facing each other, `per_side` units each.
///
/// The lines start 150 units apart, inside each other's AI detection
/// radius, so fighting begins on the first decision tick.
#[must_use]
pub fn skirmish(per_side: u32, seed: u64) -> Simulation {
    let mut sim = sim_with_config(SimulationConfig::default().with_seed(seed));
    for i in 0..per_side {
        let row = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(12);
        unit_at(&mut sim, 0, row, PLAYER);
        unit_at(&mut sim, 150, row, ENEMY);
    }
    tracing::debug!(per_side, seed, "Skirmish fixture created");
    sim
}
