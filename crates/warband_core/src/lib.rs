//! # Warband Core
//!
//! Deterministic entity-component simulation core for Warband, a real-time
//! strategy game with light RPG progression.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (a seeded `ChaCha8Rng` lives in the context)
//! - No floating-point math inside a tick (uses fixed-point)
//!
//! This separation enables:
//! - Headless runs and batch testing
//! - Save/load through plain snapshots
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`components`] - Component definitions
//! - [`registry`] - Entity storage and per-entity bookkeeping
//! - [`systems`] - Movement, combat and AI systems
//! - [`commands`] - Player command dispatch
//! - [`simulation`] - Core simulation loop
//! - [`data`] / [`factory`] - World-setup records and entity construction
//! - [`snapshot`] - Persistence snapshots
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod commands;
pub mod components;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod factions;
pub mod factory;
pub mod math;
pub mod registry;
pub mod simulation;
pub mod snapshot;
pub mod systems;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{CommandKind, CommandTarget};
    pub use crate::components::*;
    pub use crate::config::SimulationConfig;
    pub use crate::data::{BuildingRecord, Catalog, ResourceRecord, StatBlock, UnitRecord, UnitStats};
    pub use crate::error::{GameError, Result};
    pub use crate::events::Notification;
    pub use crate::factions::{Faction, FactionId};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::registry::{Entity, EntityRegistry};
    pub use crate::simulation::{FrameClock, SimContext, Simulation, TickEvents};
    pub use crate::snapshot::Snapshot;
    pub use crate::systems::System;
}
