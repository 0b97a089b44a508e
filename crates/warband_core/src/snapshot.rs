//! Persistence snapshots.
//!
//! A [`Snapshot`] records what is needed to rebuild a world: identity,
//! kind, position, stats, faction, flags and garrison membership per
//! entity. Transient intent is not saved: combat and AI targets, cooldowns,
//! production queues, retraining and the RNG stream all restart fresh on
//! load. The core only encodes and decodes;
//! storage belongs to the host.

use serde::{Deserialize, Serialize};

use crate::components::{
    Ai, BuildingState, Combat, EntityId, EntityKind, Health, Movement, Progression, ResourceKind,
    ResourceNode,
};
use crate::config::SimulationConfig;
use crate::data::Catalog;
use crate::error::{GameError, Result};
use crate::factions::{Faction, FactionId};
use crate::math::{fixed_serde, option_fixed_serde, Fixed, Vec2Fixed};
use crate::registry::Entity;
use crate::simulation::{SimContext, Simulation};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// A saved world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Ticks completed when saved.
    pub tick: u64,
    /// Simulated seconds when saved.
    #[serde(with = "fixed_serde")]
    pub elapsed: Fixed,
    /// Known factions.
    pub factions: Vec<Faction>,
    /// Entities in id order.
    pub entities: Vec<EntitySnapshot>,
}

/// Health values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Current health.
    #[serde(with = "fixed_serde")]
    pub current: Fixed,
    /// Maximum health.
    #[serde(with = "fixed_serde")]
    pub max: Fixed,
    /// Regeneration per second.
    #[serde(with = "fixed_serde")]
    pub regeneration: Fixed,
}

/// Combat and movement stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    /// Attack power.
    pub attack_power: u32,
    /// Defense.
    pub defense: u32,
    /// Attack range.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Attacks per second.
    #[serde(with = "fixed_serde")]
    pub attack_speed: Fixed,
    /// Detection range.
    #[serde(with = "fixed_serde")]
    pub detection_range: Fixed,
    /// Auto-attack flag.
    pub auto_attack: bool,
}

/// Resource node values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSnapshot {
    /// Kind of resource.
    pub kind: ResourceKind,
    /// Remaining amount.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
    /// Regeneration cap.
    #[serde(with = "fixed_serde")]
    pub max_amount: Fixed,
    /// Regeneration per second.
    #[serde(with = "fixed_serde")]
    pub regeneration: Fixed,
}

/// Building values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRecordSnapshot {
    /// Building type name.
    pub building_type: String,
    /// Construction finished.
    pub constructed: bool,
    /// Construction progress in `[0, 1]`.
    #[serde(with = "fixed_serde")]
    pub construction_progress: Fixed,
    /// Seconds to construct.
    #[serde(with = "fixed_serde")]
    pub construction_time: Fixed,
    /// Rally point.
    pub rally_point: Vec2Fixed,
    /// Units the building can shelter.
    #[serde(default)]
    pub garrison_capacity: u32,
    /// Sheltered units in the order they entered.
    #[serde(default)]
    pub garrisoned: Vec<EntityId>,
}

/// One saved entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id, preserved across save and load.
    pub id: EntityId,
    /// Unit, building or resource.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Class or building type.
    pub class: Option<String>,
    /// Position.
    pub position: Vec2Fixed,
    /// Allegiance.
    pub faction: Option<FactionId>,
    /// Alive flag.
    pub alive: bool,
    /// Player control flag.
    pub player_controlled: bool,
    /// Health.
    pub health: Option<HealthRecord>,
    /// Movement speed, for mobile entities.
    #[serde(with = "option_fixed_serde", default)]
    pub speed: Option<Fixed>,
    /// Combat stats.
    pub stats: Option<StatsRecord>,
    /// Level and experience.
    pub progression: Option<Progression>,
    /// Patrol route of AI units. Present exactly when the entity has AI.
    pub patrol_points: Option<Vec<Vec2Fixed>>,
    /// Resource node values.
    pub resource: Option<ResourceRecordSnapshot>,
    /// Building values.
    pub building: Option<BuildingRecordSnapshot>,
    /// Building the unit is sheltering in.
    #[serde(default)]
    pub garrisoned_in: Option<EntityId>,
}

impl EntitySnapshot {
    /// Capture an entity.
    #[must_use]
    pub fn capture(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            name: entity.name.clone(),
            class: entity.class.clone(),
            position: entity.position,
            faction: entity.faction,
            alive: entity.alive,
            player_controlled: entity.player_controlled,
            health: entity.health.map(|h| HealthRecord {
                current: h.current,
                max: h.max,
                regeneration: h.regeneration,
            }),
            speed: entity.movement.map(|m| m.speed),
            stats: entity.combat.map(|c| StatsRecord {
                attack_power: c.attack_power,
                defense: c.defense,
                attack_range: c.attack_range,
                attack_speed: c.attack_speed,
                detection_range: c.detection_range,
                auto_attack: c.auto_attack,
            }),
            progression: entity.progression,
            patrol_points: entity.ai.as_ref().map(|ai| ai.patrol_points.clone()),
            resource: entity.resource.map(|r| ResourceRecordSnapshot {
                kind: r.kind,
                amount: r.amount,
                max_amount: r.max_amount,
                regeneration: r.regeneration,
            }),
            building: entity.building.as_ref().map(|b| BuildingRecordSnapshot {
                building_type: b.building_type.clone(),
                constructed: b.constructed,
                construction_progress: b.construction_progress,
                construction_time: b.construction_time,
                rally_point: b.rally_point,
                garrison_capacity: b.garrison_capacity,
                garrisoned: b.garrisoned.clone(),
            }),
            garrisoned_in: entity.garrisoned_in,
        }
    }

    /// Rebuild the entity with fresh transient state.
    #[must_use]
    pub fn restore(&self, config: &SimulationConfig) -> Entity {
        let mut entity = Entity::new(self.kind, self.name.clone(), self.position);
        entity.id = self.id;
        entity.class = self.class.clone();
        entity.faction = self.faction;
        entity.alive = self.alive;
        entity.player_controlled = self.player_controlled;

        entity.health = self.health.map(|h| Health {
            current: h.current.min(h.max).max(Fixed::ZERO),
            max: h.max,
            regeneration: h.regeneration,
        });
        entity.movement = self.speed.map(|speed| Movement::new(speed, self.position));
        entity.combat = self.stats.map(|s| {
            Combat::new(s.attack_power, s.defense, s.attack_range)
                .with_attack_speed(s.attack_speed)
                .with_detection_range(s.detection_range)
                .with_auto_attack(s.auto_attack)
        });
        entity.progression = self.progression.map(|p| Progression {
            level: p.level.max(1),
            experience: p.experience,
        });
        entity.garrisoned_in = self.garrisoned_in;
        entity.ai = self.patrol_points.as_ref().map(|points| {
            Ai::new()
                .with_patrol_points(points.clone())
                .with_decision_interval(config.decision_interval)
        });
        entity.resource = self.resource.map(|r| ResourceNode {
            kind: r.kind,
            amount: r.amount,
            max_amount: r.max_amount,
            regeneration: r.regeneration,
        });
        entity.building = self.building.as_ref().map(|b| {
            let mut state = BuildingState::new(b.building_type.clone(), b.construction_time, b.rally_point)
                .with_garrison_capacity(b.garrison_capacity);
            state.garrisoned.clone_from(&b.garrisoned);
            state.constructed = b.constructed;
            state.construction_progress = b.construction_progress;
            state
        });
        entity
    }
}

impl Snapshot {
    /// Encode with `bincode`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Snapshot(format!("Failed to encode snapshot: {e}")))
    }

    /// Decode from `bincode`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if the bytes are not a snapshot.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| GameError::Snapshot(format!("Failed to decode snapshot: {e}")))
    }

    /// Encode as pretty RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if encoding fails.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Snapshot(format!("Failed to encode snapshot: {e}")))
    }

    /// Decode from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if the text is not a snapshot.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::Snapshot(format!("Failed to decode snapshot: {e}")))
    }
}

impl Simulation {
    /// Capture the current world.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            tick: self.tick_count(),
            elapsed: self.elapsed(),
            factions: self.factions().iter().cloned().collect(),
            entities: self.entities().iter_sorted().map(EntitySnapshot::capture).collect(),
        }
    }

    /// Rebuild a simulation from a snapshot.
    ///
    /// Entity ids are preserved, so ids handed out before saving stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] for an unsupported version.
    pub fn from_snapshot(snapshot: &Snapshot, config: SimulationConfig, catalog: Catalog) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::Snapshot(format!(
                "Unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }

        let mut ctx = SimContext::new(config);
        ctx.tick = snapshot.tick;
        for faction in &snapshot.factions {
            ctx.factions.register(faction.clone());
        }
        for saved in &snapshot.entities {
            let entity = saved.restore(&ctx.config);
            if let Some(faction) = entity.faction {
                ctx.factions.ensure(faction);
            }
            ctx.entities.insert_with_id(entity);
        }

        tracing::info!(
            tick = snapshot.tick,
            entities = snapshot.entities.len(),
            "Simulation restored from snapshot"
        );
        Ok(Self::restore(ctx, catalog, snapshot.elapsed))
    }
}
