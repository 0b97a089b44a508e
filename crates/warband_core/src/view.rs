//! Read-only view for renderers.
//!
//! The core never draws. After each tick a renderer asks for
//! [`Simulation::render_view`] and gets plain values in draw order.

use serde::Serialize;

use crate::components::{EntityId, EntityKind};
use crate::factions::FactionId;
use crate::simulation::Simulation;

/// Health as a renderer needs it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthSnapshot {
    /// Current health.
    pub current: f32,
    /// Maximum health.
    pub max: f32,
}

/// One drawable entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEntity {
    /// Entity id.
    pub id: EntityId,
    /// Unit, building or resource.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// World position.
    pub position: (f32, f32),
    /// Heading in radians, `atan2(dy, dx)` of the last movement.
    pub facing: f32,
    /// Allegiance.
    pub faction: Option<FactionId>,
    /// Faction color, if the faction is known.
    pub color: Option<String>,
    /// Selected by the player.
    pub selected: bool,
    /// Health, for entities that have it.
    pub health: Option<HealthSnapshot>,
}

impl Simulation {
    /// Live entities outside buildings in draw order: by y, then by id.
    #[must_use]
    pub fn render_view(&self) -> Vec<RenderEntity> {
        let mut view: Vec<RenderEntity> = self
            .entities()
            .iter_sorted()
            .filter(|e| e.is_active())
            .map(|e| RenderEntity {
                id: e.id,
                kind: e.kind,
                name: e.name.clone(),
                position: e.position.to_f32(),
                facing: e.facing.angle_radians(),
                faction: e.faction,
                color: e
                    .faction
                    .and_then(|f| self.factions().get(f))
                    .map(|f| f.color.clone()),
                selected: e.selected,
                health: e.health.map(|h| HealthSnapshot {
                    current: h.current.to_num(),
                    max: h.max.to_num(),
                }),
            })
            .collect();

        view.sort_by(|a, b| a.position.1.total_cmp(&b.position.1).then(a.id.cmp(&b.id)));
        view
    }
}
