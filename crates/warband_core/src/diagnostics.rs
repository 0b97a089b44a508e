//! Diagnostic summaries layered outside the tick.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::components::EntityKind;
use crate::simulation::Simulation;

/// Aggregate counts for debug overlays and headless reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameStats {
    /// Ticks completed.
    pub tick: u64,
    /// Simulated seconds.
    pub elapsed_seconds: f64,
    /// Entities in the registry.
    pub total_entities: usize,
    /// Entities still alive.
    pub alive_entities: usize,
    /// Live units the player controls.
    pub player_units: usize,
    /// Live units the player does not control.
    pub enemy_units: usize,
    /// Live buildings.
    pub buildings: usize,
    /// Live resource nodes.
    pub resources: usize,
    /// Selected live entities.
    pub selected: usize,
    /// Live units sheltering in buildings.
    pub garrisoned: usize,
    /// Live AI entities per state name.
    pub ai_states: BTreeMap<&'static str, usize>,
}

impl Simulation {
    /// Collect [`GameStats`] for the current state.
    #[must_use]
    pub fn stats(&self) -> GameStats {
        let mut stats = GameStats {
            tick: self.tick_count(),
            elapsed_seconds: self.elapsed().to_num(),
            total_entities: self.entities().len(),
            ..GameStats::default()
        };

        for entity in self.entities().iter_sorted().filter(|e| e.is_alive()) {
            stats.alive_entities += 1;
            match entity.kind {
                EntityKind::Unit if entity.player_controlled => stats.player_units += 1,
                EntityKind::Unit => stats.enemy_units += 1,
                EntityKind::Building => stats.buildings += 1,
                EntityKind::Resource => stats.resources += 1,
            }
            if entity.selected {
                stats.selected += 1;
            }
            if entity.is_garrisoned() {
                stats.garrisoned += 1;
            }
            if let Some(ai) = &entity.ai {
                *stats.ai_states.entry(ai.state.as_str()).or_default() += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{ResourceRecord, UnitRecord};

    use super::*;

    #[test]
    fn test_stats_counts() {
        let mut sim = Simulation::new();
        let player = sim.spawn_unit(&UnitRecord {
            player_controlled: true,
            ..UnitRecord::default()
        });
        sim.spawn_unit(&UnitRecord {
            x: 900.0,
            ..UnitRecord::default()
        });
        sim.spawn_resource(&ResourceRecord::default());
        sim.select(&[player], false);

        let stats = sim.stats();
        assert_eq!(stats.alive_entities, 3);
        assert_eq!(stats.player_units, 1);
        assert_eq!(stats.enemy_units, 1);
        assert_eq!(stats.resources, 1);
        assert_eq!(stats.selected, 1);
        assert_eq!(stats.ai_states.get("idle"), Some(&1));
    }
}
