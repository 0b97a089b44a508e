//! Entity factories.
//!
//! Turn plain data records into entities with their initial components.
//! Faction registration is left to the caller; see
//! [`Simulation::spawn_unit`](crate::simulation::Simulation::spawn_unit).

use crate::components::{
    Ai, BuildingState, Combat, EntityKind, Health, Movement, Progression, ResourceKind,
    ResourceNode, UNIT_REGENERATION_PER_SECOND,
};
use crate::config::SimulationConfig;
use crate::data::{
    BuildingRecord, BuildingType, Catalog, ResourceRecord, UnitRecord, UnitStats,
    DEFAULT_BUILDING_ARMOR, DEFAULT_BUILDING_HEALTH, DEFAULT_BUILDING_SIGHT,
    DEFAULT_CONSTRUCTION_TIME, DEFAULT_RALLY_OFFSET, DEFAULT_RESOURCE_AMOUNT, DEFAULT_TOWER_POWER,
    DEFAULT_TOWER_RANGE,
};
use crate::factions::FactionId;
use crate::math::{fixed_from_f64, Fixed, Vec2Fixed};
use crate::registry::Entity;

/// Everything needed to build a unit once its stats are resolved.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    /// Display name.
    pub name: String,
    /// Class the unit was built from.
    pub class: Option<String>,
    /// Resolved stats.
    pub stats: UnitStats,
    /// Spawn position.
    pub position: Vec2Fixed,
    /// Owning faction.
    pub faction: Option<FactionId>,
    /// Player units get no AI and no auto-attack.
    pub player_controlled: bool,
    /// Starting level.
    pub level: u32,
    /// Patrol route for AI units.
    pub patrol_points: Vec<Vec2Fixed>,
}

impl UnitSpec {
    /// Resolve a data record against the catalog.
    #[must_use]
    pub fn from_record(record: &UnitRecord, catalog: &Catalog) -> Self {
        let class = record.class.clone();
        let stats = catalog.resolve_unit_stats(class.as_deref(), &record.stats);
        let name = record
            .name
            .clone()
            .or_else(|| class.clone())
            .unwrap_or_else(|| "unit".to_string());

        Self {
            name,
            class,
            stats,
            position: record.position(),
            faction: record.faction.map(FactionId::new),
            player_controlled: record.player_controlled,
            level: record.level.unwrap_or(1),
            patrol_points: record
                .patrol_points
                .iter()
                .map(|&(x, y)| Vec2Fixed::from_f64(x, y))
                .collect(),
        }
    }
}

/// Build a unit entity.
#[must_use]
pub fn build_unit(spec: UnitSpec, config: &SimulationConfig) -> Entity {
    let stats = spec.stats;
    let mut entity = Entity::new(EntityKind::Unit, spec.name, spec.position);
    entity.class = spec.class;
    entity.faction = spec.faction;
    entity.player_controlled = spec.player_controlled;

    entity.health = Some(
        Health::new(stats.health).with_regeneration(Fixed::from_num(UNIT_REGENERATION_PER_SECOND)),
    );
    entity.movement = Some(Movement::new(stats.speed, spec.position));
    entity.combat = Some(
        Combat::new(stats.melee_attack, stats.defense, stats.attack_range())
            .with_detection_range(stats.vision)
            .with_auto_attack(!spec.player_controlled),
    );
    entity.progression = Some(Progression::new(spec.level));

    if !spec.player_controlled {
        entity.ai = Some(
            Ai::new()
                .with_patrol_points(spec.patrol_points)
                .with_decision_interval(config.decision_interval),
        );
    }

    entity
}

/// Build a building entity.
///
/// Unknown building types log a warning and use default values.
#[must_use]
pub fn build_building(record: &BuildingRecord, catalog: &Catalog) -> Entity {
    let fallback = BuildingType::default();
    let def = catalog.building(&record.building_type).unwrap_or_else(|| {
        tracing::warn!(building_type = %record.building_type, "Unknown building type, using defaults");
        &fallback
    });

    let position = record.position();
    let mut entity = Entity::new(EntityKind::Building, record.building_type.clone(), position);
    entity.class = Some(record.building_type.clone());
    entity.faction = record.faction.map(FactionId::new);
    entity.player_controlled = record.player_controlled;

    let health = def.health.map_or(Fixed::from_num(DEFAULT_BUILDING_HEALTH), fixed_from_f64);
    entity.health = Some(Health::new(health));

    let armor = def.armor.unwrap_or(DEFAULT_BUILDING_ARMOR);
    let sight = def.sight.map_or(Fixed::from_num(DEFAULT_BUILDING_SIGHT), fixed_from_f64);
    entity.combat = Some(match &def.attack {
        Some(attack) => Combat::new(
            attack.power.unwrap_or(DEFAULT_TOWER_POWER),
            armor,
            attack.range.map_or(Fixed::from_num(DEFAULT_TOWER_RANGE), fixed_from_f64),
        )
        .with_attack_speed(attack.speed.map_or(Fixed::ONE, fixed_from_f64))
        .with_detection_range(sight)
        .with_auto_attack(true),
        None => Combat::new(0, armor, Fixed::ZERO).with_detection_range(sight),
    });

    let construction_time = def
        .construction_time
        .map_or(Fixed::from_num(DEFAULT_CONSTRUCTION_TIME), fixed_from_f64);
    let rally_point = record.rally_point.map_or_else(
        || position + Vec2Fixed::from_int(DEFAULT_RALLY_OFFSET, DEFAULT_RALLY_OFFSET),
        |(x, y)| Vec2Fixed::from_f64(x, y),
    );
    let mut state = BuildingState::new(record.building_type.clone(), construction_time, rally_point)
        .with_garrison_capacity(def.garrison_capacity.unwrap_or(0));
    if record.under_construction {
        state.start_construction();
    }
    entity.building = Some(state);

    entity
}

/// Build a resource node entity. Resource nodes belong to no faction.
#[must_use]
pub fn build_resource(record: &ResourceRecord) -> Entity {
    let amount = record.amount.map_or(Fixed::from_num(DEFAULT_RESOURCE_AMOUNT), fixed_from_f64);
    let mut node = ResourceNode::new(record.kind, amount.max(Fixed::ZERO));
    node.regeneration = record.regeneration.map_or(Fixed::ZERO, fixed_from_f64);

    let mut entity = Entity::new(EntityKind::Resource, resource_name(record.kind), record.position());
    entity.resource = Some(node);
    entity
}

fn resource_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Gold => "gold",
        ResourceKind::Wood => "wood",
        ResourceKind::Stone => "stone",
        ResourceKind::Food => "food",
        ResourceKind::Mana => "mana",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AiState;
    use crate::data::AttackDef;

    #[test]
    fn test_ai_unit_defaults() {
        let record = UnitRecord {
            faction: Some(2),
            patrol_points: vec![(0.0, 0.0), (100.0, 0.0)],
            ..UnitRecord::default()
        };
        let unit = build_unit(UnitSpec::from_record(&record, &Catalog::default()), &SimulationConfig::default());

        let health = unit.health.unwrap();
        assert_eq!(health.max, Fixed::from_num(100));
        assert_eq!(health.regeneration, Fixed::from_num(0.5));

        let combat = unit.combat.unwrap();
        assert_eq!(combat.attack_power, 10);
        assert_eq!(combat.defense, 5);
        assert_eq!(combat.attack_range, Fixed::from_num(50));
        assert_eq!(combat.detection_range, Fixed::from_num(150));
        assert!(combat.auto_attack);

        let ai = unit.ai.unwrap();
        assert_eq!(ai.state, AiState::Idle);
        assert_eq!(ai.patrol_points.len(), 2);
        assert_eq!(ai.aggressiveness, Fixed::from_num(0.7));
        assert_eq!(ai.decision_timer, Fixed::ZERO);
        assert_eq!(unit.faction, Some(FactionId::new(2)));
    }

    #[test]
    fn test_player_unit_has_no_ai() {
        let record = UnitRecord {
            player_controlled: true,
            ..UnitRecord::default()
        };
        let unit = build_unit(UnitSpec::from_record(&record, &Catalog::default()), &SimulationConfig::default());
        assert!(unit.ai.is_none());
        assert!(!unit.combat.unwrap().auto_attack);
    }

    #[test]
    fn test_tower_gets_auto_attack() {
        let mut catalog = Catalog::default();
        catalog.buildings.insert(
            "tower".to_string(),
            BuildingType {
                attack: Some(AttackDef::default()),
                ..BuildingType::default()
            },
        );
        let record = BuildingRecord {
            building_type: "tower".to_string(),
            x: 10.0,
            y: 10.0,
            ..BuildingRecord::default()
        };
        let tower = build_building(&record, &catalog);

        let combat = tower.combat.unwrap();
        assert!(combat.auto_attack);
        assert_eq!(combat.attack_power, 20);
        assert_eq!(combat.attack_range, Fixed::from_num(200));
        assert_eq!(combat.defense, 5);
        assert_eq!(tower.health.unwrap().max, Fixed::from_num(500));
        let state = tower.building.unwrap();
        assert_eq!(state.rally_point, Vec2Fixed::from_int(110, 110));
        assert_eq!(state.garrison_capacity, 0);
    }

    #[test]
    fn test_rally_point_saturates_at_map_edge() {
        let record = BuildingRecord {
            building_type: "outpost".to_string(),
            x: 2_147_483_600.0,
            y: 2_147_483_600.0,
            ..BuildingRecord::default()
        };
        let outpost = build_building(&record, &Catalog::default());

        let rally = outpost.building.unwrap().rally_point;
        assert_eq!(rally, Vec2Fixed::new(Fixed::MAX, Fixed::MAX));
    }

    #[test]
    fn test_garrison_capacity_comes_from_catalog() {
        let mut catalog = Catalog::default();
        catalog.buildings.insert(
            "keep".to_string(),
            BuildingType {
                garrison_capacity: Some(4),
                ..BuildingType::default()
            },
        );
        let keep = build_building(
            &BuildingRecord {
                building_type: "keep".to_string(),
                ..BuildingRecord::default()
            },
            &catalog,
        );
        assert_eq!(keep.building.unwrap().garrison_capacity, 4);
    }

    #[test]
    fn test_resource_defaults() {
        let node = build_resource(&ResourceRecord::default());
        let resource = node.resource.unwrap();
        assert_eq!(resource.amount, Fixed::from_num(1000));
        assert_eq!(resource.max_amount, resource.amount);
        assert_eq!(node.faction, None);
        assert_eq!(node.name, "gold");
    }
}
