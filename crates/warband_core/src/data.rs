//! World-setup data records.
//!
//! These are the plain records a host loads from scenario or mod files and
//! hands to the entity factories. Every field is optional where a built-in
//! default exists, so incomplete data still produces a runnable world.
//!
//! # Stat resolution
//!
//! A unit's stats resolve field by field: the record's own override wins,
//! then the class definition from the [`Catalog`], then the built-in default
//! stat block ([`UnitStats::default`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::ResourceKind;
use crate::error::{GameError, Result};
use crate::factions::{Faction, FactionId};
use crate::math::{fixed_from_f64, Fixed, Vec2Fixed};

/// Default unit health.
pub const DEFAULT_UNIT_HEALTH: i32 = 100;
/// Default melee attack power.
pub const DEFAULT_MELEE_ATTACK: u32 = 10;
/// Default unit defense.
pub const DEFAULT_DEFENSE: u32 = 5;
/// Default unit speed in world units per second.
pub const DEFAULT_UNIT_SPEED: i32 = 100;
/// Default unit vision radius.
pub const DEFAULT_VISION: i32 = 150;
/// Attack range of units with a ranged attack.
pub const RANGED_ATTACK_RANGE: i32 = 150;
/// Attack range of melee-only units.
pub const MELEE_ATTACK_RANGE: i32 = 50;
/// Default production time for a unit class, in seconds.
pub const DEFAULT_PRODUCTION_TIME: i32 = 30;
/// Default retraining time into a class, in seconds.
pub const DEFAULT_LEARNING_TIME: i32 = 300;

/// Default building health.
pub const DEFAULT_BUILDING_HEALTH: i32 = 500;
/// Default building armor.
pub const DEFAULT_BUILDING_ARMOR: u32 = 5;
/// Default building sight radius.
pub const DEFAULT_BUILDING_SIGHT: i32 = 200;
/// Default construction time in seconds.
pub const DEFAULT_CONSTRUCTION_TIME: i32 = 30;
/// Offset of the default rally point from the building, on both axes.
pub const DEFAULT_RALLY_OFFSET: i32 = 100;
/// Default tower attack power.
pub const DEFAULT_TOWER_POWER: u32 = 20;
/// Default tower attack range.
pub const DEFAULT_TOWER_RANGE: i32 = 200;

/// Default amount in a resource node.
pub const DEFAULT_RESOURCE_AMOUNT: i32 = 1000;

/// Partial stat overrides. Missing fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    /// Maximum health.
    pub health: Option<f64>,
    /// Melee attack power.
    pub melee_attack: Option<u32>,
    /// Ranged attack power. Any positive value makes the unit ranged.
    pub ranged_attack: Option<u32>,
    /// Flat damage reduction.
    pub defense: Option<u32>,
    /// Movement speed in world units per second.
    pub speed: Option<f64>,
    /// Vision radius, also used as detection range.
    pub vision: Option<f64>,
}

impl StatBlock {
    /// Fill unset fields from `fallback`.
    #[must_use]
    pub fn or(&self, fallback: &Self) -> Self {
        Self {
            health: self.health.or(fallback.health),
            melee_attack: self.melee_attack.or(fallback.melee_attack),
            ranged_attack: self.ranged_attack.or(fallback.ranged_attack),
            defense: self.defense.or(fallback.defense),
            speed: self.speed.or(fallback.speed),
            vision: self.vision.or(fallback.vision),
        }
    }
}

/// Fully resolved unit stats in simulation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitStats {
    /// Maximum health.
    pub health: Fixed,
    /// Melee attack power, used as combat attack power.
    pub melee_attack: u32,
    /// Ranged attack power.
    pub ranged_attack: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Movement speed.
    pub speed: Fixed,
    /// Vision radius.
    pub vision: Fixed,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            health: Fixed::from_num(DEFAULT_UNIT_HEALTH),
            melee_attack: DEFAULT_MELEE_ATTACK,
            ranged_attack: 0,
            defense: DEFAULT_DEFENSE,
            speed: Fixed::from_num(DEFAULT_UNIT_SPEED),
            vision: Fixed::from_num(DEFAULT_VISION),
        }
    }
}

impl UnitStats {
    /// Resolve a stat block against the built-in defaults.
    #[must_use]
    pub fn resolve(block: &StatBlock) -> Self {
        let defaults = Self::default();
        Self {
            health: block.health.map_or(defaults.health, |h| fixed_from_f64(h).max(Fixed::ZERO)),
            melee_attack: block.melee_attack.unwrap_or(defaults.melee_attack),
            ranged_attack: block.ranged_attack.unwrap_or(defaults.ranged_attack),
            defense: block.defense.unwrap_or(defaults.defense),
            speed: block.speed.map_or(defaults.speed, fixed_from_f64),
            vision: block.vision.map_or(defaults.vision, fixed_from_f64),
        }
    }

    /// Attack range implied by the stats: ranged units reach further.
    #[must_use]
    pub fn attack_range(&self) -> Fixed {
        if self.ranged_attack > 0 {
            Fixed::from_num(RANGED_ATTACK_RANGE)
        } else {
            Fixed::from_num(MELEE_ATTACK_RANGE)
        }
    }
}

/// What a unit must have before it can retrain into a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningRequirements {
    /// Seconds of training. Defaults to 300.
    pub time: Option<f64>,
    /// The unit must currently belong to this class.
    pub prerequisite_class: Option<String>,
    /// Minimum level.
    pub min_level: Option<u32>,
    /// Minimum maximum health.
    pub min_health: Option<f64>,
    /// Minimum attack power.
    pub min_attack: Option<u32>,
    /// Minimum defense.
    pub min_defense: Option<u32>,
}

/// The parts of a unit that learning requirements look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trainee<'a> {
    /// Current class.
    pub class: Option<&'a str>,
    /// Current level.
    pub level: u32,
    /// Maximum health.
    pub max_health: Fixed,
    /// Attack power.
    pub attack: u32,
    /// Defense.
    pub defense: u32,
}

impl LearningRequirements {
    /// Check every requirement against a unit. Unset requirements pass.
    #[must_use]
    pub fn allows(&self, trainee: &Trainee<'_>) -> bool {
        if let Some(prerequisite) = &self.prerequisite_class {
            if trainee.class != Some(prerequisite.as_str()) {
                return false;
            }
        }
        self.min_level.map_or(true, |min| trainee.level >= min)
            && self
                .min_health
                .map_or(true, |min| trainee.max_health >= fixed_from_f64(min))
            && self.min_attack.map_or(true, |min| trainee.attack >= min)
            && self.min_defense.map_or(true, |min| trainee.defense >= min)
    }

    /// Training time in simulation units.
    #[must_use]
    pub fn duration(&self) -> Fixed {
        self.time
            .map_or(Fixed::from_num(DEFAULT_LEARNING_TIME), fixed_from_f64)
            .max(Fixed::ZERO)
    }
}

/// A named unit class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitClass {
    /// Class stat block.
    pub stats: StatBlock,
    /// Seconds a building needs to produce one unit of this class.
    pub production_time: Option<f64>,
    /// Requirements for retraining into this class.
    pub learning: LearningRequirements,
    /// Units of this class can never retrain.
    pub locked: bool,
}

/// Attack definition for defensive buildings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackDef {
    /// Attack power.
    pub power: Option<u32>,
    /// Attack range.
    pub range: Option<f64>,
    /// Attacks per second.
    pub speed: Option<f64>,
}

/// A named building type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingType {
    /// Maximum health.
    pub health: Option<f64>,
    /// Flat damage reduction.
    pub armor: Option<u32>,
    /// Sight radius, used as detection range for towers.
    pub sight: Option<f64>,
    /// Seconds to construct.
    pub construction_time: Option<f64>,
    /// Present for buildings that shoot.
    pub attack: Option<AttackDef>,
    /// Unit classes this building can produce. Empty means unrestricted.
    pub produces: Vec<String>,
    /// Units the building can shelter. Defaults to none.
    pub garrison_capacity: Option<u32>,
}

/// Unit classes and building types known to a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Unit classes by name.
    pub classes: BTreeMap<String, UnitClass>,
    /// Building types by name.
    pub buildings: BTreeMap<String, BuildingType>,
}

impl Catalog {
    /// Parse a catalog from RON text. `source` names the text in errors.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text is not a catalog.
    pub fn from_ron(text: &str, source: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a unit class.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&UnitClass> {
        self.classes.get(name)
    }

    /// Look up a building type.
    #[must_use]
    pub fn building(&self, name: &str) -> Option<&BuildingType> {
        self.buildings.get(name)
    }

    /// Resolve a unit's stats: record override, then class, then defaults.
    ///
    /// An unknown class name logs a warning and contributes nothing.
    #[must_use]
    pub fn resolve_unit_stats(&self, class: Option<&str>, overrides: &StatBlock) -> UnitStats {
        let class_block = match class {
            Some(name) => match self.class(name) {
                Some(def) => def.stats.clone(),
                None => {
                    tracing::warn!(class = name, "Unknown unit class, using default stats");
                    StatBlock::default()
                }
            },
            None => StatBlock::default(),
        };
        UnitStats::resolve(&overrides.or(&class_block))
    }

    /// Production time for a class, defaulting to 30 seconds.
    #[must_use]
    pub fn production_time(&self, class: &str) -> Fixed {
        self.class(class)
            .and_then(|def| def.production_time)
            .map_or(Fixed::from_num(DEFAULT_PRODUCTION_TIME), fixed_from_f64)
    }
}

/// Faction definition as it appears in data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionDef {
    /// Faction identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Map color.
    #[serde(default = "default_faction_color")]
    pub color: String,
}

fn default_faction_color() -> String {
    Faction::FALLBACK_COLOR.to_string()
}

impl From<&FactionDef> for Faction {
    fn from(def: &FactionDef) -> Self {
        Faction::new(FactionId::new(def.id), def.name.clone(), def.color.clone())
    }
}

/// A unit to place in the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitRecord {
    /// Display name. Defaults to the class name.
    pub name: Option<String>,
    /// Unit class to look up in the catalog.
    pub class: Option<String>,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Owning faction.
    pub faction: Option<u32>,
    /// Whether the player commands this unit. Player units have no AI.
    pub player_controlled: bool,
    /// Starting level.
    pub level: Option<u32>,
    /// Per-unit stat overrides.
    pub stats: StatBlock,
    /// Patrol route for AI units.
    pub patrol_points: Vec<(f64, f64)>,
}

impl UnitRecord {
    /// Record position in simulation units.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_f64(self.x, self.y)
    }
}

/// A building to place in the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingRecord {
    /// Building type to look up in the catalog.
    pub building_type: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Owning faction.
    pub faction: Option<u32>,
    /// Whether the player owns this building.
    pub player_controlled: bool,
    /// Start as an unbuilt foundation.
    pub under_construction: bool,
    /// Rally point override.
    pub rally_point: Option<(f64, f64)>,
}

impl BuildingRecord {
    /// Record position in simulation units.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_f64(self.x, self.y)
    }
}

/// A resource node to place in the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRecord {
    /// Kind of resource.
    pub kind: ResourceKind,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Starting amount. Defaults to 1000.
    pub amount: Option<f64>,
    /// Regeneration per second.
    pub regeneration: Option<f64>,
}

impl ResourceRecord {
    /// Record position in simulation units.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_f64(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with_archer() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.classes.insert(
            "archer".to_string(),
            UnitClass {
                stats: StatBlock {
                    health: Some(70.0),
                    ranged_attack: Some(12),
                    defense: Some(2),
                    ..StatBlock::default()
                },
                production_time: Some(12.5),
                ..UnitClass::default()
            },
        );
        catalog
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let stats = Catalog::default().resolve_unit_stats(None, &StatBlock::default());
        assert_eq!(stats, UnitStats::default());
        assert_eq!(stats.health, Fixed::from_num(100));
        assert_eq!(stats.attack_range(), Fixed::from_num(50));
    }

    #[test]
    fn test_record_overrides_class_overrides_default() {
        let catalog = catalog_with_archer();
        let overrides = StatBlock {
            defense: Some(9),
            ..StatBlock::default()
        };
        let stats = catalog.resolve_unit_stats(Some("archer"), &overrides);

        assert_eq!(stats.defense, 9);
        assert_eq!(stats.health, Fixed::from_num(70));
        assert_eq!(stats.melee_attack, DEFAULT_MELEE_ATTACK);
        assert_eq!(stats.attack_range(), Fixed::from_num(150));
    }

    #[test]
    fn test_unknown_class_falls_back() {
        let stats = catalog_with_archer().resolve_unit_stats(Some("dragon"), &StatBlock::default());
        assert_eq!(stats, UnitStats::default());
    }

    #[test]
    fn test_production_time() {
        let catalog = catalog_with_archer();
        assert_eq!(catalog.production_time("archer"), Fixed::from_num(12.5));
        assert_eq!(catalog.production_time("worker"), Fixed::from_num(30));
    }

    #[test]
    fn test_learning_requirements() {
        let requirements = LearningRequirements {
            prerequisite_class: Some("soldier".to_string()),
            min_level: Some(3),
            min_attack: Some(12),
            ..LearningRequirements::default()
        };
        let veteran = Trainee {
            class: Some("soldier"),
            level: 3,
            max_health: Fixed::from_num(110),
            attack: 12,
            defense: 5,
        };
        assert!(requirements.allows(&veteran));
        assert!(!requirements.allows(&Trainee { level: 2, ..veteran }));
        assert!(!requirements.allows(&Trainee {
            class: Some("archer"),
            ..veteran
        }));
        assert!(!requirements.allows(&Trainee { class: None, ..veteran }));
        assert!(LearningRequirements::default().allows(&Trainee { class: None, ..veteran }));

        assert_eq!(requirements.duration(), Fixed::from_num(300));
        let quick = LearningRequirements {
            time: Some(4.5),
            ..LearningRequirements::default()
        };
        assert_eq!(quick.duration(), Fixed::from_num(4.5));
    }

    #[test]
    fn test_records_parse_from_ron() {
        let record: UnitRecord = ron::from_str(
            "(class: Some(\"archer\"), x: 10.0, y: 20.0, faction: Some(2), patrol_points: [(0.0, 0.0), (50.0, 0.0)])",
        )
        .unwrap();
        assert_eq!(record.position(), Vec2Fixed::from_int(10, 20));
        assert_eq!(record.patrol_points.len(), 2);
        assert!(!record.player_controlled);
    }

    #[test]
    fn test_catalog_parse_errors_name_the_source() {
        let catalog = Catalog::from_ron(
            "(classes: {\"knight\": (stats: (health: Some(150.0)), production_time: Some(20.0))})",
            "inline",
        )
        .unwrap();
        assert_eq!(catalog.production_time("knight"), Fixed::from_num(20));

        let err = Catalog::from_ron("(classes: 12)", "mods/broken.ron").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { ref path, .. } if path == "mods/broken.ron"));
    }
}
