//! Scenario loading and validation.
//!
//! A scenario is the world-setup data for one headless run: simulation
//! tunables, factions, the unit/building catalog and the starting entities.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warband_core::config::SimulationConfig;
use warband_core::data::{BuildingRecord, Catalog, FactionDef, ResourceRecord, UnitRecord};
use warband_core::error::GameError;
use warband_core::factions::Faction;
use warband_core::simulation::Simulation;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// An external catalog file was rejected by the core.
    #[error(transparent)]
    Catalog(#[from] GameError),
}

/// A complete scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Simulation tunables. Omitted fields keep their defaults.
    pub config: SimulationConfig,
    /// Factions taking part.
    pub factions: Vec<FactionDef>,
    /// Inline unit classes and building types.
    pub catalog: Catalog,
    /// Extra catalog file, relative to the scenario file. Its entries are
    /// added to the inline catalog; inline entries win on name clashes.
    pub catalog_file: Option<PathBuf>,
    /// Starting units.
    pub units: Vec<UnitRecord>,
    /// Starting buildings.
    pub buildings: Vec<BuildingRecord>,
    /// Starting resource nodes.
    pub resources: Vec<ResourceRecord>,
}

/// A reference in a scenario that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// A unit names a class the catalog lacks.
    UnknownClass {
        /// Index into `units`.
        unit: usize,
        /// The class name.
        class: String,
    },
    /// A building names a type the catalog lacks.
    UnknownBuildingType {
        /// Index into `buildings`.
        building: usize,
        /// The type name.
        building_type: String,
    },
    /// A unit or building names a faction the scenario does not define.
    UnknownFaction {
        /// What referenced it, e.g. `units[3]`.
        owner: String,
        /// The faction id.
        faction: u32,
    },
    /// A building type lists a class it produces that the catalog lacks.
    UnknownProducedClass {
        /// The building type.
        building_type: String,
        /// The class name.
        class: String,
    },
    /// A class can only be learned from a class the catalog lacks.
    UnknownPrerequisiteClass {
        /// The class being learned.
        class: String,
        /// The missing prerequisite.
        prerequisite: String,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownClass { unit, class } => write!(f, "units[{unit}]: unknown class '{class}'"),
            Self::UnknownBuildingType {
                building,
                building_type,
            } => write!(f, "buildings[{building}]: unknown building type '{building_type}'"),
            Self::UnknownFaction { owner, faction } => write!(f, "{owner}: unknown faction {faction}"),
            Self::UnknownProducedClass { building_type, class } => {
                write!(f, "building type '{building_type}' produces unknown class '{class}'")
            }
            Self::UnknownPrerequisiteClass { class, prerequisite } => {
                write!(f, "class '{class}' requires unknown class '{prerequisite}'")
            }
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file, merging its `catalog_file` if set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let mut scenario = Self::from_ron_str(&contents)?;

        if let Some(file) = scenario.catalog_file.clone() {
            let catalog_path = path.parent().map_or_else(|| file.clone(), |dir| dir.join(&file));
            let text = std::fs::read_to_string(&catalog_path)?;
            let external = Catalog::from_ron(&text, &catalog_path.display().to_string())?;
            scenario.merge_catalog(external);
        }

        tracing::info!(
            name = %scenario.name,
            units = scenario.units.len(),
            buildings = scenario.buildings.len(),
            resources = scenario.resources.len(),
            "Scenario loaded"
        );
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    fn merge_catalog(&mut self, external: Catalog) {
        for (name, class) in external.classes {
            self.catalog.classes.entry(name).or_insert(class);
        }
        for (name, building) in external.buildings {
            self.catalog.buildings.entry(name).or_insert(building);
        }
    }

    /// Report every class, building type and faction reference that does
    /// not resolve. The core tolerates all of them with defaults, so these
    /// are warnings about the data rather than hard errors.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let factions: BTreeSet<u32> = self.factions.iter().map(|f| f.id).collect();
        let mut issues = Vec::new();

        let check_faction = |owner: String, faction: Option<u32>, issues: &mut Vec<ValidationIssue>| {
            if let Some(faction) = faction.filter(|id| !factions.contains(id)) {
                issues.push(ValidationIssue::UnknownFaction { owner, faction });
            }
        };

        for (i, unit) in self.units.iter().enumerate() {
            if let Some(class) = unit.class.as_ref().filter(|c| self.catalog.class(c).is_none()) {
                issues.push(ValidationIssue::UnknownClass {
                    unit: i,
                    class: class.clone(),
                });
            }
            check_faction(format!("units[{i}]"), unit.faction, &mut issues);
        }

        for (i, building) in self.buildings.iter().enumerate() {
            if self.catalog.building(&building.building_type).is_none() {
                issues.push(ValidationIssue::UnknownBuildingType {
                    building: i,
                    building_type: building.building_type.clone(),
                });
            }
            check_faction(format!("buildings[{i}]"), building.faction, &mut issues);
        }

        for (name, building) in &self.catalog.buildings {
            for class in building.produces.iter().filter(|c| self.catalog.class(c).is_none()) {
                issues.push(ValidationIssue::UnknownProducedClass {
                    building_type: name.clone(),
                    class: class.clone(),
                });
            }
        }

        for (name, class) in &self.catalog.classes {
            let prerequisite = class.learning.prerequisite_class.as_ref();
            if let Some(prerequisite) = prerequisite.filter(|c| self.catalog.class(c).is_none()) {
                issues.push(ValidationIssue::UnknownPrerequisiteClass {
                    class: name.clone(),
                    prerequisite: prerequisite.clone(),
                });
            }
        }

        issues
    }

    /// Build a fresh simulation with factions registered and every starting
    /// entity spawned, in file order.
    #[must_use]
    pub fn build(&self) -> Simulation {
        let mut sim = self.empty_simulation();
        for unit in &self.units {
            sim.spawn_unit(unit);
        }
        for building in &self.buildings {
            sim.spawn_building(building);
        }
        for resource in &self.resources {
            sim.spawn_resource(resource);
        }
        tracing::debug!(entities = sim.entities().len(), "Scenario world built");
        sim
    }

    /// A simulation with this scenario's config, catalog and factions but
    /// no entities.
    #[must_use]
    pub fn empty_simulation(&self) -> Simulation {
        let mut sim = Simulation::with_config(self.config.clone()).with_catalog(self.catalog.clone());
        for faction in &self.factions {
            sim.register_faction(Faction::from(faction));
        }
        sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
        Scenario(
            name: "Test",
            config: (seed: 7),
            factions: [(id: 1, name: "Blue"), (id: 2, name: "Red", color: "#cc0000")],
            catalog: (
                classes: {"archer": (stats: (ranged_attack: Some(8)))},
                buildings: {"barracks": (produces: ["archer", "knight"])},
            ),
            units: [
                (class: Some("archer"), x: 10.0, faction: Some(1)),
                (class: Some("wizard"), x: 20.0, faction: Some(3)),
            ],
            buildings: [(building_type: "barracks", faction: Some(2))],
            resources: [(kind: Wood, x: 100.0, amount: Some(50.0))],
        )
    "##;

    #[test]
    fn test_parse_from_ron() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.config.seed, 7);
        assert_eq!(scenario.factions[0].color, Faction::FALLBACK_COLOR);
        assert_eq!(scenario.units.len(), 2);
    }

    #[test]
    fn test_validate_reports_unresolved_references() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        let issues = scenario.validate();
        assert_eq!(
            issues,
            vec![
                ValidationIssue::UnknownClass {
                    unit: 1,
                    class: "wizard".to_string(),
                },
                ValidationIssue::UnknownFaction {
                    owner: "units[1]".to_string(),
                    faction: 3,
                },
                ValidationIssue::UnknownProducedClass {
                    building_type: "barracks".to_string(),
                    class: "knight".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_validate_reports_unknown_prerequisite() {
        let text = r#"
            Scenario(
                catalog: (
                    classes: {
                        "soldier": (),
                        "knight": (learning: (prerequisite_class: Some("squire"))),
                    },
                ),
            )
        "#;
        let issues = Scenario::from_ron_str(text).unwrap().validate();
        assert_eq!(
            issues,
            vec![ValidationIssue::UnknownPrerequisiteClass {
                class: "knight".to_string(),
                prerequisite: "squire".to_string(),
            }]
        );
        assert_eq!(issues[0].to_string(), "class 'knight' requires unknown class 'squire'");
    }

    #[test]
    fn test_build_spawns_everything() {
        let sim = Scenario::from_ron_str(SAMPLE).unwrap().build();
        assert_eq!(sim.entities().len(), 4);
        // The unknown faction 3 is registered with a fallback.
        assert_eq!(sim.factions().len(), 3);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
