//! Retraining units into new classes.

use warband_core::components::EntityId;
use warband_core::data::{BuildingRecord, Catalog, LearningRequirements, UnitClass, UnitRecord};
use warband_core::error::GameError;
use warband_core::events::Notification;
use warband_core::simulation::Simulation;
use warband_core::snapshot::Snapshot;
use warband_test_utils::determinism::frame_delta;
use warband_test_utils::fixtures::{fixed_f, sim_with_factions, PLAYER};

fn school_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.classes.insert("soldier".to_string(), UnitClass::default());
    catalog.classes.insert(
        "militia".to_string(),
        UnitClass {
            locked: true,
            ..UnitClass::default()
        },
    );
    catalog.classes.insert(
        "knight".to_string(),
        UnitClass {
            learning: LearningRequirements {
                time: Some(0.5),
                prerequisite_class: Some("soldier".to_string()),
                ..LearningRequirements::default()
            },
            ..UnitClass::default()
        },
    );
    catalog.classes.insert(
        "captain".to_string(),
        UnitClass {
            learning: LearningRequirements {
                time: Some(10.0),
                min_level: Some(3),
                ..LearningRequirements::default()
            },
            ..UnitClass::default()
        },
    );
    catalog
}

fn school() -> Simulation {
    sim_with_factions().with_catalog(school_catalog())
}

fn recruit(sim: &mut Simulation, class: &str) -> EntityId {
    sim.spawn_unit(&UnitRecord {
        class: Some(class.to_string()),
        faction: Some(PLAYER),
        player_controlled: true,
        ..UnitRecord::default()
    })
}

fn class_of(sim: &Simulation, id: EntityId) -> Option<&str> {
    sim.entity(id).and_then(|e| e.class.as_deref())
}

#[test]
fn test_retraining_changes_class_after_training_time() {
    let mut sim = school();
    let unit = recruit(&mut sim, "soldier");
    let health_before = sim.entity(unit).unwrap().health;

    let duration = sim.start_learning(unit, "knight").unwrap();
    assert_eq!(duration, fixed_f(0.5));

    // 0.5 seconds at 30 ticks per second.
    let mut finished_at = None;
    for tick in 1..=40 {
        let events = sim.tick(frame_delta());
        let done = events.notifications.iter().any(|n| {
            matches!(n, Notification::LearningComplete { entity, class } if *entity == unit && class == "knight")
        });
        if done {
            finished_at = Some(tick);
            break;
        }
        assert_eq!(class_of(&sim, unit), Some("soldier"));
    }

    let tick = finished_at.expect("training never finished");
    assert!((15..=16).contains(&tick), "finished on tick {tick}");
    let trained = sim.entity(unit).unwrap();
    assert_eq!(trained.class.as_deref(), Some("knight"));
    assert!(trained.learning.is_none());
    assert_eq!(trained.health, health_before);
}

#[test]
fn test_learning_requirements_are_enforced() {
    let mut sim = school();
    let soldier = recruit(&mut sim, "soldier");
    let militia = recruit(&mut sim, "militia");
    let keep = sim.spawn_building(&BuildingRecord {
        building_type: "keep".to_string(),
        faction: Some(PLAYER),
        ..BuildingRecord::default()
    });

    assert!(matches!(
        sim.start_learning(soldier, "paladin"),
        Err(GameError::UnknownClass(name)) if name == "paladin"
    ));
    assert!(matches!(
        sim.start_learning(999, "knight"),
        Err(GameError::EntityNotFound(999))
    ));
    assert!(matches!(sim.start_learning(keep, "knight"), Err(GameError::InvalidState(_))));
    assert!(matches!(
        sim.start_learning(militia, "captain"),
        Err(GameError::RequirementsNotMet { entity, .. }) if entity == militia
    ));
    assert!(matches!(
        sim.start_learning(soldier, "captain"),
        Err(GameError::RequirementsNotMet { .. })
    ));
    assert!(sim.entity(soldier).unwrap().learning.is_none());

    assert_eq!(sim.grant_experience(soldier, 350).unwrap(), 2);
    assert_eq!(sim.start_learning(soldier, "captain").unwrap(), fixed_f(10.0));
}

#[test]
fn test_prerequisite_class_is_checked() {
    let mut sim = school();
    let captain = recruit(&mut sim, "captain");
    assert!(matches!(
        sim.start_learning(captain, "knight"),
        Err(GameError::RequirementsNotMet { .. })
    ));
}

#[test]
fn test_cancel_learning_keeps_old_class() {
    let mut sim = school();
    let unit = recruit(&mut sim, "soldier");
    sim.start_learning(unit, "knight").unwrap();
    for _ in 0..5 {
        sim.tick(frame_delta());
    }

    assert_eq!(sim.cancel_learning(unit).unwrap(), Some("knight".to_string()));
    assert_eq!(sim.cancel_learning(unit).unwrap(), None);
    for _ in 0..30 {
        let events = sim.tick(frame_delta());
        assert!(!events
            .notifications
            .iter()
            .any(|n| matches!(n, Notification::LearningComplete { .. })));
    }
    assert_eq!(class_of(&sim, unit), Some("soldier"));
    assert!(matches!(sim.cancel_learning(404), Err(GameError::EntityNotFound(404))));
}

#[test]
fn test_starting_again_replaces_training() {
    let mut sim = school();
    let unit = recruit(&mut sim, "soldier");
    sim.start_learning(unit, "knight").unwrap();
    sim.grant_experience(unit, 350).unwrap();
    sim.start_learning(unit, "captain").unwrap();

    let learning = sim.entity(unit).unwrap().learning.clone().unwrap();
    assert_eq!(learning.target_class, "captain");
    assert_eq!(learning.time_left, fixed_f(10.0));
}

#[test]
fn test_training_is_not_saved() {
    let mut sim = school();
    let unit = recruit(&mut sim, "soldier");
    sim.start_learning(unit, "knight").unwrap();

    let snapshot = Snapshot::from_bytes(&sim.snapshot().to_bytes().unwrap()).unwrap();
    let restored = Simulation::from_snapshot(&snapshot, sim.config().clone(), sim.catalog().clone()).unwrap();

    let entity = restored.entity(unit).unwrap();
    assert_eq!(entity.class.as_deref(), Some("soldier"));
    assert!(entity.learning.is_none());
}
