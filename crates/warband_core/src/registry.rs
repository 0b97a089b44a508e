//! Entity storage.
//!
//! The [`EntityRegistry`] exclusively owns every entity. Other entities only
//! ever refer to each other by [`EntityId`], and such references must be
//! revalidated through [`EntityRegistry::live`] on every read: an id may
//! point at an entity that died this tick, was already removed, or is
//! sheltering inside a building.

use std::collections::HashMap;

use crate::components::{
    Ai, BuildingState, Combat, EntityId, EntityKind, Health, Learning, Movement, ProductionOrder,
    Progression, ResourceNode,
};
use crate::events::{Notification, NotificationQueue};
use crate::factions::FactionId;
use crate::math::{Fixed, Vec2Fixed};

/// Max health gained per level.
pub const HEALTH_PER_LEVEL: i32 = 5;

/// An entity with optional components.
///
/// Capabilities are checked by presence: a system that needs combat simply
/// skips entities whose `combat` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Unit, building or resource.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Unit class or building type this entity was built from.
    pub class: Option<String>,
    /// World position.
    pub position: Vec2Fixed,
    /// Unit vector pointing where the entity last moved.
    pub facing: Vec2Fixed,
    /// Cleared when the entity dies; dead entities are pruned at tick end.
    pub alive: bool,
    /// Selected by the player.
    pub selected: bool,
    /// Commanded by the player rather than AI.
    pub player_controlled: bool,
    /// Allegiance. `None` for neutral objects such as resource nodes.
    pub faction: Option<FactionId>,
    /// Health for damageable entities.
    pub health: Option<Health>,
    /// Movement for mobile entities.
    pub movement: Option<Movement>,
    /// Combat stats and engagement.
    pub combat: Option<Combat>,
    /// Behavior for non-player entities.
    pub ai: Option<Ai>,
    /// Gatherable amount for resource nodes.
    pub resource: Option<ResourceNode>,
    /// Construction and production for buildings.
    pub building: Option<BuildingState>,
    /// Level and experience for units.
    pub progression: Option<Progression>,
    /// Retraining in progress.
    pub learning: Option<Learning>,
    /// Building this unit is sheltering in. Garrisoned units keep their
    /// own bookkeeping but are invisible to systems and commands.
    pub garrisoned_in: Option<EntityId>,
}

impl Entity {
    /// Create a live entity with no components.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>, position: Vec2Fixed) -> Self {
        Self {
            id: 0,
            kind,
            name: name.into(),
            class: None,
            position,
            facing: Vec2Fixed::new(Fixed::ONE, Fixed::ZERO),
            alive: true,
            selected: false,
            player_controlled: false,
            faction: None,
            health: None,
            movement: None,
            combat: None,
            ai: None,
            resource: None,
            building: None,
            progression: None,
            learning: None,
            garrisoned_in: None,
        }
    }

    /// Check if the entity still takes part in the simulation.
    ///
    /// An entity at zero health counts as dead even before its flag is
    /// cleared.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive && !self.health.is_some_and(|h| h.is_dead())
    }

    /// Check if the entity is inside a building.
    #[must_use]
    pub const fn is_garrisoned(&self) -> bool {
        self.garrisoned_in.is_some()
    }

    /// Alive and out in the world, where systems and commands can reach it.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_alive() && !self.is_garrisoned()
    }

    /// Flag the entity dead and drop everything it was doing.
    pub fn kill(&mut self) {
        self.alive = false;
        if let Some(combat) = self.combat.as_mut() {
            combat.disengage();
        }
        if let Some(movement) = self.movement.as_mut() {
            movement.stop();
        }
        if let Some(ai) = self.ai.as_mut() {
            ai.reset();
        }
    }

    /// Per-entity bookkeeping for one tick.
    ///
    /// Regenerates health and resources, advances retraining, construction
    /// and production, and flags the entity dead if its health ran out.
    /// Returns a finished production order for the caller to spawn.
    pub fn update(&mut self, delta: Fixed, notifications: &mut NotificationQueue) -> Option<ProductionOrder> {
        if !self.alive {
            return None;
        }
        if self.health.is_some_and(|h| h.is_dead()) {
            self.kill();
            notifications.push(Notification::Died {
                entity: self.id,
                killer: None,
            });
            return None;
        }

        if let Some(health) = self.health.as_mut() {
            health.regenerate(delta);
        }
        if let Some(resource) = self.resource.as_mut() {
            resource.regenerate(delta);
        }
        self.advance_learning(delta, notifications);

        let building = self.building.as_mut()?;
        if building.advance_construction(delta) {
            tracing::debug!(building = self.id, kind = %building.building_type, "Construction complete");
            notifications.push(Notification::ConstructionComplete { building: self.id });
        }
        building.advance_production(delta)
    }

    fn advance_learning(&mut self, delta: Fixed, notifications: &mut NotificationQueue) {
        let Some(learning) = self.learning.as_mut() else {
            return;
        };
        if !learning.advance(delta) {
            return;
        }
        let class = learning.target_class.clone();
        self.learning = None;
        self.class = Some(class.clone());
        tracing::debug!(entity = self.id, %class, "Retraining complete");
        notifications.push(Notification::LearningComplete { entity: self.id, class });
    }

    /// Add experience, applying every level-up it earns.
    ///
    /// Each level raises max health by 5, restores health to full and emits
    /// [`Notification::LevelUp`]. Returns the number of levels gained.
    pub fn grant_experience(&mut self, amount: u32, notifications: &mut NotificationQueue) -> u32 {
        let Some(progression) = self.progression.as_mut() else {
            return 0;
        };
        let gained = progression.gain(amount);
        if gained == 0 {
            return 0;
        }
        let reached = progression.level;

        for level in reached.saturating_sub(gained).saturating_add(1)..=reached {
            if let Some(health) = self.health.as_mut() {
                health.set_max(health.max.saturating_add(Fixed::from_num(HEALTH_PER_LEVEL)));
                health.current = health.max;
            }
            notifications.push(Notification::LevelUp {
                entity: self.id,
                level,
            });
        }
        gained
    }
}

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) lookup by id. Systems iterate through
/// [`sorted_ids`](Self::sorted_ids), which is registry insertion order
/// because ids are never reused.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity, assigning and returning its id.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Insert an entity under the id it already carries.
    ///
    /// Used when rehydrating a snapshot. Later inserts get ids above it.
    pub fn insert_with_id(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.next_id = self.next_id.max(id + 1);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by id.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by id, dead or alive.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by id, dead or alive.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Dereference a weak reference: the entity, only if it is alive and
    /// not garrisoned.
    #[must_use]
    pub fn live(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).filter(|e| e.is_active())
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of stored entities, including ones flagged dead this tick.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Id the next inserted entity will receive.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Get sorted entity ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate entities in id order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.sorted_ids().into_iter().filter_map(|id| self.entities.get(&id))
    }

    /// Remove every entity that is no longer alive, returning their ids in
    /// ascending order.
    pub fn retain_alive(&mut self) -> Vec<EntityId> {
        let mut removed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !e.is_alive())
            .map(|e| e.id)
            .collect();
        removed.sort_unstable();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(x: i32) -> Entity {
        let mut entity = Entity::new(EntityKind::Unit, "unit", Vec2Fixed::from_int(x, 0));
        entity.health = Some(Health::new(Fixed::from_num(10)));
        entity.progression = Some(Progression::default());
        entity
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut registry = EntityRegistry::new();
        let a = registry.insert(unit(0));
        let b = registry.insert(unit(1));
        assert!(b > a);
        assert_eq!(registry.sorted_ids(), vec![a, b]);
    }

    #[test]
    fn test_live_filters_dead() {
        let mut registry = EntityRegistry::new();
        let id = registry.insert(unit(0));
        assert!(registry.live(id).is_some());

        registry.get_mut(id).unwrap().health.as_mut().unwrap().apply_damage(Fixed::from_num(10));
        assert!(registry.live(id).is_none());
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn test_live_skips_garrisoned() {
        let mut registry = EntityRegistry::new();
        let id = registry.insert(unit(0));
        registry.get_mut(id).unwrap().garrisoned_in = Some(77);

        assert!(registry.live(id).is_none());
        assert!(registry.get(id).unwrap().is_alive());
        assert!(registry.retain_alive().is_empty());
    }

    #[test]
    fn test_update_finishes_learning() {
        let mut entity = unit(0);
        entity.id = 5;
        entity.class = Some("soldier".to_string());
        entity.learning = Some(Learning::new("knight", Fixed::from_num(2)));
        let mut queue = NotificationQueue::new();

        entity.update(Fixed::ONE, &mut queue);
        assert_eq!(entity.class.as_deref(), Some("soldier"));
        assert!(queue.is_empty());

        entity.update(Fixed::ONE, &mut queue);
        assert_eq!(entity.class.as_deref(), Some("knight"));
        assert!(entity.learning.is_none());
        assert_eq!(
            queue.drain(),
            vec![Notification::LearningComplete {
                entity: 5,
                class: "knight".to_string(),
            }]
        );
    }

    #[test]
    fn test_retain_alive_removes_dead() {
        let mut registry = EntityRegistry::new();
        let a = registry.insert(unit(0));
        let b = registry.insert(unit(1));
        registry.get_mut(a).unwrap().kill();

        assert_eq!(registry.retain_alive(), vec![a]);
        assert!(!registry.contains(a));
        assert!(registry.contains(b));
    }

    #[test]
    fn test_insert_with_id_bumps_counter() {
        let mut registry = EntityRegistry::new();
        let mut entity = unit(0);
        entity.id = 40;
        registry.insert_with_id(entity);
        assert_eq!(registry.insert(unit(1)), 41);
    }

    #[test]
    fn test_update_flags_zero_health_dead() {
        let mut entity = unit(0);
        entity.id = 9;
        entity.health.as_mut().unwrap().apply_damage(Fixed::from_num(10));
        let mut queue = NotificationQueue::new();

        assert!(entity.update(Fixed::ONE, &mut queue).is_none());
        assert!(!entity.alive);
        assert_eq!(queue.drain(), vec![Notification::Died { entity: 9, killer: None }]);
    }

    #[test]
    fn test_grant_experience_levels_up() {
        let mut entity = unit(0);
        entity.id = 2;
        entity.health.as_mut().unwrap().apply_damage(Fixed::from_num(4));
        let mut queue = NotificationQueue::new();

        assert_eq!(entity.grant_experience(350, &mut queue), 2);
        let health = entity.health.unwrap();
        assert_eq!(health.max, Fixed::from_num(20));
        assert_eq!(health.current, health.max);
        assert_eq!(
            queue.drain(),
            vec![
                Notification::LevelUp { entity: 2, level: 2 },
                Notification::LevelUp { entity: 2, level: 3 },
            ]
        );
    }
}
