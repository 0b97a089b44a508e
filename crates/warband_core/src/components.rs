//! Component definitions.
//!
//! Components are plain data attached to an entity as optional fields.
//! A system that needs a component it cannot find skips the entity for
//! that tick; nothing here is fatal.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::data::UnitStats;
use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Default AI decision interval in seconds.
pub const DEFAULT_DECISION_INTERVAL: i32 = 1;

/// Default unit health regeneration (HP per second).
pub const UNIT_REGENERATION_PER_SECOND: f64 = 0.5;

/// Broad classification of an entity, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A mobile unit (worker, warrior, hero).
    Unit,
    /// A structure.
    Building,
    /// A gatherable resource node.
    Resource,
}

impl EntityKind {
    /// Lowercase name used in logs and snapshots.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Building => "building",
            Self::Resource => "resource",
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health component for damageable entities.
///
/// Invariant: `0 <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Health {
    /// Current health points.
    pub current: Fixed,
    /// Maximum health points.
    pub max: Fixed,
    /// Regeneration in health points per second.
    pub regeneration: Fixed,
}

impl Health {
    /// Create new health component at full health with no regeneration.
    #[must_use]
    pub fn new(max: Fixed) -> Self {
        let max = max.max(Fixed::ZERO);
        Self {
            current: max,
            max,
            regeneration: Fixed::ZERO,
        }
    }

    /// Builder method to set regeneration per second.
    #[must_use]
    pub fn with_regeneration(mut self, per_second: Fixed) -> Self {
        self.regeneration = per_second;
        self
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= Fixed::ZERO
    }

    /// Check if entity is at full health.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    ///
    /// Health never drops below zero.
    pub fn apply_damage(&mut self, amount: Fixed) -> Fixed {
        let actual = amount.max(Fixed::ZERO).min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal the entity, returning actual amount healed.
    ///
    /// Health never exceeds `max`.
    pub fn heal(&mut self, amount: Fixed) -> Fixed {
        let headroom = (self.max - self.current).max(Fixed::ZERO);
        let actual = amount.max(Fixed::ZERO).min(headroom);
        self.current += actual;
        actual
    }

    /// Apply regeneration for `delta` seconds. Dead entities do not regenerate.
    pub fn regenerate(&mut self, delta: Fixed) -> Fixed {
        if self.is_dead() || self.is_full() || self.regeneration <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        self.heal(self.regeneration.saturating_mul(delta))
    }

    /// Change maximum health, clamping current health into range.
    pub fn set_max(&mut self, max: Fixed) {
        self.max = max.max(Fixed::ZERO);
        self.current = self.current.min(self.max);
    }

    /// Health as a fraction in `[0, 1]` for presentation.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= Fixed::ZERO {
            0.0
        } else {
            (self.current / self.max).to_num()
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Movement component for mobile entities.
///
/// Invariant: `is_moving == false` means the entity does not move this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Movement {
    /// Movement speed in world units per second.
    pub speed: Fixed,
    /// Current destination.
    pub target: Vec2Fixed,
    /// Whether the entity is travelling toward `target`.
    pub is_moving: bool,
}

impl Movement {
    /// Create a stationary movement component parked at `position`.
    #[must_use]
    pub const fn new(speed: Fixed, position: Vec2Fixed) -> Self {
        Self {
            speed,
            target: position,
            is_moving: false,
        }
    }

    /// Start travelling toward a destination.
    pub fn move_to(&mut self, target: Vec2Fixed) {
        self.target = target;
        self.is_moving = true;
    }

    /// Stop in place. The last destination is kept but inactive.
    pub fn stop(&mut self) {
        self.is_moving = false;
    }
}

// ============================================================================
// Combat
// ============================================================================

/// Combat component: stats plus current engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combat {
    /// Damage dealt per attack before defense.
    pub attack_power: u32,
    /// Flat reduction applied to incoming attacks.
    pub defense: u32,
    /// Maximum distance at which attacks land.
    pub attack_range: Fixed,
    /// Attacks per second.
    pub attack_speed: Fixed,
    /// Radius used when automatically acquiring targets.
    pub detection_range: Fixed,
    /// Current target. Weak: revalidated on every read.
    pub target: Option<EntityId>,
    /// Whether the entity is engaged.
    pub is_attacking: bool,
    /// Seconds until the next legal attack. May go negative.
    pub attack_cooldown: Fixed,
    /// Acquire the nearest hostile automatically when idle.
    pub auto_attack: bool,
}

impl Combat {
    /// Create combat stats with one attack per second and no auto-attack.
    #[must_use]
    pub fn new(attack_power: u32, defense: u32, attack_range: Fixed) -> Self {
        Self {
            attack_power,
            defense,
            attack_range,
            attack_speed: Fixed::ONE,
            detection_range: Fixed::from_num(150),
            target: None,
            is_attacking: false,
            attack_cooldown: Fixed::ZERO,
            auto_attack: false,
        }
    }

    /// Builder method to set attacks per second.
    #[must_use]
    pub fn with_attack_speed(mut self, attack_speed: Fixed) -> Self {
        self.attack_speed = attack_speed;
        self
    }

    /// Builder method to set detection range.
    #[must_use]
    pub fn with_detection_range(mut self, detection_range: Fixed) -> Self {
        self.detection_range = detection_range;
        self
    }

    /// Builder method to enable or disable auto-attack.
    #[must_use]
    pub fn with_auto_attack(mut self, auto_attack: bool) -> Self {
        self.auto_attack = auto_attack;
        self
    }

    /// Seconds between attacks, `1 / attack_speed`.
    ///
    /// A non-positive attack speed never recovers from its first attack.
    #[must_use]
    pub fn attack_interval(&self) -> Fixed {
        if self.attack_speed <= Fixed::ZERO {
            Fixed::MAX
        } else {
            Fixed::ONE / self.attack_speed
        }
    }

    /// Check if the cooldown allows an attack now.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.attack_cooldown <= Fixed::ZERO
    }

    /// Engage a target.
    pub fn engage(&mut self, target: EntityId) {
        self.target = Some(target);
        self.is_attacking = true;
    }

    /// Drop the current target.
    pub fn disengage(&mut self) {
        self.target = None;
        self.is_attacking = false;
    }
}

// ============================================================================
// AI
// ============================================================================

/// Behavior state of an AI-controlled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    /// Looking for something to do.
    #[default]
    Idle,
    /// Walking to a point.
    Moving,
    /// Pursuing an enemy.
    Attacking,
    /// Working a resource node.
    Gathering,
    /// Walking a patrol route.
    Patrolling,
}

impl AiState {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Attacking => "attacking",
            Self::Gathering => "gathering",
            Self::Patrolling => "patrolling",
        }
    }
}

/// What an AI entity is focused on. Entity references are weak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiTarget {
    /// A hostile entity.
    Entity(EntityId),
    /// A resource node.
    Resource(EntityId),
    /// A location.
    Point(Vec2Fixed),
}

impl AiTarget {
    /// Entity referenced by this target, if any.
    #[must_use]
    pub const fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) | Self::Resource(id) => Some(*id),
            Self::Point(_) => None,
        }
    }
}

/// AI component for non-player entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ai {
    /// Current behavior state.
    pub state: AiState,
    /// Current focus.
    pub target: Option<AiTarget>,
    /// Seconds until the next decision.
    pub decision_timer: Fixed,
    /// Seconds between decisions.
    pub decision_interval: Fixed,
    /// Patrol route, walked cyclically.
    pub patrol_points: Vec<Vec2Fixed>,
    /// Index of the patrol point currently headed for.
    pub current_patrol_point: usize,
    /// Reserved policy tunable.
    pub aggressiveness: Fixed,
    /// Reserved policy tunable.
    pub intelligence: Fixed,
}

impl Ai {
    /// Create an idle AI that decides on its first tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AiState::Idle,
            target: None,
            decision_timer: Fixed::ZERO,
            decision_interval: Fixed::from_num(DEFAULT_DECISION_INTERVAL),
            patrol_points: Vec::new(),
            current_patrol_point: 0,
            aggressiveness: Fixed::from_num(0.7),
            intelligence: Fixed::from_num(0.5),
        }
    }

    /// Builder method to set the patrol route.
    #[must_use]
    pub fn with_patrol_points(mut self, points: Vec<Vec2Fixed>) -> Self {
        self.patrol_points = points;
        self
    }

    /// Builder method to set the decision interval.
    #[must_use]
    pub fn with_decision_interval(mut self, interval: Fixed) -> Self {
        self.decision_interval = interval;
        self
    }

    /// Switch state and focus together.
    pub fn transition(&mut self, state: AiState, target: Option<AiTarget>) {
        self.state = state;
        self.target = target;
    }

    /// Drop focus and go idle.
    pub fn reset(&mut self) {
        self.transition(AiState::Idle, None);
    }
}

impl Default for Ai {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Kind of gatherable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Gold.
    #[default]
    Gold,
    /// Wood.
    Wood,
    /// Stone.
    Stone,
    /// Food.
    Food,
    /// Mana.
    Mana,
}

/// Resource node component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceNode {
    /// Kind of resource.
    pub kind: ResourceKind,
    /// Remaining amount.
    pub amount: Fixed,
    /// Cap for regeneration.
    pub max_amount: Fixed,
    /// Amount regenerated per second.
    pub regeneration: Fixed,
}

impl ResourceNode {
    /// Create a full, non-regenerating node.
    #[must_use]
    pub fn new(kind: ResourceKind, amount: Fixed) -> Self {
        Self {
            kind,
            amount,
            max_amount: amount,
            regeneration: Fixed::ZERO,
        }
    }

    /// Remove up to `requested` units, returning what was actually taken.
    pub fn gather(&mut self, requested: Fixed) -> Fixed {
        let taken = requested.max(Fixed::ZERO).min(self.amount);
        self.amount -= taken;
        taken
    }

    /// Check if nothing is left.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.amount <= Fixed::ZERO
    }

    /// Regenerate toward `max_amount`.
    pub fn regenerate(&mut self, delta: Fixed) {
        if self.regeneration > Fixed::ZERO && self.amount < self.max_amount {
            self.amount = (self.amount + self.regeneration.saturating_mul(delta)).min(self.max_amount);
        }
    }
}

// ============================================================================
// Progression
// ============================================================================

/// Level and experience for units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Progression {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub experience: u32,
}

impl Progression {
    /// Create a progression at the given level with no experience.
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self {
            level: if level == 0 { 1 } else { level },
            experience: 0,
        }
    }

    /// Experience needed to leave the current level.
    ///
    /// A level of 0 is treated as level 1.
    #[must_use]
    pub const fn experience_to_next(&self) -> u32 {
        let level = if self.level == 0 { 1 } else { self.level };
        level
            .saturating_mul(100)
            .saturating_add((level - 1).saturating_mul(50))
    }

    /// Add experience and return how many levels were gained.
    pub fn gain(&mut self, amount: u32) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.experience >= self.experience_to_next() {
            self.experience -= self.experience_to_next();
            self.level = self.level.max(1).saturating_add(1);
            gained += 1;
        }
        gained
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(1)
    }
}

// ============================================================================
// Retraining
// ============================================================================

/// A unit retraining into another class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Learning {
    /// Class the unit becomes when training ends.
    pub target_class: String,
    /// Seconds of training left.
    pub time_left: Fixed,
    /// Seconds the training takes in total.
    pub total_time: Fixed,
}

impl Learning {
    /// Start training toward `target_class` for `duration` seconds.
    #[must_use]
    pub fn new(target_class: impl Into<String>, duration: Fixed) -> Self {
        let duration = duration.max(Fixed::ZERO);
        Self {
            target_class: target_class.into(),
            time_left: duration,
            total_time: duration,
        }
    }

    /// Count down. Returns `true` once no time is left.
    pub fn advance(&mut self, delta: Fixed) -> bool {
        self.time_left = (self.time_left - delta).max(Fixed::ZERO);
        self.time_left == Fixed::ZERO
    }

    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> Fixed {
        if self.total_time <= Fixed::ZERO {
            return Fixed::ONE;
        }
        Fixed::ONE - self.time_left / self.total_time
    }
}

// ============================================================================
// Buildings
// ============================================================================

/// A unit waiting in, or moving through, a production queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductionOrder {
    /// Class name the unit was ordered as.
    pub class: String,
    /// Resolved stats for the produced unit.
    pub stats: UnitStats,
    /// Seconds of production required.
    pub duration: Fixed,
}

/// Construction and production state for buildings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildingState {
    /// Building type name.
    pub building_type: String,
    /// Whether construction has finished.
    pub constructed: bool,
    /// Construction progress in `[0, 1]`.
    pub construction_progress: Fixed,
    /// Seconds to construct from scratch.
    pub construction_time: Fixed,
    /// Orders waiting behind `current`.
    pub queue: VecDeque<ProductionOrder>,
    /// Order in production.
    pub current: Option<ProductionOrder>,
    /// Seconds spent on `current`.
    pub progress: Fixed,
    /// Where produced units appear.
    pub rally_point: Vec2Fixed,
    /// Units the building can shelter at once.
    pub garrison_capacity: u32,
    /// Sheltered units in the order they entered.
    pub garrisoned: Vec<EntityId>,
}

impl BuildingState {
    /// Create a finished building of the given type.
    #[must_use]
    pub fn new(building_type: impl Into<String>, construction_time: Fixed, rally_point: Vec2Fixed) -> Self {
        Self {
            building_type: building_type.into(),
            constructed: true,
            construction_progress: Fixed::ONE,
            construction_time,
            queue: VecDeque::new(),
            current: None,
            progress: Fixed::ZERO,
            rally_point,
            garrison_capacity: 0,
            garrisoned: Vec::new(),
        }
    }

    /// Builder method to set the garrison capacity.
    #[must_use]
    pub fn with_garrison_capacity(mut self, capacity: u32) -> Self {
        self.garrison_capacity = capacity;
        self
    }

    /// Check if another unit fits inside.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.garrisoned.len() < self.garrison_capacity as usize
    }

    /// Shelter a unit. Returns `false` if the building is full or already
    /// holds it.
    pub fn garrison(&mut self, unit: EntityId) -> bool {
        if !self.has_room() || self.garrisoned.contains(&unit) {
            return false;
        }
        self.garrisoned.push(unit);
        true
    }

    /// Let a unit out. Returns `false` if it was not inside.
    pub fn ungarrison(&mut self, unit: EntityId) -> bool {
        let before = self.garrisoned.len();
        self.garrisoned.retain(|&id| id != unit);
        self.garrisoned.len() != before
    }

    /// Reset to an unbuilt foundation.
    pub fn start_construction(&mut self) {
        self.constructed = false;
        self.construction_progress = Fixed::ZERO;
    }

    /// Advance construction. Returns `true` on the tick construction completes.
    pub fn advance_construction(&mut self, delta: Fixed) -> bool {
        if self.constructed {
            return false;
        }
        if self.construction_time <= Fixed::ZERO {
            self.construction_progress = Fixed::ONE;
        } else {
            self.construction_progress += delta / self.construction_time;
        }
        if self.construction_progress >= Fixed::ONE {
            self.construction_progress = Fixed::ONE;
            self.constructed = true;
            return true;
        }
        false
    }

    /// Append an order; it starts immediately if nothing is in production.
    pub fn enqueue(&mut self, order: ProductionOrder) {
        self.queue.push_back(order);
        if self.current.is_none() {
            self.start_next();
        }
    }

    /// Advance production. Returns the finished order, if one completed.
    pub fn advance_production(&mut self, delta: Fixed) -> Option<ProductionOrder> {
        if !self.constructed {
            return None;
        }
        let duration = self.current.as_ref()?.duration;
        self.progress += delta;
        if self.progress < duration {
            return None;
        }
        let finished = self.current.take();
        self.start_next();
        finished
    }

    /// Abandon the order in production and start the next one.
    pub fn cancel_current(&mut self) -> Option<ProductionOrder> {
        let cancelled = self.current.take();
        if cancelled.is_some() {
            self.start_next();
        }
        cancelled
    }

    /// Orders not yet started.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn start_next(&mut self) {
        self.current = self.queue.pop_front();
        self.progress = Fixed::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_health_damage_clamps_at_zero() {
        let mut health = Health::new(fx(10.0));
        assert_eq!(health.apply_damage(fx(4.0)), fx(4.0));
        assert_eq!(health.apply_damage(fx(50.0)), fx(6.0));
        assert_eq!(health.current, Fixed::ZERO);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_heal_clamps_at_max() {
        let mut health = Health::new(fx(10.0));
        health.apply_damage(fx(3.0));
        assert_eq!(health.heal(fx(100.0)), fx(3.0));
        assert!(health.is_full());
    }

    #[test]
    fn test_health_regeneration() {
        let mut health = Health::new(fx(10.0)).with_regeneration(fx(0.5));
        health.apply_damage(fx(2.0));
        health.regenerate(fx(2.0));
        assert_eq!(health.current, fx(9.0));
        health.regenerate(fx(10.0));
        assert_eq!(health.current, fx(10.0));

        health.apply_damage(fx(10.0));
        health.regenerate(fx(10.0));
        assert!(health.is_dead());
    }

    #[test]
    fn test_attack_interval() {
        let combat = Combat::new(10, 0, fx(50.0)).with_attack_speed(fx(2.0));
        assert_eq!(combat.attack_interval(), fx(0.5));

        let frozen = Combat::new(10, 0, fx(50.0)).with_attack_speed(Fixed::ZERO);
        assert_eq!(frozen.attack_interval(), Fixed::MAX);
    }

    #[test]
    fn test_resource_gather_takes_remaining() {
        let mut node = ResourceNode::new(ResourceKind::Wood, fx(7.0));
        assert_eq!(node.gather(fx(5.0)), fx(5.0));
        assert_eq!(node.gather(fx(5.0)), fx(2.0));
        assert!(node.is_depleted());
    }

    #[test]
    fn test_progression_thresholds() {
        let mut progression = Progression::default();
        assert_eq!(progression.experience_to_next(), 100);
        assert_eq!(progression.gain(99), 0);
        assert_eq!(progression.gain(1), 1);
        assert_eq!(progression.level, 2);
        assert_eq!(progression.experience_to_next(), 250);
        // 250 for level 2 and 400 for level 3
        assert_eq!(progression.gain(650), 2);
        assert_eq!(progression.level, 4);
        assert_eq!(progression.experience, 0);
    }

    #[test]
    fn test_progression_level_zero_counts_as_one() {
        let mut progression = Progression {
            level: 0,
            experience: 0,
        };
        assert_eq!(progression.experience_to_next(), 100);
        assert_eq!(progression.gain(100), 1);
        assert_eq!(progression.level, 2);

        let mut veteran = Progression {
            level: u32::MAX,
            experience: 0,
        };
        assert_eq!(veteran.experience_to_next(), u32::MAX);
        assert_eq!(veteran.gain(u32::MAX), 1);
        assert_eq!(veteran.level, u32::MAX);
    }

    #[test]
    fn test_learning_counts_down() {
        let mut learning = Learning::new("knight", fx(2.0));
        assert!(!learning.advance(fx(0.5)));
        assert_eq!(learning.progress(), fx(0.25));
        assert!(learning.advance(fx(5.0)));
        assert_eq!(learning.time_left, Fixed::ZERO);
        assert_eq!(learning.progress(), Fixed::ONE);

        assert!(Learning::new("knight", fx(-1.0)).advance(Fixed::ZERO));
    }

    #[test]
    fn test_garrison_respects_capacity() {
        let mut keep = BuildingState::new("keep", fx(30.0), Vec2Fixed::ZERO).with_garrison_capacity(2);
        assert!(keep.garrison(4));
        assert!(!keep.garrison(4));
        assert!(keep.garrison(7));
        assert!(!keep.has_room());
        assert!(!keep.garrison(9));

        assert!(keep.ungarrison(4));
        assert!(!keep.ungarrison(4));
        assert_eq!(keep.garrisoned, vec![7]);
        assert!(keep.garrison(9));

        let mut hut = BuildingState::new("hut", fx(30.0), Vec2Fixed::ZERO);
        assert!(!hut.garrison(1));
    }

    #[test]
    fn test_building_production_cycle() {
        let mut building = BuildingState::new("barracks", fx(30.0), Vec2Fixed::ZERO);
        let order = ProductionOrder {
            class: "warrior".to_string(),
            stats: UnitStats::default(),
            duration: fx(2.0),
        };
        building.enqueue(order.clone());
        building.enqueue(order);
        assert!(building.current.is_some());
        assert_eq!(building.pending(), 1);

        assert!(building.advance_production(fx(1.5)).is_none());
        assert!(building.advance_production(fx(0.5)).is_some());
        assert!(building.current.is_some());
        assert_eq!(building.pending(), 0);
        assert_eq!(building.progress, Fixed::ZERO);
    }

    #[test]
    fn test_unfinished_building_does_not_produce() {
        let mut building = BuildingState::new("barracks", fx(4.0), Vec2Fixed::ZERO);
        building.start_construction();
        building.enqueue(ProductionOrder {
            class: "worker".to_string(),
            stats: UnitStats::default(),
            duration: fx(1.0),
        });

        assert!(building.advance_production(fx(5.0)).is_none());
        assert!(!building.advance_construction(fx(2.0)));
        assert!(building.advance_construction(fx(2.0)));
        assert!(building.constructed);
        assert!(building.advance_production(fx(1.0)).is_some());
    }
}
