//! Core simulation loop.
//!
//! The host calls [`Simulation::tick`] once per frame with the real elapsed
//! time. Each tick:
//!
//! 1. Clamps the delta to `[0, max_delta]` so a stalled frame cannot cause
//!    a runaway catch-up step.
//! 2. Runs every registered [`System`] in order (movement, combat, ai, then
//!    any added with [`Simulation::add_system`]).
//! 3. Runs each live entity's own bookkeeping (regeneration, retraining,
//!    construction, production).
//! 4. Releases the garrison of every building that died.
//! 5. Removes every entity no longer alive.
//! 6. Spawns units whose production finished this tick.
//!
//! # Determinism
//!
//! - No floating-point math inside the tick (uses [`Fixed`])
//! - Randomness only from the seeded [`ChaCha8Rng`] in the context
//! - Consistent iteration order (sorted entity ids)
//!
//! # Example
//!
//! ```
//! use warband_core::data::UnitRecord;
//! use warband_core::math::Fixed;
//! use warband_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new();
//! let unit = sim.spawn_unit(&UnitRecord {
//!     player_controlled: true,
//!     ..UnitRecord::default()
//! });
//!
//! let events = sim.tick(Fixed::from_num(0.016));
//! assert_eq!(events.tick, 1);
//! assert!(sim.entities().contains(unit));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::commands::{self, CommandKind, CommandTarget};
use crate::components::{EntityId, EntityKind, Learning, ProductionOrder};
use crate::config::SimulationConfig;
use crate::data::{BuildingRecord, Catalog, ResourceRecord, StatBlock, Trainee, UnitRecord};
use crate::error::{GameError, Result};
use crate::events::{Notification, NotificationQueue};
use crate::factions::{are_hostile, Faction, FactionId, FactionRegistry};
use crate::factory::{build_building, build_resource, build_unit, UnitSpec};
use crate::math::{fixed_from_f64, Fixed, Vec2Fixed};
use crate::registry::{Entity, EntityRegistry};
use crate::systems::{default_systems, System};

/// Units leaving a building appear up to this far from it on each axis.
pub const GARRISON_EXIT_SPREAD: i32 = 50;

/// Shared state handed to every system call.
#[derive(Debug, Clone)]
pub struct SimContext {
    /// All entities.
    pub entities: EntityRegistry,
    /// Known factions. Read-only during a tick.
    pub factions: FactionRegistry,
    /// Tunables.
    pub config: SimulationConfig,
    /// The only source of randomness in the simulation.
    pub rng: ChaCha8Rng,
    /// Notifications produced since the last drain.
    pub notifications: NotificationQueue,
    /// Ticks completed so far.
    pub tick: u64,
}

impl SimContext {
    /// Create an empty context with the RNG seeded from `config.seed`.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            entities: EntityRegistry::new(),
            factions: FactionRegistry::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            notifications: NotificationQueue::new(),
            tick: 0,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick number just completed.
    pub tick: u64,
    /// Delta actually simulated, after clamping.
    pub delta: Fixed,
    /// Notifications in the order they were produced.
    pub notifications: Vec<Notification>,
    /// Entities removed at the end of the tick.
    pub removed: Vec<EntityId>,
    /// Entities spawned by production this tick.
    pub spawned: Vec<EntityId>,
}

/// Converts host frame timestamps into raw tick deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    /// Create a clock that has not seen a frame yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_ms: None }
    }

    /// Record a frame timestamp and return seconds since the previous one.
    ///
    /// The first frame yields zero. A clock that jumps backwards yields a
    /// negative delta, which [`Simulation::tick`] clamps to zero.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let delta = self.last_ms.map_or(0.0, |last| (now_ms - last) / 1000.0);
        self.last_ms = Some(now_ms);
        delta
    }

    /// Forget the previous frame, e.g. after the host resumes from pause.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// A production order that finished this tick, with its building's
/// allegiance captured before dead entities are pruned.
struct FinishedOrder {
    building: EntityId,
    rally_point: Vec2Fixed,
    faction: Option<FactionId>,
    player_controlled: bool,
    order: ProductionOrder,
}

/// The core game simulation.
///
/// Owns the context and the ordered system list. All mutation goes through
/// this type or through systems it runs.
pub struct Simulation {
    ctx: SimContext,
    systems: Vec<Box<dyn System>>,
    catalog: Catalog,
    elapsed: Fixed,
    paused: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.ctx.tick)
            .field("entities", &self.ctx.entities.len())
            .field("systems", &self.system_names())
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create an empty simulation with default config.
    ///
    /// ```
    /// use warband_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new();
    /// assert_eq!(sim.tick_count(), 0);
    /// assert_eq!(sim.system_names(), vec!["movement", "combat", "ai"]);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Create an empty simulation with the given config.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            ctx: SimContext::new(config),
            systems: default_systems(),
            catalog: Catalog::default(),
            elapsed: Fixed::ZERO,
            paused: false,
        }
    }

    /// Builder method to set the catalog used by the factories.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Append a system. It runs after every system already registered.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Names of the registered systems in run order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Shared context, read-only.
    #[must_use]
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// Shared context, for hosts and tests that need direct access.
    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// All entities.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.ctx.entities
    }

    /// Look up a single entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.ctx.entities.get(id)
    }

    /// Known factions.
    #[must_use]
    pub fn factions(&self) -> &FactionRegistry {
        &self.ctx.factions
    }

    /// Register a faction definition.
    pub fn register_faction(&mut self, faction: Faction) {
        self.ctx.factions.register(faction);
    }

    /// Active config.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.ctx.config
    }

    /// Active catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Ticks completed so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.ctx.tick
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Check if ticks are being ignored.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume. A paused simulation ignores [`tick`](Self::tick).
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            tracing::info!(paused, tick = self.ctx.tick, "Simulation pause toggled");
        }
        self.paused = paused;
    }

    /// Advance the simulation by a host-measured delta in seconds.
    pub fn tick_seconds(&mut self, raw_delta: f64) -> TickEvents {
        self.tick(fixed_from_f64(raw_delta))
    }

    /// Advance the simulation by one tick.
    ///
    /// `raw_delta` is clamped to `[0, max_delta]`. Returns everything that
    /// happened, including notifications queued since the previous tick.
    pub fn tick(&mut self, raw_delta: Fixed) -> TickEvents {
        if self.paused {
            return TickEvents {
                tick: self.ctx.tick,
                ..TickEvents::default()
            };
        }

        let delta = raw_delta
            .min(self.ctx.config.max_delta)
            .max(Fixed::ZERO);

        for system in &mut self.systems {
            system.update(&mut self.ctx, delta);
        }

        let finished = self.update_entities(delta);
        self.settle_garrisons();
        let removed = self.ctx.entities.retain_alive();
        let spawned: Vec<EntityId> = finished
            .into_iter()
            .map(|done| self.spawn_produced(done))
            .collect();

        self.ctx.tick += 1;
        self.elapsed += delta;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.ctx.tick, state_hash = hash, "Simulation state hash");
        }

        TickEvents {
            tick: self.ctx.tick,
            delta,
            notifications: self.ctx.notifications.drain(),
            removed,
            spawned,
        }
    }

    /// Per-entity bookkeeping in id order.
    fn update_entities(&mut self, delta: Fixed) -> Vec<FinishedOrder> {
        let mut finished = Vec::new();
        for id in self.ctx.entities.sorted_ids() {
            let Some(entity) = self.ctx.entities.get_mut(id) else {
                continue;
            };
            if let Some(order) = entity.update(delta, &mut self.ctx.notifications) {
                let rally_point = entity
                    .building
                    .as_ref()
                    .map_or(entity.position, |b| b.rally_point);
                finished.push(FinishedOrder {
                    building: id,
                    rally_point,
                    faction: entity.faction,
                    player_controlled: entity.player_controlled,
                    order,
                });
            }
        }
        finished
    }

    /// Release the occupants of dead buildings and forget occupants that
    /// died inside.
    fn settle_garrisons(&mut self) {
        let sheltering: Vec<(EntityId, bool, Vec2Fixed, Vec<EntityId>)> = self
            .ctx
            .entities
            .iter_sorted()
            .filter_map(|e| {
                let state = e.building.as_ref().filter(|b| !b.garrisoned.is_empty())?;
                Some((e.id, e.is_alive(), e.position, state.garrisoned.clone()))
            })
            .collect();

        for (building, alive, origin, occupants) in sheltering {
            if !alive {
                for unit in occupants {
                    self.release(building, origin, unit);
                }
                if let Some(state) = self.ctx.entities.get_mut(building).and_then(|e| e.building.as_mut()) {
                    state.garrisoned.clear();
                }
                continue;
            }

            let survivors: Vec<EntityId> = occupants
                .into_iter()
                .filter(|&unit| self.ctx.entities.get(unit).is_some_and(|e| e.is_alive()))
                .collect();
            if let Some(state) = self.ctx.entities.get_mut(building).and_then(|e| e.building.as_mut()) {
                state.garrisoned = survivors;
            }
        }
    }

    /// Put a sheltered unit back into the world near `origin`.
    fn release(&mut self, building: EntityId, origin: Vec2Fixed, unit: EntityId) -> Option<Vec2Fixed> {
        let spread = Fixed::from_num(GARRISON_EXIT_SPREAD).to_bits();
        let offset = Vec2Fixed::new(
            Fixed::from_bits(self.ctx.rng.gen_range(-spread..=spread)),
            Fixed::from_bits(self.ctx.rng.gen_range(-spread..=spread)),
        );
        let entity = self
            .ctx
            .entities
            .get_mut(unit)
            .filter(|e| e.is_alive() && e.garrisoned_in == Some(building))?;

        let position = origin + offset;
        entity.garrisoned_in = None;
        entity.position = position;
        if let Some(movement) = entity.movement.as_mut() {
            movement.target = position;
            movement.stop();
        }
        tracing::debug!(unit, building, "Unit left garrison");
        self.ctx.notifications.push(Notification::Ungarrisoned {
            unit,
            building,
            position,
        });
        Some(position)
    }

    fn spawn_produced(&mut self, done: FinishedOrder) -> EntityId {
        let spec = UnitSpec {
            name: done.order.class.clone(),
            class: Some(done.order.class),
            stats: done.order.stats,
            position: done.rally_point,
            faction: done.faction,
            player_controlled: done.player_controlled,
            level: 1,
            patrol_points: Vec::new(),
        };
        let unit = self.spawn_unit_spec(spec);
        tracing::debug!(building = done.building, unit, "Unit produced");
        self.ctx.notifications.push(Notification::UnitProduced {
            building: done.building,
            unit,
        });
        unit
    }

    // ------------------------------------------------------------------
    // Spawning and removal
    // ------------------------------------------------------------------

    /// Spawn a unit from a data record.
    ///
    /// An unregistered faction is registered with a default definition.
    pub fn spawn_unit(&mut self, record: &UnitRecord) -> EntityId {
        let spec = UnitSpec::from_record(record, &self.catalog);
        self.spawn_unit_spec(spec)
    }

    /// Spawn a unit from already resolved values.
    pub fn spawn_unit_spec(&mut self, spec: UnitSpec) -> EntityId {
        if let Some(faction) = spec.faction {
            self.ctx.factions.ensure(faction);
        }
        let entity = build_unit(spec, &self.ctx.config);
        self.ctx.entities.insert(entity)
    }

    /// Spawn a building from a data record.
    pub fn spawn_building(&mut self, record: &BuildingRecord) -> EntityId {
        if let Some(faction) = record.faction {
            self.ctx.factions.ensure(FactionId::new(faction));
        }
        let entity = build_building(record, &self.catalog);
        self.ctx.entities.insert(entity)
    }

    /// Spawn a resource node from a data record.
    pub fn spawn_resource(&mut self, record: &ResourceRecord) -> EntityId {
        self.ctx.entities.insert(build_resource(record))
    }

    /// Insert a prebuilt entity, assigning it a fresh id.
    pub fn spawn_entity(&mut self, entity: Entity) -> EntityId {
        if let Some(faction) = entity.faction {
            self.ctx.factions.ensure(faction);
        }
        self.ctx.entities.insert(entity)
    }

    /// Kill an entity. It is removed at the end of the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if no live entity has this id.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<()> {
        let entity = self
            .ctx
            .entities
            .get_mut(id)
            .filter(|e| e.is_alive())
            .ok_or(GameError::EntityNotFound(id))?;
        entity.kill();
        self.ctx.notifications.push(Notification::Died {
            entity: id,
            killer: None,
        });
        Ok(())
    }

    /// Remove an entity immediately, without a death notification.
    ///
    /// A despawned building lets its garrison out; a despawned occupant is
    /// dropped from its building.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if the entity doesn't exist.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity> {
        let entity = self.ctx.entities.remove(id).ok_or(GameError::EntityNotFound(id))?;
        if let Some(state) = &entity.building {
            for &unit in &state.garrisoned {
                self.release(id, entity.position, unit);
            }
        }
        if let Some(building) = entity.garrisoned_in {
            if let Some(state) = self.ctx.entities.get_mut(building).and_then(|e| e.building.as_mut()) {
                state.ungarrison(id);
            }
        }
        Ok(entity)
    }

    // ------------------------------------------------------------------
    // Progression and buildings
    // ------------------------------------------------------------------

    /// Give a unit experience. Returns the number of levels gained.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity doesn't exist or has no progression.
    pub fn grant_experience(&mut self, id: EntityId, amount: u32) -> Result<u32> {
        let entity = self
            .ctx
            .entities
            .get_mut(id)
            .filter(|e| e.is_alive())
            .ok_or(GameError::EntityNotFound(id))?;
        if entity.progression.is_none() {
            return Err(GameError::MissingComponent {
                entity: id,
                component: "progression",
            });
        }
        Ok(entity.grant_experience(amount, &mut self.ctx.notifications))
    }

    /// Queue a unit of `class` at a building.
    ///
    /// Stats and production time come from the catalog; an unknown class
    /// produces a default unit after the default production time.
    ///
    /// # Errors
    ///
    /// Returns an error if the building doesn't exist, isn't a building, or
    /// its type restricts production to other classes.
    pub fn queue_production(&mut self, building: EntityId, class: &str) -> Result<()> {
        let stats = self.catalog.resolve_unit_stats(Some(class), &StatBlock::default());
        let duration = self.catalog.production_time(class);
        let entity = self
            .ctx
            .entities
            .live(building)
            .ok_or(GameError::EntityNotFound(building))?;
        let state = entity.building.as_ref().ok_or(GameError::MissingComponent {
            entity: building,
            component: "building",
        })?;
        let allowed = self
            .catalog
            .building(&state.building_type)
            .map_or(true, |def| def.produces.is_empty() || def.produces.iter().any(|c| c == class));
        if !allowed {
            return Err(GameError::InvalidState(format!(
                "building {building} cannot produce '{class}'"
            )));
        }

        let state = self.building_mut(building)?;
        state.enqueue(ProductionOrder {
            class: class.to_string(),
            stats,
            duration,
        });
        Ok(())
    }

    /// Cancel the order in production at a building.
    ///
    /// Returns the cancelled class, or `None` if nothing was in production.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or not a building.
    pub fn cancel_production(&mut self, building: EntityId) -> Result<Option<String>> {
        let state = self.building_mut(building)?;
        Ok(state.cancel_current().map(|order| order.class))
    }

    /// Move a building's rally point.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or not a building.
    pub fn set_rally_point(&mut self, building: EntityId, point: Vec2Fixed) -> Result<()> {
        self.building_mut(building)?.rally_point = point;
        Ok(())
    }

    /// Reset a building to an unbuilt foundation.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or not a building.
    pub fn start_construction(&mut self, building: EntityId) -> Result<()> {
        self.building_mut(building)?.start_construction();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Retraining
    // ------------------------------------------------------------------

    /// Start retraining a unit into `target_class`, replacing any training
    /// already under way. Returns the training time in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit is missing or not a unit, the class is
    /// not in the catalog, or the unit's class is locked or fails the
    /// target's requirements.
    pub fn start_learning(&mut self, unit: EntityId, target_class: &str) -> Result<Fixed> {
        let target = self
            .catalog
            .class(target_class)
            .ok_or_else(|| GameError::UnknownClass(target_class.to_string()))?;
        let entity = self
            .ctx
            .entities
            .get_mut(unit)
            .filter(|e| e.is_alive())
            .ok_or(GameError::EntityNotFound(unit))?;
        if entity.kind != EntityKind::Unit {
            return Err(GameError::InvalidState(format!("entity {unit} is not a unit")));
        }

        let locked = entity
            .class
            .as_deref()
            .and_then(|class| self.catalog.class(class))
            .is_some_and(|def| def.locked);
        let trainee = Trainee {
            class: entity.class.as_deref(),
            level: entity.progression.map_or(1, |p| p.level),
            max_health: entity.health.map_or(Fixed::ZERO, |h| h.max),
            attack: entity.combat.map_or(0, |c| c.attack_power),
            defense: entity.combat.map_or(0, |c| c.defense),
        };
        if locked || !target.learning.allows(&trainee) {
            return Err(GameError::RequirementsNotMet {
                entity: unit,
                class: target_class.to_string(),
            });
        }

        let duration = target.learning.duration();
        entity.learning = Some(Learning::new(target_class, duration));
        tracing::debug!(entity = unit, class = target_class, "Retraining started");
        Ok(duration)
    }

    /// Abandon a unit's training. Returns the class it was training for.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if no live entity has this id.
    pub fn cancel_learning(&mut self, unit: EntityId) -> Result<Option<String>> {
        Ok(self.live_mut(unit)?.learning.take().map(|l| l.target_class))
    }

    // ------------------------------------------------------------------
    // Garrison
    // ------------------------------------------------------------------

    /// Shelter a unit inside a finished building.
    ///
    /// The unit stops, drops its targets and leaves the selection. While
    /// inside it cannot be seen, targeted or commanded.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing, the building is
    /// unfinished or full, or the unit is not a friendly free unit.
    pub fn garrison(&mut self, building: EntityId, unit: EntityId) -> Result<()> {
        let shelter = self
            .ctx
            .entities
            .live(building)
            .ok_or(GameError::EntityNotFound(building))?;
        let state = shelter.building.as_ref().ok_or(GameError::MissingComponent {
            entity: building,
            component: "building",
        })?;
        if !state.constructed {
            return Err(GameError::InvalidState(format!("building {building} is not constructed")));
        }
        if !state.has_room() {
            return Err(GameError::InvalidState(format!("building {building} is full")));
        }
        let shelter_faction = shelter.faction;

        let occupant = self
            .ctx
            .entities
            .get(unit)
            .filter(|e| e.is_alive())
            .ok_or(GameError::EntityNotFound(unit))?;
        if occupant.kind != EntityKind::Unit {
            return Err(GameError::InvalidState(format!("entity {unit} is not a unit")));
        }
        if occupant.is_garrisoned() {
            return Err(GameError::InvalidState(format!("unit {unit} is already garrisoned")));
        }
        if are_hostile(occupant.faction, shelter_faction) {
            return Err(GameError::InvalidState(format!(
                "unit {unit} is hostile to building {building}"
            )));
        }

        self.building_mut(building)?.garrison(unit);
        let occupant = self.live_mut(unit)?;
        occupant.garrisoned_in = Some(building);
        occupant.selected = false;
        if let Some(movement) = occupant.movement.as_mut() {
            movement.stop();
        }
        if let Some(combat) = occupant.combat.as_mut() {
            combat.disengage();
        }
        if let Some(ai) = occupant.ai.as_mut() {
            ai.reset();
        }

        tracing::debug!(unit, building, "Unit garrisoned");
        self.ctx.notifications.push(Notification::Garrisoned { unit, building });
        Ok(())
    }

    /// Let a unit out of a building. It appears within
    /// [`GARRISON_EXIT_SPREAD`] of the building on each axis; returns where.
    ///
    /// # Errors
    ///
    /// Returns an error if the building is missing or the unit is not
    /// inside it.
    pub fn ungarrison(&mut self, building: EntityId, unit: EntityId) -> Result<Vec2Fixed> {
        let state = self.building_mut(building)?;
        if !state.ungarrison(unit) {
            return Err(GameError::InvalidState(format!(
                "unit {unit} is not inside building {building}"
            )));
        }
        let origin = self.live_mut(building)?.position;
        self.release(building, origin, unit)
            .ok_or(GameError::EntityNotFound(unit))
    }

    fn live_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.ctx
            .entities
            .get_mut(id)
            .filter(|e| e.is_alive())
            .ok_or(GameError::EntityNotFound(id))
    }

    fn building_mut(&mut self, id: EntityId) -> Result<&mut crate::components::BuildingState> {
        self.live_mut(id)?
            .building
            .as_mut()
            .ok_or(GameError::MissingComponent {
                entity: id,
                component: "building",
            })
    }

    // ------------------------------------------------------------------
    // Selection and commands
    // ------------------------------------------------------------------

    /// Select entities. Without `additive` the previous selection is
    /// cleared first. Dead or unknown ids are ignored.
    ///
    /// Returns the size of the selection afterwards.
    pub fn select(&mut self, ids: &[EntityId], additive: bool) -> usize {
        if !additive {
            self.clear_selection();
        }
        for &id in ids {
            if let Some(entity) = self.ctx.entities.get_mut(id).filter(|e| e.is_active()) {
                entity.selected = true;
            }
        }
        self.selected_ids().len()
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        for id in self.ctx.entities.sorted_ids() {
            if let Some(entity) = self.ctx.entities.get_mut(id) {
                entity.selected = false;
            }
        }
    }

    /// Ids of selected live entities, ascending.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.ctx
            .entities
            .iter_sorted()
            .filter(|e| e.selected && e.is_active())
            .map(|e| e.id)
            .collect()
    }

    /// Apply a command to the given entities. See [`commands::execute`].
    pub fn execute(&mut self, command: CommandKind, target: Option<CommandTarget>, selected: &[EntityId]) -> usize {
        commands::execute(&mut self.ctx.entities, command, target, selected)
    }

    /// Apply a command to the current selection.
    pub fn execute_on_selection(&mut self, command: CommandKind, target: Option<CommandTarget>) -> usize {
        let selected = self.selected_ids();
        self.execute(command, target, &selected)
    }

    // ------------------------------------------------------------------
    // Determinism
    // ------------------------------------------------------------------

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.ctx.tick.hash(&mut hasher);
        self.elapsed.hash(&mut hasher);

        let ids = self.ctx.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for entity in self.ctx.entities.iter_sorted() {
            entity.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Rebuild a simulation from restored parts.
    pub(crate) fn restore(ctx: SimContext, catalog: Catalog, elapsed: Fixed) -> Self {
        Self {
            ctx,
            systems: default_systems(),
            catalog,
            elapsed,
            paused: false,
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AiState;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    struct CountingSystem {
        runs: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl System for CountingSystem {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn update(&mut self, _ctx: &mut SimContext, _delta: Fixed) {
            self.runs.set(self.runs.get() + 1);
        }
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut sim = Simulation::new();
        assert_eq!(sim.tick(fx(5.0)).delta, sim.config().max_delta);
        assert_eq!(sim.tick(fx(-1.0)).delta, Fixed::ZERO);
        assert_eq!(sim.tick(fx(0.01)).delta, fx(0.01));
        assert_eq!(sim.tick_count(), 3);
    }

    #[test]
    fn test_added_system_runs_last() {
        let runs = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut sim = Simulation::new();
        sim.add_system(Box::new(CountingSystem { runs: runs.clone() }));

        assert_eq!(sim.system_names(), vec!["movement", "combat", "ai", "counting"]);
        sim.tick(fx(0.01));
        sim.tick(fx(0.01));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_paused_simulation_ignores_ticks() {
        let mut sim = Simulation::new();
        sim.set_paused(true);
        sim.tick(fx(0.01));
        assert_eq!(sim.tick_count(), 0);
        sim.set_paused(false);
        sim.tick(fx(0.01));
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new();
        assert!(clock.advance(1000.0).abs() < f64::EPSILON);
        assert!((clock.advance(1016.0) - 0.016).abs() < 1e-9);
        clock.reset();
        assert!(clock.advance(5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_faction_is_registered() {
        let mut sim = Simulation::new();
        sim.spawn_unit(&UnitRecord {
            faction: Some(9),
            ..UnitRecord::default()
        });
        assert_eq!(sim.factions().get(FactionId::new(9)).unwrap().name, "Faction 9");
    }

    #[test]
    fn test_production_spawns_at_rally_point() {
        let mut sim = Simulation::new();
        let barracks = sim.spawn_building(&BuildingRecord {
            building_type: "barracks".to_string(),
            faction: Some(1),
            player_controlled: true,
            ..BuildingRecord::default()
        });
        let mut catalog = Catalog::default();
        catalog.classes.insert(
            "militia".to_string(),
            crate::data::UnitClass {
                production_time: Some(0.05),
                ..crate::data::UnitClass::default()
            },
        );
        sim.catalog = catalog;
        sim.queue_production(barracks, "militia").unwrap();

        let first = sim.tick(fx(0.03));
        assert!(first.spawned.is_empty());
        let second = sim.tick(fx(0.03));
        assert_eq!(second.spawned.len(), 1);

        let unit = sim.entity(second.spawned[0]).unwrap();
        assert_eq!(unit.position, Vec2Fixed::from_int(100, 100));
        assert_eq!(unit.faction, Some(FactionId::new(1)));
        assert!(unit.player_controlled);
        assert!(unit.ai.is_none());
        assert!(second.notifications.contains(&Notification::UnitProduced {
            building: barracks,
            unit: second.spawned[0],
        }));
    }

    #[test]
    fn test_cancel_production() {
        let mut sim = Simulation::new();
        let barracks = sim.spawn_building(&BuildingRecord {
            building_type: "barracks".to_string(),
            ..BuildingRecord::default()
        });
        assert_eq!(sim.cancel_production(barracks).unwrap(), None);
        sim.queue_production(barracks, "worker").unwrap();
        assert_eq!(sim.cancel_production(barracks).unwrap(), Some("worker".to_string()));
    }

    #[test]
    fn test_building_operations_require_building() {
        let mut sim = Simulation::new();
        let unit = sim.spawn_unit(&UnitRecord::default());
        assert!(matches!(
            sim.queue_production(unit, "worker"),
            Err(GameError::MissingComponent { component: "building", .. })
        ));
        assert!(matches!(sim.start_construction(999), Err(GameError::EntityNotFound(999))));
    }

    #[test]
    fn test_construction_completes() {
        let mut sim = Simulation::new();
        let mut catalog = Catalog::default();
        catalog.buildings.insert(
            "hut".to_string(),
            crate::data::BuildingType {
                construction_time: Some(0.05),
                ..crate::data::BuildingType::default()
            },
        );
        sim.catalog = catalog;
        let hut = sim.spawn_building(&BuildingRecord {
            building_type: "hut".to_string(),
            under_construction: true,
            ..BuildingRecord::default()
        });

        sim.tick(fx(0.03));
        assert!(!sim.entity(hut).unwrap().building.as_ref().unwrap().constructed);
        let events = sim.tick(fx(0.03));
        assert!(sim.entity(hut).unwrap().building.as_ref().unwrap().constructed);
        assert!(events
            .notifications
            .contains(&Notification::ConstructionComplete { building: hut }));
    }

    #[test]
    fn test_grant_experience_notifies_next_tick() {
        let mut sim = Simulation::new();
        let unit = sim.spawn_unit(&UnitRecord {
            player_controlled: true,
            ..UnitRecord::default()
        });
        assert_eq!(sim.grant_experience(unit, 100).unwrap(), 1);
        assert_eq!(sim.entity(unit).unwrap().health.unwrap().max, fx(105.0));

        let events = sim.tick(fx(0.01));
        assert!(events
            .notifications
            .contains(&Notification::LevelUp { entity: unit, level: 2 }));
    }

    #[test]
    fn test_selection() {
        let mut sim = Simulation::new();
        let a = sim.spawn_unit(&UnitRecord::default());
        let b = sim.spawn_unit(&UnitRecord::default());

        assert_eq!(sim.select(&[a], false), 1);
        assert_eq!(sim.select(&[b], true), 2);
        assert_eq!(sim.select(&[b], false), 1);
        assert_eq!(sim.selected_ids(), vec![b]);
        sim.clear_selection();
        assert!(sim.selected_ids().is_empty());
    }

    #[test]
    fn test_destroyed_entity_removed_at_tick_end() {
        let mut sim = Simulation::new();
        let a = sim.spawn_unit(&UnitRecord::default());
        sim.destroy_entity(a).unwrap();
        assert!(sim.destroy_entity(a).is_err());

        let events = sim.tick(fx(0.01));
        assert_eq!(events.removed, vec![a]);
        assert!(!sim.entities().contains(a));
    }

    #[test]
    fn test_deterministic_hash() {
        let build = || {
            let mut sim = Simulation::with_config(SimulationConfig::default().with_seed(11));
            for i in 0..6 {
                sim.spawn_unit(&UnitRecord {
                    x: f64::from(i * 30),
                    y: 0.0,
                    faction: Some(if i % 2 == 0 { 1 } else { 2 }),
                    ..UnitRecord::default()
                });
            }
            sim
        };
        let mut sim1 = build();
        let mut sim2 = build();
        for _ in 0..120 {
            sim1.tick(fx(1.0 / 30.0));
            sim2.tick(fx(1.0 / 30.0));
        }
        assert_eq!(sim1.state_hash(), sim2.state_hash());
        assert!(sim1
            .entities()
            .iter_sorted()
            .any(|e| e.ai.as_ref().is_some_and(|ai| ai.state == AiState::Attacking)
                || !e.health.unwrap().is_full()));
    }
}
