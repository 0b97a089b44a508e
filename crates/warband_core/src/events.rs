//! Notifications emitted by the simulation.
//!
//! The core never calls into presentation code. Systems push
//! [`Notification`]s onto a [`NotificationQueue`] while a tick runs, and the
//! simulation drains the queue into the tick's events once the tick ends,
//! preserving production order.

use crate::components::{EntityId, ResourceKind};
use crate::math::{Fixed, Vec2Fixed};

/// Something observable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An entity lost health to an attack.
    Damaged {
        /// Entity that took damage.
        entity: EntityId,
        /// Entity that dealt it.
        attacker: EntityId,
        /// Health actually removed.
        amount: Fixed,
    },
    /// An entity executed an attack.
    Attacked {
        /// Attacking entity.
        attacker: EntityId,
        /// Attacked entity.
        target: EntityId,
        /// Damage rolled before clamping to remaining health.
        damage: u32,
    },
    /// An entity died.
    Died {
        /// The dead entity.
        entity: EntityId,
        /// Entity credited with the kill, if any.
        killer: Option<EntityId>,
    },
    /// An entity reached its movement target.
    MovementComplete {
        /// The entity that arrived.
        entity: EntityId,
        /// Where it stopped.
        position: Vec2Fixed,
    },
    /// A gatherer took from a resource node.
    ResourceGathered {
        /// Gathering entity.
        gatherer: EntityId,
        /// Resource node.
        resource: EntityId,
        /// Kind of resource.
        kind: ResourceKind,
        /// Amount taken.
        amount: Fixed,
    },
    /// A resource node ran out.
    ResourceDepleted {
        /// Resource node.
        resource: EntityId,
        /// Kind of resource.
        kind: ResourceKind,
    },
    /// A unit reached a new level.
    LevelUp {
        /// The unit.
        entity: EntityId,
        /// Level reached.
        level: u32,
    },
    /// A building finished construction.
    ConstructionComplete {
        /// The building.
        building: EntityId,
    },
    /// A building produced a unit.
    UnitProduced {
        /// Producing building.
        building: EntityId,
        /// The new unit.
        unit: EntityId,
    },
    /// A unit finished retraining.
    LearningComplete {
        /// The unit.
        entity: EntityId,
        /// Class it now belongs to.
        class: String,
    },
    /// A unit entered a building.
    Garrisoned {
        /// The unit.
        unit: EntityId,
        /// The sheltering building.
        building: EntityId,
    },
    /// A unit left a building.
    Ungarrisoned {
        /// The unit.
        unit: EntityId,
        /// The building it left.
        building: EntityId,
        /// Where it was placed.
        position: Vec2Fixed,
    },
}

impl Notification {
    /// Short lowercase name, stable across versions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Damaged { .. } => "damaged",
            Self::Attacked { .. } => "attacked",
            Self::Died { .. } => "died",
            Self::MovementComplete { .. } => "movement_complete",
            Self::ResourceGathered { .. } => "resource_gathered",
            Self::ResourceDepleted { .. } => "resource_depleted",
            Self::LevelUp { .. } => "level_up",
            Self::ConstructionComplete { .. } => "construction_complete",
            Self::UnitProduced { .. } => "unit_produced",
            Self::LearningComplete { .. } => "learning_complete",
            Self::Garrisoned { .. } => "garrisoned",
            Self::Ungarrisoned { .. } => "ungarrisoned",
        }
    }
}

/// Ordered buffer of notifications awaiting delivery.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    pending: Vec<Notification>,
}

impl NotificationQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification.
    pub fn push(&mut self, notification: Notification) {
        tracing::trace!(kind = notification.name(), "Notification queued");
        self.pending.push(notification);
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Pending notifications, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    /// Number of pending notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
