//! Straight-line movement toward each entity's movement target.
//!
//! No steering, avoidance or collision: overlapping entities are allowed.

use super::System;
use crate::events::Notification;
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::SimContext;

/// Result of advancing a point toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// The target was within reach; the mover snaps onto it.
    Arrived,
    /// The mover advanced without reaching the target.
    Advanced {
        /// New position.
        position: Vec2Fixed,
        /// Unit direction of travel.
        direction: Vec2Fixed,
    },
}

/// Advance `from` toward `to` by at most `max_step`.
///
/// Arrival is inclusive: a remaining distance equal to the step arrives.
#[must_use]
pub fn step_toward(from: Vec2Fixed, to: Vec2Fixed, max_step: Fixed) -> MoveStep {
    let remaining = from.distance(to);
    if remaining <= max_step {
        return MoveStep::Arrived;
    }

    let direction = (to - from).normalize();
    MoveStep::Advanced {
        position: from + direction.scale(max_step),
        direction,
    }
}

/// Moves entities whose movement component is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn update(&mut self, ctx: &mut SimContext, delta: Fixed) {
        for id in ctx.entities.sorted_ids() {
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            if !entity.is_active() {
                continue;
            }
            let Some(movement) = entity.movement.as_mut() else {
                continue;
            };
            if !movement.is_moving {
                continue;
            }

            match step_toward(entity.position, movement.target, movement.speed.saturating_mul(delta)) {
                MoveStep::Arrived => {
                    movement.is_moving = false;
                    entity.position = movement.target;
                    tracing::trace!(entity = id, "Movement complete");
                    ctx.notifications.push(Notification::MovementComplete {
                        entity: id,
                        position: entity.position,
                    });
                }
                MoveStep::Advanced { position, direction } => {
                    entity.position = position;
                    entity.facing = direction;
                }
            }
        }
    }
}
