//! Per-entity AI state machine.
//!
//! Decisions are throttled: each AI entity re-evaluates only when its
//! decision timer expires. Between decisions the movement and combat
//! settings it last wrote stay in effect.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{nearest_hostile, System};
use crate::components::{AiState, AiTarget, EntityId};
use crate::config::FALLBACK_ATTACK_RANGE;
use crate::events::Notification;
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::SimContext;

/// Drives non-player entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct AiSystem;

impl System for AiSystem {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn update(&mut self, ctx: &mut SimContext, delta: Fixed) {
        let ids = ctx.entities.sorted_ids();

        for &id in &ids {
            let Some(entity) = ctx.entities.get_mut(id) else {
                continue;
            };
            if !entity.is_active() || entity.player_controlled {
                continue;
            }
            let Some(ai) = entity.ai.as_mut() else {
                continue;
            };

            ai.decision_timer -= delta;
            if ai.decision_timer > Fixed::ZERO {
                continue;
            }
            ai.decision_timer = ai.decision_interval;
            let state = ai.state;

            match state {
                AiState::Idle => decide_idle(ctx, &ids, id),
                AiState::Moving => decide_moving(ctx, &ids, id),
                AiState::Attacking => decide_attacking(ctx, id),
                AiState::Gathering => decide_gathering(ctx, id),
                AiState::Patrolling => decide_patrolling(ctx, &ids, id),
            }
        }
    }
}

/// Switch an entity's AI state, logging real transitions.
fn transition(ctx: &mut SimContext, id: EntityId, state: AiState, target: Option<AiTarget>) {
    let Some(ai) = ctx.entities.get_mut(id).and_then(|e| e.ai.as_mut()) else {
        return;
    };
    if ai.state != state {
        tracing::debug!(entity = id, from = ai.state.as_str(), to = state.as_str(), "AI state change");
    }
    ai.transition(state, target);
}

/// Switch to attacking if an enemy is inside the AI detection radius.
fn engage_nearby_enemy(ctx: &mut SimContext, ids: &[EntityId], id: EntityId) -> bool {
    let radius = ctx.config.ai_detection_radius;
    match nearest_hostile(&ctx.entities, ids, id, radius) {
        Some(enemy) => {
            transition(ctx, id, AiState::Attacking, Some(AiTarget::Entity(enemy)));
            true
        }
        None => false,
    }
}

fn is_moving(ctx: &SimContext, id: EntityId) -> bool {
    ctx.entities
        .get(id)
        .and_then(|e| e.movement)
        .is_some_and(|m| m.is_moving)
}

fn decide_idle(ctx: &mut SimContext, ids: &[EntityId], id: EntityId) {
    if engage_nearby_enemy(ctx, ids, id) {
        return;
    }

    let Some(entity) = ctx.entities.get(id) else {
        return;
    };
    let has_patrol = entity.ai.as_ref().is_some_and(|ai| !ai.patrol_points.is_empty());
    if has_patrol {
        transition(ctx, id, AiState::Patrolling, None);
        return;
    }

    let origin = entity.position;
    let has_movement = entity.movement.is_some();
    if !ctx.rng.gen_bool(ctx.config.wander_probability()) {
        return;
    }

    let point = wander_point(&mut ctx.rng, origin, ctx.config.wander_radius);
    if !has_movement {
        return;
    }
    if let Some(movement) = ctx.entities.get_mut(id).and_then(|e| e.movement.as_mut()) {
        movement.move_to(point);
    }
    transition(ctx, id, AiState::Moving, Some(AiTarget::Point(point)));
}

fn decide_moving(ctx: &mut SimContext, ids: &[EntityId], id: EntityId) {
    if engage_nearby_enemy(ctx, ids, id) {
        return;
    }
    if !is_moving(ctx, id) {
        transition(ctx, id, AiState::Idle, None);
    }
}

fn decide_attacking(ctx: &mut SimContext, id: EntityId) {
    let Some(entity) = ctx.entities.get(id) else {
        return;
    };
    let target_id = entity
        .ai
        .as_ref()
        .and_then(|ai| ai.target)
        .and_then(|target| target.entity_id());
    let Some((target_id, target_position)) =
        target_id.and_then(|t| ctx.entities.live(t).map(|e| (t, e.position)))
    else {
        transition(ctx, id, AiState::Idle, None);
        return;
    };

    let attack_range = entity
        .combat
        .map_or(Fixed::from_num(FALLBACK_ATTACK_RANGE), |c| c.attack_range);
    let pursuit_limit = attack_range.saturating_mul(ctx.config.pursuit_range_multiplier);
    if entity.position.distance(target_position) > pursuit_limit {
        tracing::debug!(entity = id, target = target_id, "Target out of reach, abandoning pursuit");
        transition(ctx, id, AiState::Idle, None);
        return;
    }

    if let Some(combat) = ctx.entities.get_mut(id).and_then(|e| e.combat.as_mut()) {
        combat.engage(target_id);
    }
}

fn decide_gathering(ctx: &mut SimContext, id: EntityId) {
    let Some(entity) = ctx.entities.get(id) else {
        return;
    };
    let position = entity.position;
    let resource_id = match entity.ai.as_ref().and_then(|ai| ai.target) {
        Some(AiTarget::Resource(resource_id)) => resource_id,
        _ => {
            transition(ctx, id, AiState::Idle, None);
            return;
        }
    };

    let gather_radius = ctx.config.gather_radius;
    let gather_amount = ctx.config.gather_amount;
    let Some(resource_entity) = ctx
        .entities
        .get_mut(resource_id)
        .filter(|e| e.is_alive() && e.resource.is_some())
    else {
        transition(ctx, id, AiState::Idle, None);
        return;
    };
    if position.distance(resource_entity.position) > gather_radius {
        return;
    }
    let Some(node) = resource_entity.resource.as_mut() else {
        return;
    };

    let kind = node.kind;
    let taken = node.gather(gather_amount);
    let depleted = node.is_depleted();
    if depleted {
        resource_entity.kill();
    }

    if taken > Fixed::ZERO {
        ctx.notifications.push(Notification::ResourceGathered {
            gatherer: id,
            resource: resource_id,
            kind,
            amount: taken,
        });
    }
    if depleted {
        tracing::debug!(resource = resource_id, "Resource depleted");
        ctx.notifications.push(Notification::ResourceDepleted {
            resource: resource_id,
            kind,
        });
        transition(ctx, id, AiState::Idle, None);
    }
}

fn decide_patrolling(ctx: &mut SimContext, ids: &[EntityId], id: EntityId) {
    if engage_nearby_enemy(ctx, ids, id) {
        return;
    }
    if is_moving(ctx, id) {
        return;
    }

    let Some(entity) = ctx.entities.get_mut(id) else {
        return;
    };
    let Some(ai) = entity.ai.as_mut() else {
        return;
    };
    if ai.patrol_points.is_empty() {
        transition(ctx, id, AiState::Idle, None);
        return;
    }

    ai.current_patrol_point = (ai.current_patrol_point + 1) % ai.patrol_points.len();
    let next = ai.patrol_points[ai.current_patrol_point];
    if let Some(movement) = entity.movement.as_mut() {
        movement.move_to(next);
    }
}

/// Pick a point uniformly inside the disk of `radius` around `origin`.
fn wander_point(rng: &mut ChaCha8Rng, origin: Vec2Fixed, radius: Fixed) -> Vec2Fixed {
    if radius <= Fixed::ZERO {
        return origin;
    }
    let bound = radius.to_bits();
    let radius_sq = radius.saturating_mul(radius);

    loop {
        let offset = Vec2Fixed::new(
            Fixed::from_bits(rng.gen_range(-bound..=bound)),
            Fixed::from_bits(rng.gen_range(-bound..=bound)),
        );
        if offset.distance_squared(Vec2Fixed::ZERO) <= radius_sq {
            return origin + offset;
        }
    }
}
