//! Attack resolution and automatic target acquisition.
//!
//! Each tick every living entity with a combat component:
//!
//! 1. Cools down.
//! 2. If its target is alive: attacks when in range and ready, otherwise
//!    redirects its movement onto the target (chase).
//! 3. If its target is gone: disengages.
//!
//! A second pass lets idle auto-attackers acquire the nearest hostile within
//! their detection range.

use super::{nearest_hostile, System};
use crate::components::{Combat, EntityId};
use crate::events::Notification;
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::SimContext;

/// Calculate damage for one attack.
///
/// Defense is subtracted flat, and every hit deals at least 1.
#[must_use]
pub fn calculate_damage(attack_power: u32, defense: u32) -> u32 {
    attack_power.saturating_sub(defense).max(1)
}

/// Resolves attacks between entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatSystem;

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn update(&mut self, ctx: &mut SimContext, delta: Fixed) {
        let ids = ctx.entities.sorted_ids();

        for &id in &ids {
            resolve_engagement(ctx, id, delta);
        }

        for &id in &ids {
            let Some(entity) = ctx.entities.live(id) else {
                continue;
            };
            let Some(combat) = entity.combat else {
                continue;
            };
            if !combat.auto_attack || combat.target.is_some() {
                continue;
            }

            if let Some(enemy) = nearest_hostile(&ctx.entities, &ids, id, combat.detection_range) {
                tracing::trace!(entity = id, target = enemy, "Auto-acquired target");
                if let Some(combat) = ctx.entities.get_mut(id).and_then(|e| e.combat.as_mut()) {
                    combat.engage(enemy);
                }
            }
        }
    }
}

/// Cooldown, attack and chase for a single entity.
fn resolve_engagement(ctx: &mut SimContext, id: EntityId, delta: Fixed) {
    let Some(attacker) = ctx.entities.live(id) else {
        return;
    };
    let Some(mut combat) = attacker.combat else {
        return;
    };
    let position = attacker.position;

    if combat.attack_cooldown > Fixed::ZERO {
        combat.attack_cooldown -= delta;
    }

    let target = combat
        .target
        .and_then(|target_id| ctx.entities.live(target_id).map(|t| (target_id, t.position)));

    let mut chase: Option<Vec2Fixed> = None;
    match target {
        Some((target_id, target_position)) => {
            if position.distance(target_position) <= combat.attack_range {
                if combat.ready() {
                    strike(ctx, id, target_id, &mut combat);
                }
            } else {
                chase = Some(target_position);
            }
        }
        None => combat.disengage(),
    }

    if let Some(entity) = ctx.entities.get_mut(id) {
        entity.combat = Some(combat);
        if let (Some(destination), Some(movement)) = (chase, entity.movement.as_mut()) {
            movement.move_to(destination);
        }
    }
}

/// Execute one attack from `attacker_id` on `target_id`.
fn strike(ctx: &mut SimContext, attacker_id: EntityId, target_id: EntityId, combat: &mut Combat) {
    combat.attack_cooldown = combat.attack_interval();

    let Some(target) = ctx.entities.get_mut(target_id) else {
        return;
    };
    let defense = target.combat.map_or(0, |c| c.defense);
    let damage = calculate_damage(combat.attack_power, defense);

    ctx.notifications.push(Notification::Attacked {
        attacker: attacker_id,
        target: target_id,
        damage,
    });

    let Some(health) = target.health.as_mut() else {
        return;
    };
    let dealt = health.apply_damage(Fixed::from_num(damage));
    let killed = health.is_dead();
    tracing::trace!(attacker = attacker_id, target = target_id, damage, "Attack");
    ctx.notifications.push(Notification::Damaged {
        entity: target_id,
        attacker: attacker_id,
        amount: dealt,
    });

    if killed {
        target.kill();
        combat.disengage();
        tracing::debug!(entity = target_id, killer = attacker_id, "Entity died");
        ctx.notifications.push(Notification::Died {
            entity: target_id,
            killer: Some(attacker_id),
        });
    }
}
