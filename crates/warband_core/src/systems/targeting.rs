//! Nearest-enemy search shared by combat auto-acquire and the AI.

use crate::components::EntityId;
use crate::factions::are_hostile;
use crate::math::Fixed;
use crate::registry::EntityRegistry;

/// Find the nearest living hostile entity strictly within `radius`.
///
/// Candidates are scanned in `ids` order and only a strictly smaller
/// distance replaces the current best, so equal distances resolve to the
/// earliest id. Returns `None` if the seeker itself is gone.
#[must_use]
pub fn nearest_hostile(
    registry: &EntityRegistry,
    ids: &[EntityId],
    seeker: EntityId,
    radius: Fixed,
) -> Option<EntityId> {
    let origin = registry.live(seeker)?;
    let mut best: Option<(EntityId, Fixed)> = None;

    for &id in ids {
        if id == seeker {
            continue;
        }
        let Some(candidate) = registry.live(id) else {
            continue;
        };
        if !are_hostile(origin.faction, candidate.faction) {
            continue;
        }

        let distance = origin.position.distance(candidate.position);
        if distance < radius && best.map_or(true, |(_, nearest)| distance < nearest) {
            best = Some((id, distance));
        }
    }

    best.map(|(id, _)| id)
}
