//! Player command dispatch.
//!
//! Translates a player intent into component mutations on the selected
//! entities. Commands never fail: a missing or stale target turns the
//! command into a no-op, and selected entities that lack a component simply
//! do not receive that part of the command.

use std::str::FromStr;

use crate::components::{AiState, AiTarget, EntityId};
use crate::error::GameError;
use crate::math::Vec2Fixed;
use crate::registry::EntityRegistry;

/// The kinds of command a player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Walk to a location.
    Move,
    /// Engage an entity.
    Attack,
    /// Work a resource node.
    Gather,
    /// Drop movement and combat intent.
    Stop,
}

impl CommandKind {
    /// Lowercase command name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Gather => "gather",
            Self::Stop => "stop",
        }
    }
}

impl FromStr for CommandKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "attack" => Ok(Self::Attack),
            "gather" => Ok(Self::Gather),
            "stop" => Ok(Self::Stop),
            other => Err(GameError::UnknownCommand(other.to_string())),
        }
    }
}

/// What a command is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
    /// A point on the map.
    Position(Vec2Fixed),
    /// Another entity.
    Entity(EntityId),
    /// A resource node.
    Resource(EntityId),
}

/// Apply `command` to every live entity in `selected`.
///
/// Returns how many entities the command was applied to.
pub fn execute(
    registry: &mut EntityRegistry,
    command: CommandKind,
    target: Option<CommandTarget>,
    selected: &[EntityId],
) -> usize {
    let applied = match command {
        CommandKind::Move => match destination(registry, target) {
            Some(point) => move_to(registry, point, selected),
            None => 0,
        },
        CommandKind::Attack => match target {
            Some(CommandTarget::Entity(enemy)) if registry.live(enemy).is_some() => {
                attack(registry, enemy, selected)
            }
            _ => 0,
        },
        CommandKind::Gather => match target {
            Some(CommandTarget::Resource(resource)) => gather(registry, resource, selected),
            _ => 0,
        },
        CommandKind::Stop => stop(registry, selected),
    };

    if applied == 0 {
        tracing::debug!(command = command.as_str(), ?target, "Command ignored");
    }
    applied
}

/// Where a move command sends units.
fn destination(registry: &EntityRegistry, target: Option<CommandTarget>) -> Option<Vec2Fixed> {
    match target? {
        CommandTarget::Position(point) => Some(point),
        CommandTarget::Entity(id) | CommandTarget::Resource(id) => registry.live(id).map(|e| e.position),
    }
}

fn move_to(registry: &mut EntityRegistry, point: Vec2Fixed, selected: &[EntityId]) -> usize {
    let mut applied = 0;
    for &id in selected {
        let Some(entity) = registry.get_mut(id).filter(|e| e.is_active()) else {
            continue;
        };
        if let Some(movement) = entity.movement.as_mut() {
            movement.move_to(point);
        }
        if let Some(combat) = entity.combat.as_mut() {
            combat.disengage();
        }
        applied += 1;
    }
    applied
}

fn attack(registry: &mut EntityRegistry, enemy: EntityId, selected: &[EntityId]) -> usize {
    let mut applied = 0;
    for &id in selected {
        if id == enemy {
            continue;
        }
        let Some(entity) = registry.get_mut(id).filter(|e| e.is_active()) else {
            continue;
        };
        let Some(combat) = entity.combat.as_mut() else {
            continue;
        };
        combat.engage(enemy);
        if let Some(movement) = entity.movement.as_mut() {
            movement.stop();
        }
        applied += 1;
    }
    applied
}

fn gather(registry: &mut EntityRegistry, resource: EntityId, selected: &[EntityId]) -> usize {
    let Some(position) = registry
        .live(resource)
        .filter(|e| e.resource.is_some())
        .map(|e| e.position)
    else {
        return 0;
    };

    let mut applied = 0;
    for &id in selected {
        let Some(entity) = registry.get_mut(id).filter(|e| e.is_active()) else {
            continue;
        };
        if let Some(ai) = entity.ai.as_mut() {
            ai.transition(AiState::Gathering, Some(AiTarget::Resource(resource)));
        }
        if let Some(movement) = entity.movement.as_mut() {
            movement.move_to(position);
        }
        applied += 1;
    }
    applied
}

fn stop(registry: &mut EntityRegistry, selected: &[EntityId]) -> usize {
    let mut applied = 0;
    for &id in selected {
        let Some(entity) = registry.get_mut(id).filter(|e| e.is_active()) else {
            continue;
        };
        if let Some(movement) = entity.movement.as_mut() {
            movement.stop();
        }
        if let Some(combat) = entity.combat.as_mut() {
            combat.disengage();
        }
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Combat, EntityKind, Movement, ResourceKind, ResourceNode};
    use crate::math::Fixed;
    use crate::registry::Entity;

    fn soldier(registry: &mut EntityRegistry, x: i32) -> EntityId {
        let position = Vec2Fixed::from_int(x, 0);
        let mut entity = Entity::new(EntityKind::Unit, "soldier", position);
        entity.movement = Some(Movement::new(Fixed::from_num(100), position));
        entity.combat = Some(Combat::new(10, 5, Fixed::from_num(50)));
        registry.insert(entity)
    }

    #[test]
    fn test_parse_command_names() {
        assert_eq!("move".parse::<CommandKind>().unwrap(), CommandKind::Move);
        assert_eq!(" Stop ".parse::<CommandKind>().unwrap(), CommandKind::Stop);
        assert!(matches!(
            "dance".parse::<CommandKind>(),
            Err(GameError::UnknownCommand(name)) if name == "dance"
        ));
    }

    #[test]
    fn test_move_clears_combat_target() {
        let mut registry = EntityRegistry::new();
        let a = soldier(&mut registry, 0);
        let b = soldier(&mut registry, 10);
        registry.get_mut(a).unwrap().combat.as_mut().unwrap().engage(b);

        let target = Some(CommandTarget::Position(Vec2Fixed::from_int(40, 40)));
        assert_eq!(execute(&mut registry, CommandKind::Move, target, &[a]), 1);

        let entity = registry.get(a).unwrap();
        assert!(entity.movement.unwrap().is_moving);
        assert_eq!(entity.movement.unwrap().target, Vec2Fixed::from_int(40, 40));
        assert_eq!(entity.combat.unwrap().target, None);
        assert!(!registry.get(b).unwrap().movement.unwrap().is_moving);
    }

    #[test]
    fn test_attack_without_entity_target_is_noop() {
        let mut registry = EntityRegistry::new();
        let a = soldier(&mut registry, 0);
        let before = registry.get(a).cloned();

        let target = Some(CommandTarget::Position(Vec2Fixed::from_int(1, 1)));
        assert_eq!(execute(&mut registry, CommandKind::Attack, target, &[a]), 0);
        assert_eq!(execute(&mut registry, CommandKind::Attack, None, &[a]), 0);
        assert_eq!(registry.get(a).cloned(), before);
    }

    #[test]
    fn test_attack_sets_target_and_stops() {
        let mut registry = EntityRegistry::new();
        let a = soldier(&mut registry, 0);
        let b = soldier(&mut registry, 10);
        registry.get_mut(a).unwrap().movement.as_mut().unwrap().move_to(Vec2Fixed::from_int(99, 0));

        execute(&mut registry, CommandKind::Attack, Some(CommandTarget::Entity(b)), &[a]);
        let entity = registry.get(a).unwrap();
        assert_eq!(entity.combat.unwrap().target, Some(b));
        assert!(entity.combat.unwrap().is_attacking);
        assert!(!entity.movement.unwrap().is_moving);
    }

    #[test]
    fn test_gather_moves_toward_resource() {
        let mut registry = EntityRegistry::new();
        let a = soldier(&mut registry, 0);
        let mut node = Entity::new(EntityKind::Resource, "gold", Vec2Fixed::from_int(70, 0));
        node.resource = Some(ResourceNode::new(ResourceKind::Gold, Fixed::from_num(100)));
        let resource = registry.insert(node);

        assert_eq!(
            execute(&mut registry, CommandKind::Gather, Some(CommandTarget::Resource(resource)), &[a]),
            1
        );
        assert_eq!(registry.get(a).unwrap().movement.unwrap().target, Vec2Fixed::from_int(70, 0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut registry = EntityRegistry::new();
        let a = soldier(&mut registry, 0);
        execute(&mut registry, CommandKind::Stop, None, &[a]);
        let once = registry.get(a).cloned();
        execute(&mut registry, CommandKind::Stop, None, &[a]);
        assert_eq!(registry.get(a).cloned(), once);
    }
}
