//! Faction definitions and identifiers.
//!
//! Factions are read-only allegiance markers. Entities hold a
//! [`FactionId`]; two entities are allies exactly when they carry the same
//! id. The simulation core never mutates a faction after registration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub u32);

impl FactionId {
    /// Create a new faction ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A faction definition: identity, display name and map color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    /// Faction identifier.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Map color as a CSS hex string.
    pub color: String,
}

impl Faction {
    /// Color given to factions that were referenced but never defined.
    pub const FALLBACK_COLOR: &'static str = "#cccccc";

    /// Create a new faction definition.
    #[must_use]
    pub fn new(id: FactionId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }

    /// Built-in definition used when data references an unknown faction.
    #[must_use]
    pub fn fallback(id: FactionId) -> Self {
        Self::new(id, format!("Faction {id}"), Self::FALLBACK_COLOR)
    }
}

/// Check whether two allegiances are hostile to each other.
///
/// Only entities that both belong to a faction can be enemies; unaligned
/// entities (resource nodes, neutral props) are never hostile.
#[must_use]
pub fn are_hostile(a: Option<FactionId>, b: Option<FactionId>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Lookup table of known factions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionRegistry {
    factions: BTreeMap<FactionId, Faction>,
}

impl FactionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a faction definition.
    pub fn register(&mut self, faction: Faction) {
        self.factions.insert(faction.id, faction);
    }

    /// Look up a faction.
    #[must_use]
    pub fn get(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// Check if a faction is known.
    #[must_use]
    pub fn contains(&self, id: FactionId) -> bool {
        self.factions.contains_key(&id)
    }

    /// Make sure a faction exists, registering the fallback definition if not.
    ///
    /// Returns `true` when the fallback had to be used.
    pub fn ensure(&mut self, id: FactionId) -> bool {
        if self.factions.contains_key(&id) {
            return false;
        }
        tracing::warn!(faction = %id, "Unknown faction referenced, using default definition");
        self.factions.insert(id, Faction::fallback(id));
        true
    }

    /// Iterate factions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    /// Number of registered factions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factions.len()
    }

    /// Check if no factions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }
}
