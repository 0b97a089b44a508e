//! Error types for the game simulation.
//!
//! Only the management API returns errors. The tick path never does:
//! a missing component or a stale target degrades to skipping that entity.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but lacks the component the operation needs.
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity that was addressed.
        entity: EntityId,
        /// Name of the missing component.
        component: &'static str,
    },

    /// A unit class the catalog does not define.
    #[error("Unknown unit class: {0}")]
    UnknownClass(String),

    /// A unit does not meet the requirements for retraining into a class.
    #[error("Entity {entity} cannot retrain into '{class}'")]
    RequirementsNotMet {
        /// Unit that was addressed.
        entity: EntityId,
        /// Requested class.
        class: String,
    },

    /// A command name that the dispatcher does not understand.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
