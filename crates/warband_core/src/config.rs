//! Simulation tunables.
//!
//! Every field has a default, so a scenario file only needs to name the
//! values it changes.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Largest delta a single tick may consume, in seconds (1/30).
pub const DEFAULT_MAX_DELTA_DIVISOR: i32 = 30;
/// Radius in which idle AI looks for enemies.
pub const DEFAULT_AI_DETECTION_RADIUS: i32 = 200;
/// Maximum distance between gatherer and resource.
pub const DEFAULT_GATHER_RADIUS: i32 = 50;
/// Amount removed from a resource per decision tick.
pub const DEFAULT_GATHER_AMOUNT: i32 = 5;
/// Chance per decision tick that an idle AI starts wandering.
pub const DEFAULT_WANDER_CHANCE: f64 = 0.1;
/// Radius of the disk wander targets are drawn from.
pub const DEFAULT_WANDER_RADIUS: i32 = 100;
/// Pursuit is abandoned beyond this multiple of the attack range.
pub const DEFAULT_PURSUIT_RANGE_MULTIPLIER: i32 = 3;
/// Attack range assumed for AI entities without combat stats.
pub const FALLBACK_ATTACK_RANGE: i32 = 50;

/// Tunables shared by every system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Largest delta a single tick may consume.
    #[serde(with = "fixed_decimal")]
    pub max_delta: Fixed,
    /// Radius in which idle, moving and patrolling AI notice enemies.
    #[serde(with = "fixed_decimal")]
    pub ai_detection_radius: Fixed,
    /// Maximum gathering distance.
    #[serde(with = "fixed_decimal")]
    pub gather_radius: Fixed,
    /// Amount gathered per decision tick.
    #[serde(with = "fixed_decimal")]
    pub gather_amount: Fixed,
    /// Probability that an idle AI wanders on a decision tick.
    ///
    /// Non-finite values load as the default; see
    /// [`wander_probability`](Self::wander_probability).
    #[serde(deserialize_with = "probability::deserialize")]
    pub wander_chance: f64,
    /// Wander targets lie within this distance.
    #[serde(with = "fixed_decimal")]
    pub wander_radius: Fixed,
    /// AI gives up a chase beyond this multiple of its attack range.
    #[serde(with = "fixed_decimal")]
    pub pursuit_range_multiplier: Fixed,
    /// Seconds between AI decisions for newly spawned units.
    #[serde(with = "fixed_decimal")]
    pub decision_interval: Fixed,
    /// Seed for the simulation RNG.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_delta: Fixed::ONE / Fixed::from_num(DEFAULT_MAX_DELTA_DIVISOR),
            ai_detection_radius: Fixed::from_num(DEFAULT_AI_DETECTION_RADIUS),
            gather_radius: Fixed::from_num(DEFAULT_GATHER_RADIUS),
            gather_amount: Fixed::from_num(DEFAULT_GATHER_AMOUNT),
            wander_chance: DEFAULT_WANDER_CHANCE,
            wander_radius: Fixed::from_num(DEFAULT_WANDER_RADIUS),
            pursuit_range_multiplier: Fixed::from_num(DEFAULT_PURSUIT_RANGE_MULTIPLIER),
            decision_interval: Fixed::ONE,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Builder method to set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `wander_chance` as a usable probability: clamped to `[0, 1]`, with
    /// NaN and infinities replaced by the default.
    #[must_use]
    pub fn wander_probability(&self) -> f64 {
        sanitize_probability(self.wander_chance)
    }
}

fn sanitize_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_WANDER_CHANCE
    }
}

mod probability {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        let sanitized = super::sanitize_probability(value);
        if sanitized.to_bits() != value.to_bits() {
            tracing::warn!(value, used = sanitized, "Wander chance out of range");
        }
        Ok(sanitized)
    }
}

/// Serde support for fixed-point numbers written as decimals in config
/// files.
mod fixed_decimal {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::math::{fixed_from_f64, Fixed};

    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(fixed_from_f64)
    }
}
