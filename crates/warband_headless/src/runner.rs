//! Frame-driven headless runs.
//!
//! The runner plays the role of the host: it produces millisecond frame
//! timestamps, feeds them through a [`FrameClock`] and ticks the simulation
//! once per frame, tallying the notifications it gets back.

use serde::Serialize;
use warband_core::diagnostics::GameStats;
use warband_core::events::Notification;
use warband_core::simulation::{FrameClock, Simulation};

/// Default frame interval, 60 frames per second.
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// How to drive a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Frames to simulate.
    pub frames: u64,
    /// Milliseconds between frames.
    pub frame_ms: f64,
    /// Stop early once at most one faction has live units.
    pub stop_on_victory: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_ms: DEFAULT_FRAME_MS,
            stop_on_victory: false,
        }
    }
}

/// Counters accumulated from tick notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventTally {
    /// Attacks executed.
    pub attacks: u64,
    /// Entities that died.
    pub deaths: u64,
    /// Movement targets reached.
    pub arrivals: u64,
    /// Total resources gathered.
    pub gathered: f64,
    /// Resource nodes exhausted.
    pub depleted: u64,
    /// Level-ups.
    pub level_ups: u64,
    /// Buildings finished.
    pub constructions: u64,
    /// Units produced.
    pub produced: u64,
    /// Units that finished retraining.
    pub retrained: u64,
    /// Units that entered a building.
    pub garrisoned: u64,
}

impl EventTally {
    /// Count one notification.
    pub fn record(&mut self, notification: &Notification) {
        match notification {
            Notification::Attacked { .. } => self.attacks += 1,
            Notification::Died { .. } => self.deaths += 1,
            Notification::MovementComplete { .. } => self.arrivals += 1,
            Notification::ResourceGathered { amount, .. } => self.gathered += amount.to_num::<f64>(),
            Notification::ResourceDepleted { .. } => self.depleted += 1,
            Notification::LevelUp { .. } => self.level_ups += 1,
            Notification::ConstructionComplete { .. } => self.constructions += 1,
            Notification::UnitProduced { .. } => self.produced += 1,
            Notification::LearningComplete { .. } => self.retrained += 1,
            Notification::Garrisoned { .. } => self.garrisoned += 1,
            Notification::Damaged { .. } | Notification::Ungarrisoned { .. } => {}
        }
    }
}

/// Result of a headless run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Frames actually driven.
    pub frames: u64,
    /// Final state hash, for comparing runs.
    pub state_hash: u64,
    /// The faction still fielding units, if only one remains.
    pub winner: Option<u32>,
    /// Notification counters.
    pub events: EventTally,
    /// Final world statistics.
    pub stats: GameStats,
}

/// Drive `sim` for `options.frames` frames.
pub fn run(sim: &mut Simulation, scenario: &str, options: &RunOptions) -> RunSummary {
    let mut clock = FrameClock::new();
    let mut tally = EventTally::default();
    let mut frames = 0;

    // The first frame only primes the clock and simulates nothing.
    let mut now_ms = 0.0;
    clock.advance(now_ms);

    while frames < options.frames {
        now_ms += options.frame_ms;
        let events = sim.tick_seconds(clock.advance(now_ms));
        frames += 1;

        for notification in &events.notifications {
            tally.record(notification);
        }
        if !events.removed.is_empty() {
            tracing::debug!(tick = events.tick, removed = events.removed.len(), "Entities removed");
        }

        if options.stop_on_victory && surviving_faction(sim).is_some() {
            tracing::info!(tick = events.tick, "One faction left standing");
            break;
        }
    }

    let summary = RunSummary {
        scenario: scenario.to_string(),
        frames,
        state_hash: sim.state_hash(),
        winner: surviving_faction(sim),
        events: tally,
        stats: sim.stats(),
    };
    tracing::info!(
        frames,
        tick = summary.stats.tick,
        alive = summary.stats.alive_entities,
        "Run finished"
    );
    summary
}

/// The only faction with live units, if exactly one has any.
#[must_use]
pub fn surviving_faction(sim: &Simulation) -> Option<u32> {
    let mut factions = sim
        .entities()
        .iter_sorted()
        .filter(|e| e.is_alive() && e.movement.is_some())
        .filter_map(|e| e.faction.map(|f| f.0));
    let first = factions.next()?;
    factions.all(|f| f == first).then_some(first)
}
