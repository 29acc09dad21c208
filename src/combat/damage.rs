//! Damage, healing, and the death countdown
//!
//! Health arithmetic is pure and clamped on both ends; the simulation layer
//! decides when to call it and what the consequences are. Death is
//! edge-triggered: the transition from alive to dead is reported exactly
//! once, on the hit that empties the pool.

use serde::{Deserialize, Serialize};

/// Clamped health pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Create a full pool.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current health
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Fraction of the pool remaining, in `[0, 1]`
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Whether any health remains
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Whether the pool is empty
    #[must_use]
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Apply damage, clamping health at zero.
    ///
    /// Returns `true` only when this hit emptied the pool; hits landing on
    /// an already-dead pool return `false`.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.is_alive();
        self.current = (self.current - amount.max(0.0)).max(0.0);
        was_alive && self.is_dead()
    }

    /// Restore health, clamping at the maximum.
    ///
    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }
}

/// Countdown attached to an agent whose health reached zero.
///
/// While it runs the body stays in the world (AI and locomotion frozen);
/// the simulation removes the entity when it expires.
#[derive(Debug, Clone, Copy)]
pub struct DeathSequence {
    /// Seconds until the body is removed
    pub remaining: f32,
}

impl DeathSequence {
    /// Start a countdown of `delay` seconds
    #[must_use]
    pub fn new(delay: f32) -> Self {
        Self {
            remaining: delay.max(0.0),
        }
    }

    /// Tick the countdown; `true` once it has expired
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}
