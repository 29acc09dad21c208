//! Agent Blackboard
//!
//! Per-agent data the states read and write through the context: health,
//! vision tuning, attack reach, the waypoint route, and a private seeded
//! RNG stream. Each agent owns its stream, so one agent's draws never
//! perturb another's and whole runs replay from the scenario seeds.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::perception::VisionConfig;
use crate::combat::Health;

/// The waypoint route an agent patrols.
#[derive(Debug, Clone)]
pub struct WaypointSet {
    points: Vec<Vec3>,
    cursor: usize,
}

impl WaypointSet {
    /// Create a route. The starting waypoint is drawn at random so agents
    /// sharing a route do not march in lockstep.
    pub fn new(points: Vec<Vec3>, rng: &mut impl Rng) -> Self {
        let cursor = if points.len() > 1 {
            rng.gen_range(0..points.len())
        } else {
            0
        };
        Self { points, cursor }
    }

    /// The waypoint the agent is currently headed for
    #[must_use]
    pub fn current(&self) -> Option<Vec3> {
        self.points.get(self.cursor).copied()
    }

    /// Number of waypoints on the route
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Move the cursor to a uniformly random *different* waypoint.
    ///
    /// With zero or one waypoint the cursor stays put.
    pub fn advance(&mut self, rng: &mut impl Rng) {
        if self.points.len() > 1 {
            // Draw among the other indices by skipping over the current one
            let mut next = rng.gen_range(0..self.points.len() - 1);
            if next >= self.cursor {
                next += 1;
            }
            self.cursor = next;
        }
    }
}

/// Blackboard component for one enemy agent.
#[derive(Debug, Clone)]
pub struct EnemyAgent {
    /// Current and maximum health
    pub health: Health,
    /// Vision tuning
    pub vision: VisionConfig,
    /// Reach within which the agent strikes instead of closing in
    pub attack_range: f32,
    /// Patrol route
    pub waypoints: WaypointSet,
    /// Gate for all AI processing; cleared when the agent dies
    pub ai_enabled: bool,
    /// Private RNG stream
    rng: ChaCha8Rng,
}

impl EnemyAgent {
    /// Create an agent from its spawn data.
    pub fn new(
        seed: u64,
        max_health: f32,
        vision: VisionConfig,
        attack_range: f32,
        waypoints: Vec<Vec3>,
    ) -> Self {
        if waypoints.is_empty() {
            log::warn!("agent spawned with no waypoints; it will hold position while patrolling");
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let waypoints = WaypointSet::new(waypoints, &mut rng);

        Self {
            health: Health::new(max_health),
            vision,
            attack_range,
            waypoints,
            ai_enabled: true,
            rng,
        }
    }

    /// Whether health has fallen below the flee threshold (half of max)
    #[must_use]
    pub fn is_wounded(&self) -> bool {
        self.health.fraction() < 0.5
    }

    /// Advance the route cursor using the agent's own RNG stream
    pub fn advance_waypoint(&mut self) {
        self.waypoints.advance(&mut self.rng);
    }

    /// Borrow the agent's RNG stream (diagnostic probes draw from it)
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}
