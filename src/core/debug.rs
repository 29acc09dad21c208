//! Debug observer module
//!
//! Read-only observability for the simulation: per-agent snapshots captured
//! after each frame, plus a sampled vision fan for drawing perception cones.
//! Nothing in here feeds back into behavior.

use glam::{Quat, Vec3};
use hecs::Entity;

use crate::ai::{SightProbe, Visibility, VisionConfig};
use crate::ecs::Transform;

// ============================================================================
// Agent Snapshot
// ============================================================================

/// One agent's observable AI state, captured at the end of a frame.
#[derive(Debug, Clone)]
pub struct AgentSnapshot {
    /// The agent's entity id
    pub entity: Entity,
    /// The agent's display name
    pub name: String,
    /// Current state name ("None" for an idle controller)
    pub state: &'static str,
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// This frame's perception verdict, if a target existed
    pub visibility: Option<Visibility>,
    /// Where the agent is headed, if anywhere
    pub destination: Option<Vec3>,
    /// The agent's position
    pub position: Vec3,
}

impl AgentSnapshot {
    /// One formatted overlay line for this agent.
    #[must_use]
    pub fn format_line(&self) -> String {
        let sight = self
            .visibility
            .map_or_else(|| "no target".to_string(), |v| v.to_string());
        let destination = self.destination.map_or_else(
            || "holding".to_string(),
            |d| format!("({:.1}, {:.1}, {:.1})", d.x, d.y, d.z),
        );
        format!(
            "{} [{}] hp {:.0}/{:.0} | sight: {} | dest: {} | at ({:.1}, {:.1}, {:.1})",
            self.name,
            self.state,
            self.health,
            self.max_health,
            sight,
            destination,
            self.position.x,
            self.position.y,
            self.position.z,
        )
    }
}

// ============================================================================
// Debug Overlay
// ============================================================================

/// Collected debug state for one frame.
///
/// The frame driver clears and refills this each frame while the overlay is
/// enabled; consumers read snapshots or formatted lines.
#[derive(Debug, Default)]
pub struct DebugOverlay {
    /// Whether the overlay collects anything
    enabled: bool,
    /// Snapshots recorded this frame
    snapshots: Vec<AgentSnapshot>,
}

impl DebugOverlay {
    /// Create a disabled overlay
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle collection on or off
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.snapshots.clear();
        }
    }

    /// Enable or disable collection
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.snapshots.clear();
        }
    }

    /// Whether the overlay is collecting
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drop the previous frame's snapshots
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Record one agent's snapshot
    pub fn record(&mut self, snapshot: AgentSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Snapshots recorded this frame
    #[must_use]
    pub fn agents(&self) -> &[AgentSnapshot] {
        &self.snapshots
    }

    /// All overlay lines: a header plus one line per agent
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("agents: {}", self.snapshots.len())];
        lines.extend(self.snapshots.iter().map(AgentSnapshot::format_line));
        lines
    }
}

// ============================================================================
// Vision Fan
// ============================================================================

/// One sampled ray of an agent's vision cone.
#[derive(Debug, Clone, Copy)]
pub struct FanRay {
    /// World-space ray direction
    pub direction: Vec3,
    /// Reach of the ray: the hit distance, or the full vision range
    pub distance: f32,
    /// Whether something clipped the ray short
    pub blocked: bool,
}

/// Sample an agent's vision cone as a fan of rays for drawing.
///
/// Rays sweep the full cone from the left edge to the right edge; each ray
/// is clipped at the first thing it hits. Purely diagnostic: the perception
/// check itself never sweeps.
#[must_use]
pub fn sample_vision_fan(
    pose: &Transform,
    vision: &VisionConfig,
    probe: &dyn SightProbe,
    ray_count: usize,
) -> Vec<FanRay> {
    if ray_count == 0 {
        return Vec::new();
    }

    let eye = pose.position + Vec3::Y * vision.eye_height;
    let forward = pose.forward();
    let half_angle = (vision.angle * 0.5).to_radians();

    let mut rays = Vec::with_capacity(ray_count);
    for i in 0..ray_count {
        let yaw = if ray_count == 1 {
            0.0
        } else {
            let t = i as f32 / (ray_count - 1) as f32;
            -half_angle + t * half_angle * 2.0
        };
        let direction = Quat::from_rotation_y(yaw) * forward;

        let ray = match probe.cast_sight_ray(eye, direction, vision.range) {
            Some(hit) => FanRay {
                direction,
                distance: hit.distance,
                blocked: true,
            },
            None => FanRay {
                direction,
                distance: vision.range,
                blocked: false,
            },
        };
        rays.push(ray);
    }
    rays
}

// ============================================================================
// Tests
// ============================================================================
