//! Line-of-Sight Perception
//!
//! Decides whether an agent can see its target. Checks run cheapest-first:
//! a range gate, then a vision-cone gate, and only then sight rays against
//! world geometry. Geometry is consulted through the narrow [`SightProbe`]
//! trait, so the physics world can back it in the simulation while tests
//! drive the checks with stubs.
//!
//! # Design Principles
//!
//! - **Cheap checks first**: distance, then angle, then raycasts
//! - **Narrow seam**: geometry is reached through `SightProbe` only
//! - **Reasoned verdicts**: [`check_visibility`] reports *why* sight failed

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ecs::Transform;

// ============================================================================
// Configuration
// ============================================================================

/// Ray pattern used by a visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisionMode {
    /// One ray at the target's center.
    #[default]
    Single,
    /// Five rays fanned over the target's silhouette (center, above, below,
    /// left, right). Sight holds when at least half of them get through.
    Spread,
}

/// Vision tuning for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Maximum sight distance
    pub range: f32,
    /// Full width of the vision cone, in degrees
    pub angle: f32,
    /// Sight-ray origin height above the agent's position
    pub eye_height: f32,
    /// Ray pattern
    pub mode: VisionMode,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            range: 10.0,
            angle: 60.0,
            eye_height: 0.5,
            mode: VisionMode::Single,
        }
    }
}

// ============================================================================
// Sight Probe
// ============================================================================

/// What a single sight ray struck.
#[derive(Debug, Clone, Copy)]
pub struct SightHit {
    /// Distance from the ray origin to the struck collider
    pub distance: f32,
    /// Whether the struck collider belongs to the looked-for entity
    pub hit_target: bool,
}

/// Oracle answering "what does this ray strike first".
///
/// The simulation implements this over the physics world; perception tests
/// substitute stubs. `direction` is expected to be normalized.
pub trait SightProbe {
    /// Cast one sight ray. `None` when nothing is struck within
    /// `max_distance`.
    fn cast_sight_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32)
    -> Option<SightHit>;
}

// ============================================================================
// Visibility Checks
// ============================================================================

/// Verdict of a visibility check, with the reason sight failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    /// The target can be seen.
    Visible,
    /// The target is beyond sight range.
    OutOfRange {
        /// Measured distance to the target
        distance: f32,
    },
    /// The target is outside the vision cone.
    OutOfAngle {
        /// Measured angle off the forward axis, in degrees
        angle: f32,
    },
    /// World geometry stands between the eye and the target.
    Blocked {
        /// Distance to the first obstruction
        distance: f32,
    },
}

impl Visibility {
    /// Whether the verdict means the target is seen
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Visible => write!(f, "clear"),
            Visibility::OutOfRange { distance } => write!(f, "out of range ({distance:.1})"),
            Visibility::OutOfAngle { angle } => write!(f, "out of vision angle ({angle:.0} deg)"),
            Visibility::Blocked { distance } => write!(f, "blocked ({distance:.1})"),
        }
    }
}

/// Full visibility test with a reasoned verdict.
///
/// The distance and angle gates are measured from the agent's position; the
/// sight rays originate at eye height above it.
pub fn check_visibility(
    pose: &Transform,
    vision: &VisionConfig,
    target: Vec3,
    probe: &dyn SightProbe,
) -> Visibility {
    let distance = pose.position.distance(target);
    if distance > vision.range {
        return Visibility::OutOfRange { distance };
    }
    if distance < 1e-4 {
        // Standing inside the target; no meaningful ray to cast
        return Visibility::Visible;
    }

    let direction = (target - pose.position) / distance;
    let angle = pose.forward().angle_between(direction).to_degrees();
    if angle > vision.angle * 0.5 {
        return Visibility::OutOfAngle { angle };
    }

    let eye = pose.position + Vec3::Y * vision.eye_height;
    match vision.mode {
        VisionMode::Single => single_ray_verdict(eye, direction, distance, probe),
        VisionMode::Spread => spread_verdict(pose, eye, direction, distance, probe),
    }
}

/// Convenience wrapper over [`check_visibility`]: just the boolean.
#[must_use]
pub fn can_see_target(
    pose: &Transform,
    vision: &VisionConfig,
    target: Vec3,
    probe: &dyn SightProbe,
) -> bool {
    check_visibility(pose, vision, target, probe).is_visible()
}

fn single_ray_verdict(
    eye: Vec3,
    direction: Vec3,
    distance: f32,
    probe: &dyn SightProbe,
) -> Visibility {
    match probe.cast_sight_ray(eye, direction, distance) {
        Some(hit) if !hit.hit_target => Visibility::Blocked {
            distance: hit.distance,
        },
        // Struck the target, or nothing stands in the way
        _ => Visibility::Visible,
    }
}

fn spread_verdict(
    pose: &Transform,
    eye: Vec3,
    direction: Vec3,
    distance: f32,
    probe: &dyn SightProbe,
) -> Visibility {
    let right = pose.right();
    let directions: SmallVec<[Vec3; 5]> = SmallVec::from_buf([
        direction,
        (direction + Vec3::Y * 0.3).normalize(),
        (direction - Vec3::Y * 0.3).normalize(),
        (direction + right * 0.2).normalize(),
        (direction - right * 0.2).normalize(),
    ]);

    let mut successful = 0;
    let mut first_block = None;
    for dir in &directions {
        match probe.cast_sight_ray(eye, *dir, distance) {
            Some(hit) if !hit.hit_target => {
                if first_block.is_none() {
                    first_block = Some(hit.distance);
                }
            }
            _ => successful += 1,
        }
    }

    if successful >= directions.len() / 2 {
        Visibility::Visible
    } else {
        Visibility::Blocked {
            distance: first_block.unwrap_or(distance),
        }
    }
}

// ============================================================================
// Random-Spread Diagnostics
// ============================================================================

/// Report from the random-spread diagnostic probe.
#[derive(Debug, Clone, Copy)]
pub struct SpreadReport {
    /// Whether the ray stage passes under the at-least-half rule
    pub visible: bool,
    /// Rays that reached the target or met no obstruction
    pub successful_rays: usize,
    /// Total rays fired
    pub ray_count: usize,
    /// Distance to the first obstruction, if any ray was blocked
    pub first_block: Option<f32>,
}

/// Random-spread visibility probe for diagnostics.
///
/// Exercises only the ray stage (no range or cone gates): ray 0 goes exactly
/// at the target, the rest are jittered by up to `spread` on the world X and
/// Y axes. The at-least-half success rule matches [`VisionMode::Spread`].
/// The RNG is injected so reports are reproducible.
pub fn spread_probe(
    pose: &Transform,
    vision: &VisionConfig,
    target: Vec3,
    probe: &dyn SightProbe,
    ray_count: usize,
    spread: f32,
    rng: &mut impl Rng,
) -> SpreadReport {
    let ray_count = ray_count.max(1);
    let eye = pose.position + Vec3::Y * vision.eye_height;
    let to_target = target - eye;
    let distance = to_target.length();

    if distance < 1e-4 {
        return SpreadReport {
            visible: true,
            successful_rays: ray_count,
            ray_count,
            first_block: None,
        };
    }

    let direction = to_target / distance;
    let mut successful = 0;
    let mut first_block = None;

    for i in 0..ray_count {
        let dir = if i == 0 || spread <= 0.0 {
            direction
        } else {
            let jitter = Vec3::new(
                rng.gen_range(-spread..spread),
                rng.gen_range(-spread..spread),
                0.0,
            );
            (direction + jitter).normalize()
        };

        match probe.cast_sight_ray(eye, dir, distance) {
            Some(hit) if !hit.hit_target => {
                if first_block.is_none() {
                    first_block = Some(hit.distance);
                }
            }
            _ => successful += 1,
        }
    }

    SpreadReport {
        visible: successful >= ray_count / 2,
        successful_rays: successful,
        ray_count,
        first_block,
    }
}

// ============================================================================
// Tests
// ============================================================================
