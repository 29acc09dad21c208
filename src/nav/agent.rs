//! Locomotion facade for navigating agents
//!
//! [`NavAgent`] is the only surface the AI layer steers through: it accepts
//! a speed and a destination, and the nav tick does the planning and the
//! actual movement. Destination requests are planned on the next tick, so
//! `path_pending` is observable for exactly the frames between request and
//! plan.
//!
//! Requests that cannot be served (agent off the mesh, no route) are dropped
//! without error; the AI keeps running and only the motion is skipped.

use glam::Vec3;

use super::{NavGrid, find_path};
use crate::ecs::Transform;

/// Destination-driven locomotion state for one agent
#[derive(Debug, Clone, Default)]
pub struct NavAgent {
    /// Movement speed in world units per second
    speed: f32,
    /// Destination requested but not yet planned
    requested: Option<Vec3>,
    /// Remaining corners of the active path, next corner first
    path: Vec<Vec3>,
    /// Destination of the active path
    destination: Option<Vec3>,
}

impl NavAgent {
    /// Distance at which a destination counts as reached
    pub const ARRIVAL_THRESHOLD: f32 = 0.5;

    /// Create an idle agent (speed zero, no destination)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement speed in world units per second
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Get the movement speed
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Request a move to a world-space point.
    ///
    /// The request is planned on the next nav tick. It is silently dropped
    /// there if the agent is not standing on the mesh or no route exists;
    /// the previous path, if any, keeps playing out.
    pub fn set_destination(&mut self, point: Vec3) {
        self.requested = Some(point);
    }

    /// Destination of the active path, if any
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Whether a destination request is waiting to be planned
    #[must_use]
    pub fn path_pending(&self) -> bool {
        self.requested.is_some()
    }

    /// Whether the agent has arrived.
    ///
    /// True when no plan is pending and the remaining path distance from
    /// `position` is below [`Self::ARRIVAL_THRESHOLD`]. An agent that was
    /// never given a destination counts as arrived.
    #[must_use]
    pub fn has_reached(&self, position: Vec3) -> bool {
        !self.path_pending() && self.remaining_distance(position) < Self::ARRIVAL_THRESHOLD
    }

    /// Distance left along the active path, measured from `position`
    #[must_use]
    pub fn remaining_distance(&self, position: Vec3) -> f32 {
        let Some(first) = self.path.first() else {
            return 0.0;
        };
        let mut total = position.distance(*first);
        for pair in self.path.windows(2) {
            total += pair[0].distance(pair[1]);
        }
        total
    }

    /// Drop the pending request and the active path
    pub fn stop(&mut self) {
        self.requested = None;
        self.path.clear();
        self.destination = None;
    }

    /// Advance the agent by one tick: plan any pending request, then follow
    /// the path at the current speed, turning the transform to face travel.
    pub fn tick(&mut self, dt: f32, grid: &NavGrid, transform: &mut Transform) {
        self.plan_pending(grid, transform.position);

        if self.speed <= 0.0 {
            return;
        }

        let mut budget = self.speed * dt;
        while budget > 1e-6 {
            let Some(&next) = self.path.first() else {
                break;
            };
            let to = next - transform.position;
            let dist = to.length();
            if dist < 1e-4 {
                self.path.remove(0);
                continue;
            }
            transform.face_toward(next);
            if dist <= budget {
                transform.position = next;
                self.path.remove(0);
                budget -= dist;
            } else {
                transform.position += to / dist * budget;
                break;
            }
        }
    }

    fn plan_pending(&mut self, grid: &NavGrid, position: Vec3) {
        let Some(goal) = self.requested.take() else {
            return;
        };

        if !grid.is_on_navigable(position) {
            log::debug!("move request dropped: agent is off the mesh");
            return;
        }

        let result = find_path(grid, position, goal);
        if result.is_empty() {
            log::debug!("move request dropped: no route to {goal}");
            return;
        }

        let mut corners = result.corners;
        // The first corner is the center of the cell the agent already
        // stands in; walking back to it would zigzag.
        if corners.len() > 1 {
            corners.remove(0);
        }
        // Steer to the exact requested point rather than its cell center.
        if let Some(last) = corners.last_mut() {
            *last = Vec3::new(goal.x, grid.surface_height, goal.z);
        }

        self.path = corners;
        self.destination = Some(goal);
    }
}

/// Pick a point roughly `distance` away from `threat`, on the mesh.
///
/// The candidate straight-line point is snapped to the nearest navigable
/// position within `distance`; when nothing navigable is in reach (or the
/// threat is standing exactly on the agent) the agent's own position comes
/// back, which the caller treats as "nowhere to run".
#[must_use]
pub fn flee_point(grid: &NavGrid, from: Vec3, threat: Vec3, distance: f32) -> Vec3 {
    let mut away = from - threat;
    away.y = 0.0;
    if away.length_squared() < 1e-6 {
        return from;
    }

    let candidate = from + away.normalize() * distance;
    grid.sample_nearest(candidate, distance).unwrap_or(from)
}
