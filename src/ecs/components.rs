//! Common ECS components

use glam::{Quat, Vec3};

/// Pose component for position and facing
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with a position and a yaw angle (radians)
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
        }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X in local space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn to face a world-space point, rotating about the Y axis only.
    ///
    /// Keeps the current facing when the target sits on top of the
    /// transform (no meaningful direction to face).
    pub fn face_toward(&mut self, target: Vec3) {
        let mut dir = target - self.position;
        dir.y = 0.0;
        if dir.length_squared() > 1e-6 {
            let yaw = (-dir.x).atan2(-dir.z);
            self.rotation = Quat::from_rotation_y(yaw);
        }
    }

    /// Distance to a world-space point
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Name component for logs and debug views
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_toward_aligns_forward() {
        let mut t = Transform::from_position(Vec3::ZERO);
        t.face_toward(Vec3::new(3.0, 0.0, -4.0));
        let fwd = t.forward();
        assert!((fwd - Vec3::new(0.6, 0.0, -0.8)).length() < 1e-5);
    }

    #[test]
    fn test_face_toward_handles_positive_z() {
        let mut t = Transform::from_position(Vec3::ZERO);
        t.face_toward(Vec3::new(0.0, 0.0, 5.0));
        assert!((t.forward() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_face_toward_ignores_degenerate_target() {
        let mut t = Transform::from_position_yaw(Vec3::ONE, 1.2);
        let before = t.rotation;
        t.face_toward(Vec3::ONE);
        assert_eq!(t.rotation, before);
    }
}
