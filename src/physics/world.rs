//! Physics world backing sight-ray queries
//!
//! Built on rapier3d. The simulation has no dynamic bodies: obstacles are
//! fixed, characters are position-based kinematic, and the world exists so
//! that sight rays have real geometry to strike.

use glam::Vec3;
use rapier3d::prelude::*;

use crate::ai::{SightHit, SightProbe};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub rapier3d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(pub rapier3d::geometry::ColliderHandle);

/// Component tying an entity to its body and collider
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    /// The entity's rigid body
    pub body: BodyHandle,
    /// The entity's collider
    pub collider: ColliderId,
}

/// Physics world manager
pub struct Physics {
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasting
    query_pipeline: QueryPipeline,
    integration_parameters: IntegrationParameters,
}

impl Physics {
    /// Create an empty physics world
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
        }
    }

    /// Step the physics world.
    ///
    /// Applies queued kinematic moves and refreshes the query pipeline;
    /// raycasts reflect collider positions as of the last step.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        // All bodies are fixed or kinematic; gravity never acts on them.
        self.pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Create a static rigid body (doesn't move)
    pub fn create_static_body(&mut self, position: Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position.x, position.y, position.z])
            .build();

        BodyHandle(self.rigid_body_set.insert(body))
    }

    /// Create a kinematic rigid body (position set directly each frame)
    pub fn create_kinematic_body(&mut self, position: Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position.x, position.y, position.z])
            .build();

        BodyHandle(self.rigid_body_set.insert(body))
    }

    /// Add a box collider to a rigid body
    pub fn add_box_collider(&mut self, body: BodyHandle, half_extents: Vec3) -> ColliderId {
        let collider =
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();

        ColliderId(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ))
    }

    /// Add an upright capsule collider to a rigid body
    pub fn add_capsule_collider(
        &mut self,
        body: BodyHandle,
        half_height: f32,
        radius: f32,
    ) -> ColliderId {
        let collider = ColliderBuilder::capsule_y(half_height, radius).build();

        ColliderId(self.collider_set.insert_with_parent(
            collider,
            body.0,
            &mut self.rigid_body_set,
        ))
    }

    /// Get the position of a rigid body
    pub fn get_position(&self, body: BodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec3::new(pos.x, pos.y, pos.z)
        })
    }

    /// Queue a position for a kinematic body, applied on the next step
    pub fn set_kinematic_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
        }
    }

    /// Cast a ray and return the first hit.
    ///
    /// `direction` must be normalized. Bodies named in `exclude` are
    /// transparent to the ray (used to keep an agent from seeing its own
    /// collider first).
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<BodyHandle>,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let mut filter = QueryFilter::default();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body.0);
        }

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(handle, distance)| {
                let point = ray.point_at(distance);
                RaycastHit {
                    collider: ColliderId(handle),
                    point: Vec3::new(point.x, point.y, point.z),
                    distance,
                }
            })
    }

    /// Borrow a sight probe for one agent.
    ///
    /// `target` is the collider that counts as "the looked-for entity";
    /// `exclude` is the agent's own body, kept transparent to its rays.
    pub fn sight_probe(
        &self,
        target: Option<ColliderId>,
        exclude: Option<BodyHandle>,
    ) -> SightQuery<'_> {
        SightQuery {
            physics: self,
            target,
            exclude,
        }
    }

    /// Remove a rigid body and its colliders
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a raycast
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderId,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Per-agent view of the physics world as a sight-ray oracle
pub struct SightQuery<'a> {
    physics: &'a Physics,
    target: Option<ColliderId>,
    exclude: Option<BodyHandle>,
}

impl SightProbe for SightQuery<'_> {
    fn cast_sight_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<SightHit> {
        self.physics
            .raycast(origin, direction, max_distance, self.exclude)
            .map(|hit| SightHit {
                distance: hit.distance,
                hit_target: Some(hit.collider) == self.target,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_box() -> (Physics, BodyHandle, ColliderId) {
        let mut physics = Physics::new();
        let body = physics.create_static_body(Vec3::new(5.0, 0.0, 0.0));
        let collider = physics.add_box_collider(body, Vec3::ONE);
        // Populate the query pipeline
        physics.step(1.0 / 60.0);
        (physics, body, collider)
    }

    #[test]
    fn test_raycast_hits_box() {
        let (physics, _, collider) = world_with_box();

        let hit = physics
            .raycast(Vec3::ZERO, Vec3::X, 20.0, None)
            .expect("box is in the ray's path");

        assert_eq!(hit.collider, collider);
        assert!((hit.distance - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_raycast_misses_behind() {
        let (physics, _, _) = world_with_box();

        assert!(physics.raycast(Vec3::ZERO, Vec3::NEG_X, 20.0, None).is_none());
    }

    #[test]
    fn test_raycast_excluded_body_is_transparent() {
        let (physics, body, _) = world_with_box();

        let hit = physics.raycast(Vec3::ZERO, Vec3::X, 20.0, Some(body));

        assert!(hit.is_none());
    }

    #[test]
    fn test_kinematic_move_applies_on_step() {
        let mut physics = Physics::new();
        let body = physics.create_kinematic_body(Vec3::ZERO);
        physics.add_capsule_collider(body, 0.5, 0.3);

        physics.set_kinematic_position(body, Vec3::new(2.0, 0.0, 0.0));
        physics.step(1.0 / 60.0);

        let pos = physics.get_position(body).expect("body exists");
        assert!((pos - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_sight_probe_identifies_target() {
        let mut physics = Physics::new();
        let wall = physics.create_static_body(Vec3::new(3.0, 0.0, 0.0));
        physics.add_box_collider(wall, Vec3::new(0.5, 2.0, 2.0));
        let target_body = physics.create_kinematic_body(Vec3::new(8.0, 0.0, 0.0));
        let target = physics.add_capsule_collider(target_body, 0.5, 0.4);
        physics.step(1.0 / 60.0);

        let probe = physics.sight_probe(Some(target), None);

        // The wall is struck first, so the target is not seen
        let hit = probe
            .cast_sight_ray(Vec3::ZERO, Vec3::X, 20.0)
            .expect("wall blocks the ray");
        assert!(!hit.hit_target);

        // From past the wall the target itself is struck
        let hit = probe
            .cast_sight_ray(Vec3::new(5.0, 0.0, 0.0), Vec3::X, 20.0)
            .expect("target is in the ray's path");
        assert!(hit.hit_target);
    }
}
