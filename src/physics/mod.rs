//! Physics simulation module
//!
//! Built on top of rapier3d

mod world;

pub use world::{BodyHandle, ColliderId, Physics, PhysicsBody, RaycastHit, SightQuery};
