//! An enemy AI simulation built in Rust
//!
//! This crate provides:
//! - Finite state machine agents (patrol, chase, attack, flee)
//! - Cone-and-ray perception with physics-backed line of sight
//! - Grid pathfinding behind a locomotion facade
//! - A fixed-step, headless simulation driver with scenario files

pub mod ai;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod nav;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentContext, AgentController, BehaviorConfig, EnemyAgent, SightProbe, State, StateKind,
        StateRegistry, Visibility, VisionConfig,
    };
    pub use crate::combat::{DeathSequence, Health};
    pub use crate::core::{
        DebugOverlay, EventQueue, GameEvent, Scenario, SimConfig, Simulation, Time,
    };
    pub use crate::ecs::{Name, Transform};
    pub use crate::nav::{NavAgent, NavGrid};
    pub use crate::physics::{Physics, PhysicsBody};
    pub use glam::{Quat, Vec2, Vec3};
}
