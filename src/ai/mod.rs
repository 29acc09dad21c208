//! Agent AI module
//!
//! Provides perception, the behavior state machine, the concrete behaviors,
//! and the per-agent controller that drives them.

mod agent;
mod controller;
mod perception;
mod state;
mod states;

pub use agent::{EnemyAgent, WaypointSet};
pub use controller::{AgentContext, AgentController, TargetInfo};
pub use perception::{
    SightHit, SightProbe, SpreadReport, Visibility, VisionConfig, VisionMode, can_see_target,
    check_visibility, spread_probe,
};
pub use state::{RegistryError, State, StateKind, StateRegistry};
pub use states::{
    AttackConfig, AttackState, BehaviorConfig, ChaseConfig, ChaseState, FleeConfig, FleeState,
    PatrolConfig, PatrolState, standard_registry,
};
