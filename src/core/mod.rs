//! Core simulation module
//!
//! Contains the simulation driver, the event queue, scenario data, and the
//! debug observer

mod debug;
mod events;
mod scenario;
mod sim;
mod time;

pub use debug::{AgentSnapshot, DebugOverlay, FanRay, sample_vision_fan};
pub use events::{EventQueue, GameEvent};
pub use scenario::{EnemySpec, GridSpec, Obstacle, PlayerSpec, Scenario, ScenarioError};
pub use sim::{PlayerRef, SimConfig, Simulation};
pub use time::Time;
