//! Navigation module
//!
//! Grid-backed navigation: a walkable-cell grid, A* path queries over it,
//! and the locomotion facade the AI layer steers through.

mod agent;
mod grid;
mod path;

pub use agent::{NavAgent, flee_point};
pub use grid::NavGrid;
pub use path::{PathResult, find_path};
