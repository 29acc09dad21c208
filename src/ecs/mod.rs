//! Entity Component System module
//!
//! Component types shared across the simulation. Entity storage itself is
//! plain `hecs::World`; this module only contributes the component structs.

mod components;

pub use components::{Name, Transform};
