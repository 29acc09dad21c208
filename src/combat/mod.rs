//! Combat module
//!
//! Clamped health pools and the post-death countdown.

mod damage;

pub use damage::{DeathSequence, Health};
