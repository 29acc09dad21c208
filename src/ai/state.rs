//! Agent State Contract
//!
//! The closed set of behavior states and the lifecycle every state
//! implements. Transitions are polled: after each update the controller asks
//! the current state where it wants to go, and the state answers with a
//! [`StateKind`] (or `None` to stay). The decision hook takes the context by
//! shared reference, so a state cannot move the agent while deciding.
//!
//! # Design Principles
//!
//! - **Closed graph**: the state set is a plain enum, not open-ended names
//! - **Encapsulation**: each state owns its behavior and transition logic
//! - **Pure decisions**: `check_transitions` is a read-only poll

use std::error::Error;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::controller::AgentContext;

// ============================================================================
// State Kind
// ============================================================================

/// The closed set of agent behavior states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Walk the waypoint route, dwelling at each stop
    Patrol,
    /// Pursue the target while sight, or recent memory of it, lasts
    Chase,
    /// Stand and strike the target on a cooldown
    Attack,
    /// Run for a point away from the target until safe
    Flee,
}

impl StateKind {
    /// Every kind, in registry-validation order.
    pub const ALL: [StateKind; 4] = [
        StateKind::Patrol,
        StateKind::Chase,
        StateKind::Attack,
        StateKind::Flee,
    ];

    /// Short display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::Patrol => "Patrol",
            StateKind::Chase => "Chase",
            StateKind::Attack => "Attack",
            StateKind::Flee => "Flee",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// State Trait
// ============================================================================

/// A behavior state for one agent.
///
/// The lifecycle, driven by the controller:
///
/// 1. `on_enter()` - once, when the state becomes current
/// 2. `on_update()` - every frame while current
/// 3. `check_transitions()` - every frame, right after the update
/// 4. `on_exit()` - once, when the state stops being current
///
/// `Send + Sync` is required because states live inside components stored
/// in the `hecs` world.
pub trait State: fmt::Debug + Send + Sync {
    /// Which kind this state implements.
    fn kind(&self) -> StateKind;

    /// Called once when this state becomes current.
    ///
    /// Use this to reset timers and issue the state's opening move.
    fn on_enter(&mut self, _ctx: &mut AgentContext) {}

    /// Called every frame while this state is current.
    fn on_update(&mut self, _ctx: &mut AgentContext) {}

    /// Called once when this state stops being current.
    fn on_exit(&mut self, _ctx: &mut AgentContext) {}

    /// Decide where to go next; `None` stays in this state.
    ///
    /// Runs on the same frame as `on_update`, immediately after it. The
    /// shared borrow keeps the decision read-only.
    fn check_transitions(&self, ctx: &AgentContext) -> Option<StateKind>;
}

// ============================================================================
// State Registry
// ============================================================================

/// Registry of state implementations, keyed by kind.
///
/// A duplicate registration replaces the earlier one (with a warning).
/// Insertion order is remembered so the controller can fall back to the
/// first registered state when no starting kind is configured.
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: FxHashMap<StateKind, Box<dyn State>>,
    order: Vec<StateKind>,
}

impl StateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state under its own kind.
    pub fn register(&mut self, state: Box<dyn State>) {
        let kind = state.kind();
        if self.states.insert(kind, state).is_some() {
            log::warn!("state {kind} registered twice, keeping the later one");
        } else {
            self.order.push(kind);
        }
    }

    /// Check that every kind in [`StateKind::ALL`] has an implementation.
    ///
    /// The graph is closed, so a missing state is a configuration bug worth
    /// failing on before the first frame rather than mid-run.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let missing: Vec<StateKind> = StateKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.states.contains_key(kind))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError { missing })
        }
    }

    /// Whether a kind has a registered implementation
    #[must_use]
    pub fn contains(&self, kind: StateKind) -> bool {
        self.states.contains_key(&kind)
    }

    /// Borrow a state mutably by kind
    pub fn get_mut(&mut self, kind: StateKind) -> Option<&mut dyn State> {
        match self.states.get_mut(&kind) {
            Some(state) => Some(state.as_mut()),
            None => None,
        }
    }

    /// The first registered kind, if any
    #[must_use]
    pub fn first(&self) -> Option<StateKind> {
        self.order.first().copied()
    }

    /// Registered kinds, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = StateKind> + '_ {
        self.order.iter().copied()
    }

    /// Number of registered states
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no states are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Error from [`StateRegistry::validate`]: kinds with no implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    /// Kinds missing from the registry
    pub missing: Vec<StateKind>,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no state registered for:")?;
        for kind in &self.missing {
            write!(f, " {kind}")?;
        }
        Ok(())
    }
}

impl Error for RegistryError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal state for registry tests
    #[derive(Debug)]
    struct Stub(StateKind);

    impl State for Stub {
        fn kind(&self) -> StateKind {
            self.0
        }

        fn check_transitions(&self, _ctx: &AgentContext) -> Option<StateKind> {
            None
        }
    }

    #[test]
    fn test_validate_accepts_full_registry() {
        let mut registry = StateRegistry::new();
        for kind in StateKind::ALL {
            registry.register(Box::new(Stub(kind)));
        }

        assert!(registry.validate().is_ok());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_validate_names_missing_kinds() {
        let mut registry = StateRegistry::new();
        registry.register(Box::new(Stub(StateKind::Patrol)));
        registry.register(Box::new(Stub(StateKind::Chase)));

        let err = registry.validate().expect_err("two kinds are missing");

        assert_eq!(err.missing, vec![StateKind::Attack, StateKind::Flee]);
        let msg = err.to_string();
        assert!(msg.contains("Attack"));
        assert!(msg.contains("Flee"));
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let mut registry = StateRegistry::new();
        registry.register(Box::new(Stub(StateKind::Patrol)));
        registry.register(Box::new(Stub(StateKind::Patrol)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.first(), Some(StateKind::Patrol));
    }

    #[test]
    fn test_first_follows_registration_order() {
        let mut registry = StateRegistry::new();
        registry.register(Box::new(Stub(StateKind::Flee)));
        registry.register(Box::new(Stub(StateKind::Patrol)));

        assert_eq!(registry.first(), Some(StateKind::Flee));
        let kinds: Vec<_> = registry.kinds().collect();
        assert_eq!(kinds, vec![StateKind::Flee, StateKind::Patrol]);
    }

    #[test]
    fn test_get_mut_misses_unregistered_kind() {
        let mut registry = StateRegistry::new();
        registry.register(Box::new(Stub(StateKind::Patrol)));

        assert!(registry.get_mut(StateKind::Attack).is_none());
        assert!(registry.get_mut(StateKind::Patrol).is_some());
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(StateKind::Patrol.to_string(), "Patrol");
        assert_eq!(StateKind::Flee.as_str(), "Flee");
        assert_eq!(StateKind::ALL.len(), 4);
    }
}
