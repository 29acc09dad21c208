//! Event Queue System for Decoupled Communication
//!
//! This module provides a type-safe, double-buffered event queue that lets
//! the AI, combat, and debug layers observe each other without direct
//! coupling. Events are written during one frame and processed in the next,
//! ensuring consistent behavior.
//!
//! # Design Principles
//!
//! - **Type Safety**: All events are strongly typed via the `GameEvent` enum
//! - **Double Buffering**: Events are frame-consistent (no mid-frame mutations)
//! - **Simplicity**: No complex pub/sub - just push and iterate
//!
//! # Example
//!
//! ```ignore
//! // In the combat layer
//! events.push(GameEvent::AgentDamaged {
//!     entity,
//!     amount: 20.0,
//!     remaining: 60.0,
//! });
//!
//! // In an observer, one frame later
//! for event in events.iter() {
//!     if let GameEvent::AgentDamaged { entity, .. } = event {
//!         flash_health_bar(*entity);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use hecs::Entity;

use crate::ai::StateKind;

// ============================================================================
// Event Types
// ============================================================================

/// Simulation events for inter-system communication.
///
/// Events represent things that happened in the world. They flow from
/// producers (states, combat, the frame driver) to consumers (demo output,
/// debug views, tests) without direct coupling.
///
/// # Extensibility
///
/// The `#[non_exhaustive]` attribute allows adding new variants without
/// breaking downstream code that uses wildcard patterns.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // AI Events
    // -------------------------------------------------------------------------
    /// An agent left one state and entered another.
    StateChanged {
        /// The agent that transitioned
        entity: Entity,
        /// State being left (None on the very first entry)
        from: Option<StateKind>,
        /// State being entered
        to: StateKind,
    },

    /// An agent landed an attack on its target.
    AgentAttacked {
        /// The attacking agent
        attacker: Entity,
        /// The entity that was struck
        target: Entity,
        /// Damage dealt by the strike
        damage: f32,
    },

    // -------------------------------------------------------------------------
    // Combat Events
    // -------------------------------------------------------------------------
    /// An agent took damage.
    AgentDamaged {
        /// The agent that was damaged
        entity: Entity,
        /// Amount of damage applied (after clamping)
        amount: f32,
        /// Health remaining after the hit
        remaining: f32,
    },

    /// An agent was healed.
    AgentHealed {
        /// The agent that was healed
        entity: Entity,
        /// Amount of health restored (after clamping)
        amount: f32,
        /// Health after healing
        remaining: f32,
    },

    /// An agent's health reached zero and its death sequence began.
    AgentKilled {
        /// The agent that died
        entity: Entity,
    },

    /// An agent's death sequence finished and it was removed from the world.
    AgentDespawned {
        /// The agent that was removed
        entity: Entity,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during frame N are available for reading during frame N+1.
/// This prevents issues where event order depends on system update order.
///
/// # Example
///
/// ```ignore
/// let mut queue = EventQueue::new();
///
/// // Frame N: Push events
/// queue.push(GameEvent::AgentKilled { entity });
///
/// // Frame N+1: Process events (after swap)
/// queue.swap();
/// for event in queue.iter() {
///     handle_event(event);
/// }
/// ```
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<GameEvent>,
    /// Events from previous frame, ready for processing
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 32;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next frame.
    ///
    /// Events are not immediately visible to iterators. Call `swap()`
    /// at the frame boundary to make them available.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Call this once per frame, at the start of the update loop. After
    /// swapping:
    /// - `iter()` returns events from the previous frame
    /// - `push()` writes to the new pending queue
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous frame.
    ///
    /// The events remain in the queue until the next `swap()` call.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous frame.
    ///
    /// Similar to `iter()` but takes ownership of the events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next frame.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    ///
    /// Useful when resetting a scenario.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a test entity
    fn test_entity() -> Entity {
        // Create a temporary world to get a valid entity
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        // Push event - should not be visible yet
        queue.push(GameEvent::AgentKilled { entity });
        assert!(queue.is_empty(), "Events should not be visible before swap");

        // Swap - now event should be visible
        queue.swap();
        assert_eq!(queue.len(), 1);

        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(events[0], GameEvent::AgentKilled { .. }));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        // Frame 1: Push a damage event
        queue.push(GameEvent::AgentDamaged {
            entity,
            amount: 20.0,
            remaining: 80.0,
        });
        queue.swap();

        // Frame 2: Push a kill event while the first is being processed
        queue.push(GameEvent::AgentKilled { entity });

        // Should only see the damage event
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::AgentDamaged { .. }));

        // Frame 3: Now we see the kill event
        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::AgentKilled { .. }));
    }

    #[test]
    fn test_event_queue_drain() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        queue.push(GameEvent::StateChanged {
            entity,
            from: None,
            to: StateKind::Patrol,
        });
        queue.push(GameEvent::StateChanged {
            entity,
            from: Some(StateKind::Patrol),
            to: StateKind::Chase,
        });
        queue.swap();

        // Drain should consume events
        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_clear() {
        let mut queue = EventQueue::new();
        let entity = test_entity();

        queue.push(GameEvent::AgentKilled { entity });
        queue.swap();
        queue.push(GameEvent::AgentDespawned { entity });

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_state_changed_event_fields() {
        let entity = test_entity();

        let event = GameEvent::StateChanged {
            entity,
            from: Some(StateKind::Chase),
            to: StateKind::Attack,
        };

        if let GameEvent::StateChanged { from, to, .. } = event {
            assert_eq!(from, Some(StateKind::Chase));
            assert_eq!(to, StateKind::Attack);
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_agent_attacked_event_fields() {
        let attacker = test_entity();
        let target = test_entity();

        let event = GameEvent::AgentAttacked {
            attacker,
            target,
            damage: 10.0,
        };

        if let GameEvent::AgentAttacked { damage, target: t, .. } = event {
            assert!((damage - 10.0).abs() < f32::EPSILON);
            assert_eq!(t, target);
        } else {
            panic!("Wrong event type");
        }
    }
}
