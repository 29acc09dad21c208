//! Agent Controller
//!
//! Drives one agent's state machine: update the current state, poll it for
//! a transition, then exit, swap, and enter. The [`AgentContext`] built by
//! the frame driver is the only surface states see - the blackboard, the
//! locomotion facade, the sight oracle, and this frame's target snapshot.
//!
//! A transition to an unregistered state is reported and ignored, and a
//! controller with no current state skips the frame instead of stalling
//! the whole simulation.

use glam::Vec3;
use hecs::Entity;

use super::agent::EnemyAgent;
use super::perception::{self, SightProbe};
use super::state::{StateKind, StateRegistry};
use crate::core::{EventQueue, GameEvent};
use crate::ecs::Transform;
use crate::nav::{self, NavAgent, NavGrid};

// ============================================================================
// Agent Context
// ============================================================================

/// Frame snapshot of the entity the agent reacts to.
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo {
    /// The target's entity id
    pub entity: Entity,
    /// The target's position this frame
    pub position: Vec3,
}

/// Everything a state may touch during one frame.
///
/// Assembled by the frame driver per agent per frame. The pose is read-only
/// on purpose: states steer through the locomotion facade and never write
/// positions themselves.
pub struct AgentContext<'a> {
    /// Step duration for this frame, in seconds
    pub dt: f32,
    /// The agent's own entity id
    pub entity: Entity,
    /// The agent blackboard
    pub agent: &'a mut EnemyAgent,
    /// The agent's pose
    pub pose: &'a Transform,
    /// Locomotion facade
    pub nav: &'a mut NavAgent,
    /// Navigation grid, for flee-point sampling
    pub grid: &'a NavGrid,
    /// Sight oracle for this frame
    pub sight: &'a dyn SightProbe,
    /// Target snapshot, if a target exists this frame
    pub target: Option<TargetInfo>,
    /// Frame event queue
    pub events: &'a mut EventQueue,
}

impl AgentContext<'_> {
    /// Whether the agent sees its target right now.
    ///
    /// Runs the full perception check; false when no target exists.
    #[must_use]
    pub fn can_see_target(&self) -> bool {
        self.target.is_some_and(|target| {
            perception::can_see_target(self.pose, &self.agent.vision, target.position, self.sight)
        })
    }

    /// Distance to the target, if one exists
    #[must_use]
    pub fn distance_to_target(&self) -> Option<f32> {
        self.target
            .map(|target| self.pose.distance_to(target.position))
    }

    /// Whether the target is within the agent's attack reach
    #[must_use]
    pub fn target_in_attack_range(&self) -> bool {
        self.distance_to_target()
            .is_some_and(|distance| distance <= self.agent.attack_range)
    }

    /// Whether the locomotion facade reports arrival at its destination
    #[must_use]
    pub fn has_reached_destination(&self) -> bool {
        self.nav.has_reached(self.pose.position)
    }

    /// Pick a navigable point roughly `distance` away from the target.
    ///
    /// Falls back to the agent's own position when there is no target or
    /// nothing navigable in that direction.
    #[must_use]
    pub fn flee_destination(&self, distance: f32) -> Vec3 {
        let threat = self
            .target
            .map_or(self.pose.position, |target| target.position);
        nav::flee_point(self.grid, self.pose.position, threat, distance)
    }

    /// Land a strike on the target: emits [`GameEvent::AgentAttacked`].
    ///
    /// Returns false (and does nothing) when no target exists.
    pub fn perform_attack(&mut self, damage: f32) -> bool {
        let Some(target) = self.target else {
            return false;
        };

        log::debug!(
            "agent {:?} strikes {:?} for {damage} damage",
            self.entity,
            target.entity
        );
        self.events.push(GameEvent::AgentAttacked {
            attacker: self.entity,
            target: target.entity,
            damage,
        });
        true
    }
}

// ============================================================================
// Agent Controller
// ============================================================================

/// Owns one agent's state registry and its current state.
#[derive(Debug)]
pub struct AgentController {
    registry: StateRegistry,
    current: Option<StateKind>,
}

impl AgentController {
    /// Create a controller over a registry.
    ///
    /// Validate the registry first; the controller itself tolerates holes
    /// (it degrades per frame) but a hole is a configuration bug.
    #[must_use]
    pub fn new(registry: StateRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Enter the starting state.
    ///
    /// Uses `initial` when that kind is registered, otherwise falls back to
    /// the first registered state. With an empty registry the controller
    /// stays idle and every subsequent frame reports it.
    pub fn start(&mut self, initial: Option<StateKind>, ctx: &mut AgentContext) {
        let kind = match initial {
            Some(kind) if self.registry.contains(kind) => Some(kind),
            Some(kind) => {
                log::warn!("starting state {kind} is not registered; falling back to the first");
                self.registry.first()
            }
            None => self.registry.first(),
        };

        let Some(kind) = kind else {
            log::error!("agent {:?} has no registered states to start in", ctx.entity);
            return;
        };

        self.current = Some(kind);
        if let Some(state) = self.registry.get_mut(kind) {
            state.on_enter(ctx);
        }

        log::debug!("agent {:?} starts in {kind}", ctx.entity);
        ctx.events.push(GameEvent::StateChanged {
            entity: ctx.entity,
            from: None,
            to: kind,
        });
    }

    /// Run one frame: exactly one `on_update` and one `check_transitions`
    /// on the current state, then the exit/enter swap if one was requested.
    pub fn update(&mut self, ctx: &mut AgentContext) {
        let Some(kind) = self.current else {
            log::error!("agent {:?} has no current state; skipping frame", ctx.entity);
            return;
        };

        let Some(state) = self.registry.get_mut(kind) else {
            // Only reachable when the registry was never validated
            log::warn!("current state {kind} has no implementation; agent {:?} is stalled", ctx.entity);
            return;
        };

        state.on_update(ctx);

        match state.check_transitions(ctx) {
            Some(next) if next != kind => self.transition(kind, next, ctx),
            // A state naming itself is a no-op: no exit/enter churn
            _ => {}
        }
    }

    /// Force the agent into a state, exiting the current one first.
    ///
    /// Meant for scenario scripting and tests; the regular flow goes
    /// through the states' own transition decisions.
    pub fn force_state(&mut self, to: StateKind, ctx: &mut AgentContext) {
        if !self.registry.contains(to) {
            log::warn!("cannot force unregistered state {to}");
            return;
        }

        let from = self.current;
        if let Some(from) = from {
            if let Some(state) = self.registry.get_mut(from) {
                state.on_exit(ctx);
            }
        }

        self.current = Some(to);
        if let Some(state) = self.registry.get_mut(to) {
            state.on_enter(ctx);
        }

        ctx.events.push(GameEvent::StateChanged {
            entity: ctx.entity,
            from,
            to,
        });
    }

    /// The current state's kind, if the controller has started
    #[must_use]
    pub fn current(&self) -> Option<StateKind> {
        self.current
    }

    /// The current state's display name ("None" before start)
    #[must_use]
    pub fn current_name(&self) -> &'static str {
        self.current.map_or("None", |kind| kind.as_str())
    }

    /// Whether the agent is currently in `kind`
    #[must_use]
    pub fn is_in(&self, kind: StateKind) -> bool {
        self.current == Some(kind)
    }

    fn transition(&mut self, from: StateKind, to: StateKind, ctx: &mut AgentContext) {
        if !self.registry.contains(to) {
            log::warn!(
                "state {to} is not registered; agent {:?} stays in {from}",
                ctx.entity
            );
            return;
        }

        if let Some(state) = self.registry.get_mut(from) {
            state.on_exit(ctx);
        }

        self.current = Some(to);
        if let Some(state) = self.registry.get_mut(to) {
            state.on_enter(ctx);
        }

        log::debug!("agent {:?} transitions {from} -> {to}", ctx.entity);
        ctx.events.push(GameEvent::StateChanged {
            entity: ctx.entity,
            from: Some(from),
            to,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::perception::{SightHit, VisionConfig};
    use crate::ai::state::State;
    use std::sync::{Arc, Mutex};

    /// Sight stub with a fixed answer
    struct StubSight(Option<SightHit>);

    impl SightProbe for StubSight {
        fn cast_sight_ray(&self, _: Vec3, _: Vec3, _: f32) -> Option<SightHit> {
            self.0
        }
    }

    type Journal = Arc<Mutex<Vec<String>>>;

    /// State that records its lifecycle and answers transitions from a
    /// shared, test-controlled cell.
    #[derive(Debug)]
    struct TraceState {
        kind: StateKind,
        next: Arc<Mutex<Option<StateKind>>>,
        journal: Journal,
    }

    impl TraceState {
        fn log(&self, hook: &str) {
            self.journal.lock().unwrap().push(format!("{hook} {}", self.kind));
        }
    }

    impl State for TraceState {
        fn kind(&self) -> StateKind {
            self.kind
        }

        fn on_enter(&mut self, _ctx: &mut AgentContext) {
            self.log("enter");
        }

        fn on_update(&mut self, _ctx: &mut AgentContext) {
            self.log("update");
        }

        fn on_exit(&mut self, _ctx: &mut AgentContext) {
            self.log("exit");
        }

        fn check_transitions(&self, _ctx: &AgentContext) -> Option<StateKind> {
            self.log("check");
            *self.next.lock().unwrap()
        }
    }

    struct Rig {
        entity: Entity,
        agent: EnemyAgent,
        pose: Transform,
        nav: NavAgent,
        grid: NavGrid,
        sight: StubSight,
        events: EventQueue,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = hecs::World::new();
            Self {
                entity: world.spawn(()),
                agent: EnemyAgent::new(
                    1,
                    100.0,
                    VisionConfig::default(),
                    2.0,
                    vec![Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0)],
                ),
                pose: Transform::from_position(Vec3::new(5.0, 0.0, 5.0)),
                nav: NavAgent::new(),
                grid: NavGrid::new(20, 20, 1.0),
                sight: StubSight(None),
                events: EventQueue::new(),
            }
        }

        fn ctx(&mut self) -> AgentContext<'_> {
            AgentContext {
                dt: 1.0 / 60.0,
                entity: self.entity,
                agent: &mut self.agent,
                pose: &self.pose,
                nav: &mut self.nav,
                grid: &self.grid,
                sight: &self.sight,
                target: None,
                events: &mut self.events,
            }
        }
    }

    fn tracing_controller(
        kinds: &[StateKind],
    ) -> (AgentController, Journal, Arc<Mutex<Option<StateKind>>>) {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let next = Arc::new(Mutex::new(None));
        let mut registry = StateRegistry::new();
        for &kind in kinds {
            registry.register(Box::new(TraceState {
                kind,
                next: Arc::clone(&next),
                journal: Arc::clone(&journal),
            }));
        }
        (AgentController::new(registry), journal, next)
    }

    #[test]
    fn test_start_enters_initial_state() {
        let (mut controller, journal, _) =
            tracing_controller(&[StateKind::Patrol, StateKind::Chase]);
        let mut rig = Rig::new();

        controller.start(Some(StateKind::Chase), &mut rig.ctx());

        assert_eq!(controller.current(), Some(StateKind::Chase));
        assert_eq!(journal.lock().unwrap().as_slice(), ["enter Chase"]);
    }

    #[test]
    fn test_start_falls_back_to_first_registered() {
        let (mut controller, _, _) = tracing_controller(&[StateKind::Flee, StateKind::Patrol]);
        let mut rig = Rig::new();

        controller.start(Some(StateKind::Attack), &mut rig.ctx());

        assert_eq!(controller.current(), Some(StateKind::Flee));
    }

    #[test]
    fn test_update_runs_update_then_check() {
        let (mut controller, journal, _) = tracing_controller(&[StateKind::Patrol]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        controller.update(&mut rig.ctx());

        assert_eq!(
            journal.lock().unwrap().as_slice(),
            ["enter Patrol", "update Patrol", "check Patrol"]
        );
    }

    #[test]
    fn test_transition_exits_old_and_enters_new() {
        let (mut controller, journal, next) =
            tracing_controller(&[StateKind::Patrol, StateKind::Chase]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        *next.lock().unwrap() = Some(StateKind::Chase);
        controller.update(&mut rig.ctx());

        assert_eq!(controller.current(), Some(StateKind::Chase));
        assert_eq!(
            journal.lock().unwrap().as_slice(),
            [
                "enter Patrol",
                "update Patrol",
                "check Patrol",
                "exit Patrol",
                "enter Chase"
            ]
        );
    }

    #[test]
    fn test_self_transition_is_ignored() {
        let (mut controller, journal, next) = tracing_controller(&[StateKind::Patrol]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        *next.lock().unwrap() = Some(StateKind::Patrol);
        controller.update(&mut rig.ctx());

        assert_eq!(controller.current(), Some(StateKind::Patrol));
        let journal = journal.lock().unwrap();
        assert!(!journal.iter().any(|line| line.starts_with("exit")));
        assert_eq!(journal.iter().filter(|l| l.starts_with("enter")).count(), 1);
    }

    #[test]
    fn test_transition_to_unregistered_state_stays_put() {
        let (mut controller, journal, next) = tracing_controller(&[StateKind::Patrol]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        *next.lock().unwrap() = Some(StateKind::Attack);
        controller.update(&mut rig.ctx());
        controller.update(&mut rig.ctx());

        // Still patrolling, never exited
        assert_eq!(controller.current(), Some(StateKind::Patrol));
        assert!(!journal.lock().unwrap().iter().any(|line| line.starts_with("exit")));
    }

    #[test]
    fn test_update_without_current_state_skips_frame() {
        let (mut controller, journal, _) = tracing_controller(&[]);
        let mut rig = Rig::new();

        // start() on an empty registry leaves no current state
        controller.start(None, &mut rig.ctx());
        controller.update(&mut rig.ctx());

        assert_eq!(controller.current(), None);
        assert_eq!(controller.current_name(), "None");
        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transitions_emit_state_changed_events() {
        let (mut controller, _, next) = tracing_controller(&[StateKind::Patrol, StateKind::Flee]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        *next.lock().unwrap() = Some(StateKind::Flee);
        controller.update(&mut rig.ctx());

        rig.events.swap();
        let changes: Vec<_> = rig
            .events
            .iter()
            .filter_map(|event| match event {
                GameEvent::StateChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();

        assert_eq!(
            changes,
            [
                (None, StateKind::Patrol),
                (Some(StateKind::Patrol), StateKind::Flee)
            ]
        );
    }

    #[test]
    fn test_force_state_swaps_immediately() {
        let (mut controller, journal, _) =
            tracing_controller(&[StateKind::Patrol, StateKind::Attack]);
        let mut rig = Rig::new();

        controller.start(None, &mut rig.ctx());
        controller.force_state(StateKind::Attack, &mut rig.ctx());

        assert!(controller.is_in(StateKind::Attack));
        assert_eq!(
            journal.lock().unwrap().as_slice(),
            ["enter Patrol", "exit Patrol", "enter Attack"]
        );
    }

    #[test]
    fn test_context_reports_target_geometry() {
        let mut rig = Rig::new();
        let target_entity = rig.entity;
        let mut ctx = rig.ctx();
        ctx.target = Some(TargetInfo {
            entity: target_entity,
            position: Vec3::new(5.0, 0.0, 3.5),
        });

        assert_eq!(ctx.distance_to_target(), Some(1.5));
        assert!(ctx.target_in_attack_range());

        ctx.target = Some(TargetInfo {
            entity: target_entity,
            position: Vec3::new(5.0, 0.0, 0.0),
        });
        assert!(!ctx.target_in_attack_range());
    }

    #[test]
    fn test_context_without_target_sees_nothing() {
        let mut rig = Rig::new();
        let mut ctx = rig.ctx();

        assert!(!ctx.can_see_target());
        assert_eq!(ctx.distance_to_target(), None);
        assert!(!ctx.target_in_attack_range());
        assert!(!ctx.perform_attack(10.0));
    }
}
