//! Concrete Agent Behaviors
//!
//! The four states of the behavior graph: Patrol, Chase, Attack, Flee.
//! Each state owns its tuning and its local timers; transition decisions
//! sit in `check_transitions` in strict priority order, self-preservation
//! first. Movement always goes through the locomotion facade, perception
//! always through the context.

use serde::{Deserialize, Serialize};

use super::controller::AgentContext;
use super::state::{State, StateKind, StateRegistry};

// ============================================================================
// Tuning
// ============================================================================

/// Tuning for [`PatrolState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Movement speed while patrolling
    pub move_speed: f32,
    /// Seconds to dwell at a waypoint before moving on
    pub dwell_time: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            dwell_time: 1.0,
        }
    }
}

/// Tuning for [`ChaseState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    /// Movement speed while pursuing
    pub move_speed: f32,
    /// Seconds without sight before the pursuit is abandoned
    pub lost_timeout: f32,
    /// Seconds between destination refreshes (and lost-time bookkeeping)
    pub reacquire_interval: f32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            lost_timeout: 3.0,
            reacquire_interval: 0.5,
        }
    }
}

/// Tuning for [`AttackState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Movement speed while attacking, when not holding position
    pub move_speed: f32,
    /// Seconds between strikes
    pub cooldown: f32,
    /// Damage per strike
    pub damage: f32,
    /// Stand still while attacking
    pub hold_position: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            cooldown: 1.0,
            damage: 10.0,
            hold_position: true,
        }
    }
}

/// Tuning for [`FleeState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeConfig {
    /// Movement speed while fleeing
    pub move_speed: f32,
    /// How far away from the threat the flee point is aimed
    pub flee_distance: f32,
    /// Seconds between flee-point recomputations
    pub recompute_interval: f32,
    /// Distance from the threat at which the agent feels safe
    pub safe_distance: f32,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            flee_distance: 10.0,
            recompute_interval: 1.0,
            safe_distance: 15.0,
        }
    }
}

/// The four states' tuning as one bundle, the shape scenarios configure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub patrol: PatrolConfig,
    pub chase: ChaseConfig,
    pub attack: AttackConfig,
    pub flee: FleeConfig,
}

/// Build the full standard registry from one tuning bundle.
#[must_use]
pub fn standard_registry(config: &BehaviorConfig) -> StateRegistry {
    let mut registry = StateRegistry::new();
    registry.register(Box::new(PatrolState::new(config.patrol)));
    registry.register(Box::new(ChaseState::new(config.chase)));
    registry.register(Box::new(AttackState::new(config.attack)));
    registry.register(Box::new(FleeState::new(config.flee)));
    registry
}

// ============================================================================
// Patrol
// ============================================================================

/// Walk the waypoint route, dwelling at each stop.
///
/// Leaves for Chase on sight of the target, or straight to Flee when
/// already wounded.
#[derive(Debug, Clone)]
pub struct PatrolState {
    config: PatrolConfig,
    /// Time spent dwelling at the current waypoint
    dwell_timer: f32,
}

impl PatrolState {
    #[must_use]
    pub fn new(config: PatrolConfig) -> Self {
        Self {
            config,
            dwell_timer: 0.0,
        }
    }
}

impl State for PatrolState {
    fn kind(&self) -> StateKind {
        StateKind::Patrol
    }

    fn on_enter(&mut self, ctx: &mut AgentContext) {
        self.dwell_timer = 0.0;
        ctx.nav.set_speed(self.config.move_speed);
        if let Some(waypoint) = ctx.agent.waypoints.current() {
            ctx.nav.set_destination(waypoint);
        }
    }

    fn on_update(&mut self, ctx: &mut AgentContext) {
        if !ctx.has_reached_destination() {
            return;
        }

        self.dwell_timer += ctx.dt;
        if self.dwell_timer >= self.config.dwell_time {
            self.dwell_timer = 0.0;
            ctx.agent.advance_waypoint();
            if let Some(waypoint) = ctx.agent.waypoints.current() {
                ctx.nav.set_destination(waypoint);
            }
        }
    }

    fn check_transitions(&self, ctx: &AgentContext) -> Option<StateKind> {
        if ctx.can_see_target() {
            return if ctx.agent.is_wounded() {
                Some(StateKind::Flee)
            } else {
                Some(StateKind::Chase)
            };
        }
        None
    }
}

// ============================================================================
// Chase
// ============================================================================

/// Pursue the target, refreshing the destination at a fixed cadence.
///
/// Loses the trail after `lost_timeout` seconds without sight and returns
/// to Patrol; closes to Attack when the target is visible inside attack
/// reach; breaks off to Flee when wounded with the target in view.
#[derive(Debug, Clone)]
pub struct ChaseState {
    config: ChaseConfig,
    /// Time since the last destination refresh
    reacquire_timer: f32,
    /// Time accumulated without sight of the target
    lost_timer: f32,
}

impl ChaseState {
    #[must_use]
    pub fn new(config: ChaseConfig) -> Self {
        Self {
            config,
            reacquire_timer: 0.0,
            lost_timer: 0.0,
        }
    }
}

impl State for ChaseState {
    fn kind(&self) -> StateKind {
        StateKind::Chase
    }

    fn on_enter(&mut self, ctx: &mut AgentContext) {
        self.reacquire_timer = 0.0;
        self.lost_timer = 0.0;
        ctx.nav.set_speed(self.config.move_speed);
        if let Some(target) = ctx.target {
            ctx.nav.set_destination(target.position);
        }
    }

    fn on_update(&mut self, ctx: &mut AgentContext) {
        self.reacquire_timer += ctx.dt;
        if self.reacquire_timer < self.config.reacquire_interval {
            return;
        }
        self.reacquire_timer = 0.0;

        if ctx.can_see_target() {
            self.lost_timer = 0.0;
            if let Some(target) = ctx.target {
                ctx.nav.set_destination(target.position);
            }
        } else {
            // Lost time advances at the reacquire cadence, not per frame
            self.lost_timer += self.config.reacquire_interval;
        }
    }

    fn check_transitions(&self, ctx: &AgentContext) -> Option<StateKind> {
        let visible = ctx.can_see_target();

        if visible && ctx.agent.is_wounded() {
            return Some(StateKind::Flee);
        }
        if visible && ctx.target_in_attack_range() {
            return Some(StateKind::Attack);
        }
        if self.lost_timer >= self.config.lost_timeout {
            return Some(StateKind::Patrol);
        }
        None
    }
}

// ============================================================================
// Attack
// ============================================================================

/// Strike the target on a cooldown, holding position by default.
///
/// Resumes Chase when the target slips out of reach but stays visible,
/// gives up to Patrol when it leaves reach unseen, and breaks off to Flee
/// when wounded. A target in reach but momentarily hidden keeps the agent
/// attacking.
#[derive(Debug, Clone)]
pub struct AttackState {
    config: AttackConfig,
    /// Time since the last strike
    cooldown_timer: f32,
}

impl AttackState {
    #[must_use]
    pub fn new(config: AttackConfig) -> Self {
        Self {
            config,
            cooldown_timer: 0.0,
        }
    }
}

impl State for AttackState {
    fn kind(&self) -> StateKind {
        StateKind::Attack
    }

    fn on_enter(&mut self, ctx: &mut AgentContext) {
        self.cooldown_timer = 0.0;
        if self.config.hold_position {
            ctx.nav.set_speed(0.0);
        } else {
            ctx.nav.set_speed(self.config.move_speed);
        }
    }

    fn on_update(&mut self, ctx: &mut AgentContext) {
        self.cooldown_timer += ctx.dt;
        if self.cooldown_timer >= self.config.cooldown && ctx.perform_attack(self.config.damage) {
            self.cooldown_timer = 0.0;
        }
    }

    fn on_exit(&mut self, ctx: &mut AgentContext) {
        // Movement was frozen for the strike; hand the next state a moving agent
        ctx.nav.set_speed(self.config.move_speed);
    }

    fn check_transitions(&self, ctx: &AgentContext) -> Option<StateKind> {
        if ctx.agent.is_wounded() && ctx.can_see_target() {
            return Some(StateKind::Flee);
        }
        if !ctx.target_in_attack_range() {
            return if ctx.can_see_target() {
                Some(StateKind::Chase)
            } else {
                Some(StateKind::Patrol)
            };
        }
        None
    }
}

// ============================================================================
// Flee
// ============================================================================

/// Run for a point away from the target, recomputing it at a cadence.
///
/// Returns to Patrol once health is back above the flee threshold, or once
/// the target is out of sight and beyond the safe distance.
#[derive(Debug, Clone)]
pub struct FleeState {
    config: FleeConfig,
    /// Time since the flee point was last recomputed
    recompute_timer: f32,
}

impl FleeState {
    #[must_use]
    pub fn new(config: FleeConfig) -> Self {
        Self {
            config,
            recompute_timer: 0.0,
        }
    }

    fn command_flee(&self, ctx: &mut AgentContext) {
        let point = ctx.flee_destination(self.config.flee_distance);
        ctx.nav.set_destination(point);
    }
}

impl State for FleeState {
    fn kind(&self) -> StateKind {
        StateKind::Flee
    }

    fn on_enter(&mut self, ctx: &mut AgentContext) {
        self.recompute_timer = 0.0;
        ctx.nav.set_speed(self.config.move_speed);
        self.command_flee(ctx);
    }

    fn on_update(&mut self, ctx: &mut AgentContext) {
        self.recompute_timer += ctx.dt;
        if self.recompute_timer >= self.config.recompute_interval {
            self.recompute_timer = 0.0;
            self.command_flee(ctx);
        }
    }

    fn check_transitions(&self, ctx: &AgentContext) -> Option<StateKind> {
        if !ctx.agent.is_wounded() {
            return Some(StateKind::Patrol);
        }

        let hidden = !ctx.can_see_target();
        let safe = ctx
            .distance_to_target()
            .map_or(true, |distance| distance >= self.config.safe_distance);
        if hidden && safe {
            return Some(StateKind::Patrol);
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
