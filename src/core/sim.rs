//! Simulation driver
//!
//! Owns the entity world, the physics world, the navigation grid, and the
//! event queue, and advances them in a fixed frame order: swap events and
//! apply last frame's strikes, tick death timers, sync and step physics,
//! run every agent's controller, tick locomotion, then capture the debug
//! overlay. States never touch the world directly; each runs against an
//! [`AgentContext`] assembled here.

use glam::Vec3;
use hecs::Entity;

use crate::ai::{
    AgentContext, AgentController, EnemyAgent, RegistryError, StateKind, TargetInfo,
    check_visibility, standard_registry,
};
use crate::combat::{DeathSequence, Health};
use crate::core::debug::{AgentSnapshot, DebugOverlay};
use crate::core::events::{EventQueue, GameEvent};
use crate::core::scenario::Scenario;
use crate::core::time::Time;
use crate::ecs::{Name, Transform};
use crate::nav::{NavAgent, NavGrid};
use crate::physics::{ColliderId, Physics, PhysicsBody};

/// Character capsule half height, shared by the player and all agents
const CHARACTER_HALF_HEIGHT: f32 = 0.6;
/// Character capsule radius
const CHARACTER_RADIUS: f32 = 0.3;
/// Capsule center height above the character's ground position
const CHARACTER_CENTER_OFFSET: f32 = CHARACTER_HALF_HEIGHT + CHARACTER_RADIUS;
/// The player's health pool
const PLAYER_MAX_HEALTH: f32 = 100.0;

// ============================================================================
// Configuration
// ============================================================================

/// Simulation configuration
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Fixed step duration in seconds
    pub fixed_dt: f32,
    /// Seconds a killed agent lingers before despawning
    pub despawn_delay: f32,
    /// Collect debug snapshots every frame
    pub debug_overlay: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            despawn_delay: 0.5,
            debug_overlay: false,
        }
    }
}

impl SimConfig {
    /// Set the fixed step duration
    pub fn with_fixed_dt(mut self, dt: f32) -> Self {
        self.fixed_dt = dt;
        self
    }

    /// Set the despawn delay
    pub fn with_despawn_delay(mut self, delay: f32) -> Self {
        self.despawn_delay = delay;
        self
    }

    /// Enable or disable the debug overlay
    pub fn with_debug_overlay(mut self, enabled: bool) -> Self {
        self.debug_overlay = enabled;
        self
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Handle to the player entity and its collider
#[derive(Debug, Clone, Copy)]
pub struct PlayerRef {
    /// The player's entity id
    pub entity: Entity,
    /// The player's collider, the one sight rays look for
    pub collider: ColliderId,
}

/// The running simulation
pub struct Simulation {
    config: SimConfig,
    time: Time,
    world: hecs::World,
    grid: NavGrid,
    physics: Physics,
    events: EventQueue,
    debug: DebugOverlay,
    player: Option<PlayerRef>,
}

impl Simulation {
    /// Build a simulation from a scenario description.
    ///
    /// Spawns obstacles into the physics world and blocks their grid
    /// footprints, then spawns the player and every enemy, validating each
    /// enemy's state registry before its controller enters the first state.
    ///
    /// # Errors
    ///
    /// Returns an error when a state registry does not cover every state
    /// kind.
    pub fn from_scenario(scenario: &Scenario, config: SimConfig) -> Result<Self, RegistryError> {
        let mut grid = scenario.grid.build();
        let mut physics = Physics::new();
        let mut world = hecs::World::new();

        for obstacle in &scenario.obstacles {
            grid.block_footprint(obstacle.center, obstacle.half_extents);
            let body = physics.create_static_body(obstacle.center);
            physics.add_box_collider(body, obstacle.half_extents);
        }

        let player = scenario.player.as_ref().map(|spec| {
            let body = physics
                .create_kinematic_body(spec.position + Vec3::Y * CHARACTER_CENTER_OFFSET);
            let collider = physics.add_capsule_collider(body, CHARACTER_HALF_HEIGHT, CHARACTER_RADIUS);
            let entity = world.spawn((
                Name("player".to_string()),
                Transform::from_position(spec.position),
                Health::new(PLAYER_MAX_HEALTH),
                PhysicsBody { body, collider },
            ));
            PlayerRef { entity, collider }
        });

        let mut pending = Vec::with_capacity(scenario.enemies.len());
        for spec in &scenario.enemies {
            if !grid.is_on_navigable(spec.position) {
                log::warn!("enemy '{}' spawns off the navigable grid", spec.name);
            }

            let registry = standard_registry(&spec.behavior);
            registry.validate()?;

            let body = physics
                .create_kinematic_body(spec.position + Vec3::Y * CHARACTER_CENTER_OFFSET);
            let collider = physics.add_capsule_collider(body, CHARACTER_HALF_HEIGHT, CHARACTER_RADIUS);

            let entity = world.spawn((
                Name(spec.name.clone()),
                Transform::from_position_yaw(spec.position, spec.yaw_degrees.to_radians()),
                EnemyAgent::new(
                    spec.seed,
                    spec.max_health,
                    spec.vision,
                    spec.attack_range,
                    spec.waypoints.clone(),
                ),
                NavAgent::new(),
                AgentController::new(registry),
                PhysicsBody { body, collider },
            ));
            pending.push((entity, spec.initial_state));
        }

        let mut debug = DebugOverlay::new();
        debug.set_enabled(config.debug_overlay);

        let mut sim = Self {
            config,
            time: Time::new(),
            world,
            grid,
            physics,
            events: EventQueue::new(),
            debug,
            player,
        };

        // Settle step so startup queries already have collider geometry
        sim.physics.step(config.fixed_dt);
        for (entity, initial) in pending {
            sim.start_agent(entity, initial);
        }

        log::info!(
            "scenario '{}' loaded: {} enemies, {} obstacles",
            scenario.name,
            scenario.enemies.len(),
            scenario.obstacles.len()
        );
        Ok(sim)
    }

    /// Advance one fixed step.
    pub fn step(&mut self) {
        self.step_dt(self.config.fixed_dt);
    }

    /// Advance one step of `dt` seconds.
    ///
    /// Events pushed during a frame become readable from [`Self::events`]
    /// after the next frame's swap.
    pub fn step_dt(&mut self, dt: f32) {
        self.time.advance(dt);
        self.events.swap();

        self.process_strikes();
        self.tick_deaths(dt);
        self.sync_physics(dt);
        self.run_agents(dt);
        self.run_navigation(dt);
        if self.debug.is_enabled() {
            self.capture_debug();
        }
    }

    /// Advance a number of fixed steps
    pub fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.step();
        }
    }

    // ------------------------------------------------------------------
    // Frame phases
    // ------------------------------------------------------------------

    /// Apply the strikes agents landed last frame.
    fn process_strikes(&mut self) {
        let strikes: Vec<(Entity, f32)> = self
            .events
            .iter()
            .filter_map(|event| match event {
                GameEvent::AgentAttacked { target, damage, .. } => Some((*target, *damage)),
                _ => None,
            })
            .collect();

        for (target, damage) in strikes {
            self.apply_damage(target, damage);
        }
    }

    /// Tick death timers and despawn the expired.
    fn tick_deaths(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for (entity, sequence) in self.world.query_mut::<&mut DeathSequence>() {
            if sequence.tick(dt) {
                expired.push(entity);
            }
        }

        for entity in expired {
            if let Ok(body) = self.world.get::<&PhysicsBody>(entity).map(|body| *body) {
                self.physics.remove_body(body.body);
            }
            if self.world.despawn(entity).is_err() {
                continue;
            }
            log::debug!("agent {entity:?} despawned");
            self.events.push(GameEvent::AgentDespawned { entity });
        }
    }

    /// Push entity transforms into the physics world and step it.
    fn sync_physics(&mut self, dt: f32) {
        for (_, (transform, body)) in self.world.query_mut::<(&Transform, &PhysicsBody)>() {
            self.physics.set_kinematic_position(
                body.body,
                transform.position + Vec3::Y * CHARACTER_CENTER_OFFSET,
            );
        }
        self.physics.step(dt);
    }

    /// Run every live agent's controller for one frame.
    fn run_agents(&mut self, dt: f32) {
        let target = self.target_info();
        let target_collider = self.player.map(|player| player.collider);

        for (entity, (agent, pose, nav, controller, body)) in self.world.query_mut::<(
            &mut EnemyAgent,
            &Transform,
            &mut NavAgent,
            &mut AgentController,
            &PhysicsBody,
        )>() {
            if !agent.ai_enabled {
                continue;
            }

            let sight = self.physics.sight_probe(target_collider, Some(body.body));
            let mut ctx = AgentContext {
                dt,
                entity,
                agent,
                pose,
                nav,
                grid: &self.grid,
                sight: &sight,
                target,
                events: &mut self.events,
            };
            controller.update(&mut ctx);
        }
    }

    /// Tick locomotion: plan requested paths and move along them.
    fn run_navigation(&mut self, dt: f32) {
        for (_, (agent, nav, transform)) in
            self.world
                .query_mut::<(&EnemyAgent, &mut NavAgent, &mut Transform)>()
        {
            if !agent.ai_enabled {
                continue;
            }
            nav.tick(dt, &self.grid, transform);
        }
    }

    /// Capture the per-agent debug snapshots for this frame.
    fn capture_debug(&mut self) {
        self.debug.clear();
        let target = self.target_info();
        let target_collider = self.player.map(|player| player.collider);

        for (entity, (name, agent, pose, nav, controller, body)) in self
            .world
            .query::<(
                &Name,
                &EnemyAgent,
                &Transform,
                &NavAgent,
                &AgentController,
                &PhysicsBody,
            )>()
            .iter()
        {
            let visibility = target.map(|info| {
                let sight = self.physics.sight_probe(target_collider, Some(body.body));
                check_visibility(pose, &agent.vision, info.position, &sight)
            });

            self.debug.record(AgentSnapshot {
                entity,
                name: name.0.clone(),
                state: controller.current_name(),
                health: agent.health.current(),
                max_health: agent.health.max(),
                visibility,
                destination: nav.destination(),
                position: pose.position,
            });
        }
    }

    /// Enter a freshly spawned agent's starting state.
    fn start_agent(&mut self, entity: Entity, initial: Option<StateKind>) {
        let target = self.target_info();
        let target_collider = self.player.map(|player| player.collider);

        let Ok((agent, pose, nav, controller, body)) = self.world.query_one_mut::<(
            &mut EnemyAgent,
            &Transform,
            &mut NavAgent,
            &mut AgentController,
            &PhysicsBody,
        )>(entity) else {
            return;
        };

        let sight = self.physics.sight_probe(target_collider, Some(body.body));
        let mut ctx = AgentContext {
            dt: 0.0,
            entity,
            agent,
            pose,
            nav,
            grid: &self.grid,
            sight: &sight,
            target,
            events: &mut self.events,
        };
        controller.start(initial, &mut ctx);
    }

    // ------------------------------------------------------------------
    // Damage interface
    // ------------------------------------------------------------------

    /// Apply damage to an entity's health.
    ///
    /// Emits [`GameEvent::AgentDamaged`], and on the killing blow exactly
    /// one [`GameEvent::AgentKilled`]. A killed agent's AI is disabled, its
    /// movement stops, and it despawns after the configured delay. Damage
    /// aimed at an already-dead entity is ignored.
    pub fn apply_damage(&mut self, entity: Entity, amount: f32) {
        // The world borrow must end before kill_agent re-borrows the world,
        // so the hit outcome is carried out of the match.
        let agent_hit = match self.world.get::<&mut EnemyAgent>(entity) {
            Ok(mut agent) => {
                if agent.health.is_dead() {
                    // Already dying; late strikes change nothing
                    return;
                }
                let died = agent.health.take_damage(amount);
                let remaining = agent.health.current();
                drop(agent);
                Some((died, remaining))
            }
            Err(_) => None,
        };
        if let Some((died, remaining)) = agent_hit {
            self.events.push(GameEvent::AgentDamaged {
                entity,
                amount,
                remaining,
            });
            if died {
                self.kill_agent(entity);
            }
            return;
        }

        if let Ok(mut health) = self.world.get::<&mut Health>(entity) {
            if health.is_dead() {
                return;
            }
            let died = health.take_damage(amount);
            let remaining = health.current();
            drop(health);

            self.events.push(GameEvent::AgentDamaged {
                entity,
                amount,
                remaining,
            });
            if died {
                log::info!("{entity:?} was killed");
                self.events.push(GameEvent::AgentKilled { entity });
            }
            return;
        }

        log::warn!("damage aimed at {entity:?}, which has no health");
    }

    /// Restore health to an entity. Emits [`GameEvent::AgentHealed`] when
    /// anything was actually restored; the dead cannot be healed.
    pub fn heal(&mut self, entity: Entity, amount: f32) {
        if let Ok(mut agent) = self.world.get::<&mut EnemyAgent>(entity) {
            if agent.health.is_dead() {
                return;
            }
            let restored = agent.health.heal(amount);
            let remaining = agent.health.current();
            drop(agent);

            if restored > 0.0 {
                self.events.push(GameEvent::AgentHealed {
                    entity,
                    amount: restored,
                    remaining,
                });
            }
            return;
        }

        if let Ok(mut health) = self.world.get::<&mut Health>(entity) {
            if health.is_dead() {
                return;
            }
            let restored = health.heal(amount);
            let remaining = health.current();
            drop(health);

            if restored > 0.0 {
                self.events.push(GameEvent::AgentHealed {
                    entity,
                    amount: restored,
                    remaining,
                });
            }
            return;
        }

        log::warn!("heal aimed at {entity:?}, which has no health");
    }

    fn kill_agent(&mut self, entity: Entity) {
        log::info!("agent {entity:?} was killed");

        if let Ok(mut agent) = self.world.get::<&mut EnemyAgent>(entity) {
            agent.ai_enabled = false;
        }
        if let Ok(mut nav) = self.world.get::<&mut NavAgent>(entity) {
            nav.stop();
        }

        self.events.push(GameEvent::AgentKilled { entity });
        if self
            .world
            .insert_one(entity, DeathSequence::new(self.config.despawn_delay))
            .is_err()
        {
            log::warn!("killed agent {entity:?} no longer exists");
        }
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Move the player to a new position (applied to physics next step).
    pub fn set_player_position(&mut self, position: Vec3) {
        if let Some(player) = self.player {
            if let Ok(mut pose) = self.world.get::<&mut Transform>(player.entity) {
                pose.position = position;
            }
        }
    }

    /// The player's current position, if a player exists
    #[must_use]
    pub fn player_position(&self) -> Option<Vec3> {
        let player = self.player?;
        self.world
            .get::<&Transform>(player.entity)
            .ok()
            .map(|pose| pose.position)
    }

    /// This frame's target snapshot, if a player exists
    fn target_info(&self) -> Option<TargetInfo> {
        let player = self.player?;
        let pose = self.world.get::<&Transform>(player.entity).ok()?;
        Some(TargetInfo {
            entity: player.entity,
            position: pose.position,
        })
    }

    /// The entity world
    #[must_use]
    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    /// The entity world, mutably
    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    /// Last frame's events
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Last frame's events, mutably (for draining)
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// The debug overlay
    #[must_use]
    pub fn debug(&self) -> &DebugOverlay {
        &self.debug
    }

    /// The debug overlay, mutably (for toggling)
    pub fn debug_mut(&mut self) -> &mut DebugOverlay {
        &mut self.debug
    }

    /// The navigation grid
    #[must_use]
    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    /// The physics world
    #[must_use]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Simulation clock
    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// The player handle, if the scenario spawned one
    #[must_use]
    pub fn player(&self) -> Option<PlayerRef> {
        self.player
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scenario::{EnemySpec, PlayerSpec};

    /// One wandering enemy, no player.
    fn patrol_scenario() -> Scenario {
        let mut scenario = Scenario::new("patrol-test");
        scenario.enemies.push(EnemySpec {
            name: "walker".to_string(),
            position: Vec3::new(-5.0, 0.0, -5.0),
            seed: 3,
            waypoints: vec![
                Vec3::new(-8.0, 0.0, -8.0),
                Vec3::new(8.0, 0.0, -8.0),
                Vec3::new(8.0, 0.0, 8.0),
            ],
            ..Default::default()
        });
        scenario
    }

    /// A stationary guard facing negative Z, player somewhere on that axis.
    ///
    /// Both stand on the cell-center column at x = 0.5, so any pursuit path
    /// is a straight line and the guard faces the player the whole way.
    fn standoff_scenario(player_z: f32) -> Scenario {
        let mut scenario = Scenario::new("standoff");
        scenario.player = Some(PlayerSpec {
            position: Vec3::new(0.5, 0.0, player_z),
        });
        scenario.enemies.push(EnemySpec {
            name: "guard".to_string(),
            position: Vec3::new(0.5, 0.0, 2.5),
            seed: 1,
            ..Default::default()
        });
        scenario
    }

    fn enemy_entity(sim: &Simulation) -> Entity {
        sim.world()
            .query::<&EnemyAgent>()
            .iter()
            .next()
            .map(|(entity, _)| entity)
            .expect("scenario spawned an enemy")
    }

    fn enemy_state(sim: &Simulation, entity: Entity) -> Option<StateKind> {
        sim.world()
            .get::<&AgentController>(entity)
            .expect("enemy has a controller")
            .current()
    }

    #[test]
    fn test_patrol_without_player_walks_route() {
        let mut sim =
            Simulation::from_scenario(&patrol_scenario(), SimConfig::default()).unwrap();
        let entity = enemy_entity(&sim);
        let spawn = sim.world().get::<&Transform>(entity).unwrap().position;

        sim.run_frames(120);

        let position = sim.world().get::<&Transform>(entity).unwrap().position;
        assert!(
            (position - spawn).length() > 1.0,
            "two seconds of patrol should cover ground"
        );
        assert_eq!(enemy_state(&sim, entity), Some(StateKind::Patrol));
    }

    #[test]
    fn test_sighting_player_starts_chase_then_flee_when_wounded() {
        // Player spawns out of sight range
        let mut sim =
            Simulation::from_scenario(&standoff_scenario(-11.0), SimConfig::default()).unwrap();
        let entity = enemy_entity(&sim);

        sim.run_frames(30);
        assert_eq!(enemy_state(&sim, entity), Some(StateKind::Patrol));

        // Step into view: dead ahead, well inside range and cone
        sim.set_player_position(Vec3::new(0.5, 0.0, -4.0));
        sim.run_frames(2);
        assert_eq!(enemy_state(&sim, entity), Some(StateKind::Chase));

        // Wound the guard below half health while it can still see
        sim.apply_damage(entity, 60.0);
        sim.run_frames(2);
        assert_eq!(enemy_state(&sim, entity), Some(StateKind::Flee));
    }

    #[test]
    fn test_lethal_damage_kills_once_and_despawns() {
        let config = SimConfig::default().with_despawn_delay(0.2);
        let mut sim = Simulation::from_scenario(&patrol_scenario(), config).unwrap();
        let entity = enemy_entity(&sim);
        let body = *sim.world().get::<&PhysicsBody>(entity).unwrap();

        sim.apply_damage(entity, 150.0);
        // A second blow on the corpse must change nothing
        sim.apply_damage(entity, 50.0);
        sim.step();

        let killed = sim
            .events()
            .iter()
            .filter(|event| matches!(event, GameEvent::AgentKilled { .. }))
            .count();
        let damaged: Vec<f32> = sim
            .events()
            .iter()
            .filter_map(|event| match event {
                GameEvent::AgentDamaged { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(killed, 1);
        assert_eq!(damaged, vec![0.0], "overkill clamps to zero, once");

        // 0.2 seconds of lingering, then the corpse is gone
        let mut despawn_seen = false;
        for _ in 0..20 {
            sim.step();
            despawn_seen |= sim
                .events()
                .iter()
                .any(|event| matches!(event, GameEvent::AgentDespawned { entity: e } if *e == entity));
        }
        assert!(despawn_seen);
        assert!(sim.world().get::<&EnemyAgent>(entity).is_err());
        assert!(sim.physics().get_position(body.body).is_none());
    }

    #[test]
    fn test_attacks_land_on_the_player() {
        // Player inside attack reach from the start
        let mut sim =
            Simulation::from_scenario(&standoff_scenario(1.0), SimConfig::default()).unwrap();
        let entity = enemy_entity(&sim);
        let player = sim.player().expect("scenario has a player");

        let mut saw_attack = false;
        let mut saw_damage = false;
        for _ in 0..70 {
            sim.step();
            for event in sim.events().iter() {
                match event {
                    GameEvent::AgentAttacked { target, .. } if *target == player.entity => {
                        saw_attack = true;
                    }
                    GameEvent::AgentDamaged { entity: e, .. } if *e == player.entity => {
                        saw_damage = true;
                    }
                    _ => {}
                }
            }
        }

        assert_eq!(enemy_state(&sim, entity), Some(StateKind::Attack));
        assert!(saw_attack, "one cooldown has elapsed");
        assert!(saw_damage);
        let health = sim.world().get::<&Health>(player.entity).unwrap();
        assert_eq!(health.current(), 90.0, "exactly one strike landed");
    }

    #[test]
    fn test_debug_overlay_captures_agents() {
        let config = SimConfig::default().with_debug_overlay(true);
        let mut sim = Simulation::from_scenario(&standoff_scenario(-4.0), config).unwrap();

        sim.step();

        let agents = sim.debug().agents();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "guard");
        assert!(agents[0].visibility.is_some());
        assert!(!sim.debug().lines().is_empty());

        // And nothing is collected when the overlay is off
        let mut quiet =
            Simulation::from_scenario(&standoff_scenario(-4.0), SimConfig::default()).unwrap();
        quiet.step();
        assert!(quiet.debug().agents().is_empty());
    }
}
