//! Headless demo: a guard patrols the sandbox while a scripted intruder
//! walks in, picks a fight, and backs off. Every simulation event is
//! written to the log, along with periodic agent status lines.
//!
//! Pass a scenario file (`.ron` or `.json`) as the first argument to run
//! something other than the built-in sandbox.

use std::env;
use std::path::Path;

use sentinel::core::ScenarioError;
use sentinel::hecs::Entity;
use sentinel::prelude::*;

/// Fixed step the demo runs at
const FRAME_DT: f32 = 1.0 / 60.0;
/// Seconds of simulation the script covers
const SCRIPT_LENGTH: f64 = 24.0;
/// Walking speed of the scripted player
const PLAYER_SPEED: f32 = 2.5;
/// The player stops closing in at this range
const CONTACT_DISTANCE: f32 = 1.5;
/// The player idles until this time, then starts shadowing the guard
const APPROACH_AT: f32 = 4.0;
/// Times of the two scripted knife strikes
const STRIKES_AT: [f32; 2] = [12.0, 14.0];
/// Damage per scripted strike
const STRIKE_DAMAGE: f32 = 40.0;
/// When the guard gets patched back up
const HEAL_AT: f32 = 18.0;
/// Health restored by the scripted heal
const HEAL_AMOUNT: f32 = 60.0;
/// Frames between agent status printouts
const OVERLAY_EVERY: u64 = 120;

fn main() {
    env_logger::init();

    let scenario = match load_scenario() {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Scenario error: {e}");
            return;
        }
    };
    log::info!(
        "Running scenario '{}' with {} enemies",
        scenario.name,
        scenario.enemy_count()
    );

    let config = SimConfig::default()
        .with_fixed_dt(FRAME_DT)
        .with_debug_overlay(true);
    let mut sim = match Simulation::from_scenario(&scenario, config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Simulation error: {e}");
            return;
        }
    };

    run_script(&mut sim);
}

/// Load the scenario named on the command line, or fall back to the sandbox.
fn load_scenario() -> Result<Scenario, ScenarioError> {
    match env::args().nth(1) {
        Some(path) if is_json(&path) => Scenario::load_json(path),
        Some(path) => Scenario::load_ron(path),
        None => Ok(Scenario::sandbox()),
    }
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Drive the scripted encounter to completion.
fn run_script(sim: &mut Simulation) {
    let Some(quarry) = first_enemy(sim) else {
        log::warn!("scenario has no enemies, nothing to demonstrate");
        return;
    };

    let mut strikes_landed = 0;
    let mut healed = false;

    while sim.time().elapsed_seconds() < SCRIPT_LENGTH {
        let elapsed = sim.time().elapsed_seconds() as f32;

        // The player shadows the guard until both strikes are in, then
        // stands still so the wounded guard can break contact.
        if elapsed >= APPROACH_AT && strikes_landed < STRIKES_AT.len() {
            if let (Some(player), Some(guard)) =
                (sim.player_position(), position_of(sim, quarry))
            {
                sim.set_player_position(pursue(player, guard, PLAYER_SPEED * FRAME_DT));
            }
        }

        if strikes_landed < STRIKES_AT.len() && elapsed >= STRIKES_AT[strikes_landed] {
            sim.apply_damage(quarry, STRIKE_DAMAGE);
            strikes_landed += 1;
        }

        if !healed && elapsed >= HEAL_AT {
            sim.heal(quarry, HEAL_AMOUNT);
            healed = true;
        }

        sim.step();
        log_events(sim);

        if sim.time().frame_count() % OVERLAY_EVERY == 0 {
            print_overlay(sim);
        }
    }

    log::info!("Script complete after {} frames", sim.time().frame_count());
    print_overlay(sim);
}

/// Step the player toward its quarry, holding at contact range.
fn pursue(player: Vec3, quarry: Vec3, max_step: f32) -> Vec3 {
    let mut delta = quarry - player;
    delta.y = 0.0;
    let distance = delta.length();
    if distance <= CONTACT_DISTANCE + 1e-4 {
        return player;
    }
    let step = max_step.min(distance - CONTACT_DISTANCE);
    player + delta / distance * step
}

fn first_enemy(sim: &Simulation) -> Option<Entity> {
    sim.world()
        .query::<&EnemyAgent>()
        .iter()
        .next()
        .map(|(entity, _)| entity)
}

fn position_of(sim: &Simulation, entity: Entity) -> Option<Vec3> {
    sim.world()
        .get::<&Transform>(entity)
        .map(|transform| transform.position)
        .ok()
}

fn name_of(sim: &Simulation, entity: Entity) -> String {
    sim.world()
        .get::<&Name>(entity)
        .map(|name| name.0.clone())
        .unwrap_or_else(|_| format!("{entity:?}"))
}

/// Write the frame's events to the log.
fn log_events(sim: &Simulation) {
    for event in sim.events().iter() {
        match event {
            GameEvent::StateChanged { entity, from, to } => {
                let name = name_of(sim, *entity);
                match from {
                    Some(from) => log::info!("{name}: {from} -> {to}"),
                    None => log::info!("{name}: starting in {to}"),
                }
            }
            GameEvent::AgentAttacked {
                attacker,
                target,
                damage,
            } => {
                log::info!(
                    "{} strikes {} for {damage:.0}",
                    name_of(sim, *attacker),
                    name_of(sim, *target)
                );
            }
            GameEvent::AgentDamaged {
                entity,
                amount,
                remaining,
            } => {
                log::info!(
                    "{} takes {amount:.0} damage, {remaining:.0} hp left",
                    name_of(sim, *entity)
                );
            }
            GameEvent::AgentHealed {
                entity,
                amount,
                remaining,
            } => {
                log::info!(
                    "{} recovers {amount:.0} hp, back to {remaining:.0}",
                    name_of(sim, *entity)
                );
            }
            GameEvent::AgentKilled { entity } => {
                log::info!("{} goes down", name_of(sim, *entity));
            }
            GameEvent::AgentDespawned { entity } => {
                log::info!("{entity:?} removed from the world");
            }
            _ => {}
        }
    }
}

fn print_overlay(sim: &Simulation) {
    for line in sim.debug().lines() {
        log::info!("{line}");
    }
}
