//! Headless range estimate
//!
//! Builds the same design in its own world, fires it, and runs the shared
//! tick as fast as possible until the projectile lands or the time ceiling
//! runs out. The live simulation is never touched.

use serde::Serialize;

use super::archetype::Archetype;
use super::state::{LaunchEvent, SimState};
use super::tick::{fire, tick};
use crate::params::ParameterSet;
use crate::physics::PhysicsWorld;
use crate::settings::{ReleaseMode, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Furthest horizontal travel reached
    pub distance: f32,
    pub max_height: f32,
    pub flight_time: f32,
    /// False when the ceiling ran out first
    pub landed: bool,
    pub ticks: u32,
}

pub fn estimate_range(archetype: Archetype, params: &ParameterSet, settings: &Settings) -> Estimate {
    let mut world = PhysicsWorld::new(settings.gravity, settings.base_y);
    let mut trebuchet = archetype.build(&mut world, settings.base(), params);
    let mut state = SimState::new(
        archetype,
        params.clone(),
        archetype.release_policy(params, settings),
    );
    fire(&mut world, &mut trebuchet, &mut state);

    let budget = settings.estimate_tick_budget();
    let mut ticks = 0;
    while ticks < budget && !state.landed() {
        tick(&mut world, &mut trebuchet, &mut state, settings.sim_dt);
        ticks += 1;
    }

    let estimate = Estimate {
        distance: state.stats.max_distance,
        max_height: state.stats.max_height,
        flight_time: state.stats.time,
        landed: state.landed(),
        ticks,
    };
    log::debug!(
        "Estimate for {}: {:.2} m in {} ticks (landed: {})",
        archetype.label(),
        estimate.distance,
        ticks,
        estimate.landed
    );
    estimate
}

/// Seconds from fire until the angle rule lets go, run headless in a fresh
/// world. `None` when it never does within the estimate ceiling.
pub fn angle_release_time(archetype: Archetype, params: &ParameterSet, settings: &Settings) -> Option<f32> {
    let angle = Settings {
        release_mode: ReleaseMode::Angle,
        ..settings.clone()
    };
    let mut world = PhysicsWorld::new(settings.gravity, settings.base_y);
    let mut trebuchet = archetype.build(&mut world, settings.base(), params);
    let mut state = SimState::new(
        archetype,
        params.clone(),
        archetype.release_policy(params, &angle),
    );
    fire(&mut world, &mut trebuchet, &mut state);

    for _ in 0..settings.estimate_tick_budget() {
        let released = tick(&mut world, &mut trebuchet, &mut state, settings.sim_dt)
            .into_iter()
            .find_map(|event| match event {
                LaunchEvent::Released { time, .. } => Some(time),
                _ => None,
            });
        if released.is_some() {
            return released;
        }
        if state.landed() {
            break;
        }
    }
    None
}
