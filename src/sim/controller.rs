//! Launch controller
//!
//! Owns the physics world, the single live trebuchet and its launch state.
//! Every public operation of the simulator goes through here: build, fire,
//! pause, step, reset and parameter edits.

use glam::Vec2;
use serde::Serialize;

use super::archetype::Archetype;
use super::build::{PartSnapshot, Trebuchet};
use super::estimate::{Estimate, estimate_range};
use super::state::{FormattedStats, LaunchEvent, LaunchPhase, SimState, Stats};
use super::tick::{fire, tick};
use crate::consts::MAX_SUBSTEPS;
use crate::error::{SimError, SimResult};
use crate::params::{ParamSpec, ParameterSet};
use crate::physics::PhysicsWorld;
use crate::records::LaunchRecords;
use crate::settings::Settings;

/// What a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub archetype: Archetype,
    pub phase: LaunchPhase,
    pub paused: bool,
    pub parts: Vec<PartSnapshot>,
    /// Sling endpoints while the projectile is still attached
    pub sling: Option<[Vec2; 2]>,
    pub stats: Stats,
}

pub struct LaunchController {
    settings: Settings,
    world: PhysicsWorld,
    trebuchet: Trebuchet,
    state: SimState,
    /// Wall time not yet consumed by fixed ticks
    accumulator: f32,
    estimate: Option<Estimate>,
    records: LaunchRecords,
    /// Events since the last `drain_events`
    events: Vec<LaunchEvent>,
}

impl LaunchController {
    /// Controller holding a default Hinged trebuchet, paused
    pub fn new(settings: Settings) -> Self {
        let mut world = PhysicsWorld::new(settings.gravity, settings.base_y);
        let archetype = Archetype::default();
        let params = archetype.default_parameters();
        let trebuchet = archetype.build(&mut world, settings.base(), &params);
        let state = SimState::new(
            archetype,
            params.clone(),
            archetype.release_policy(&params, &settings),
        );
        let mut controller = Self {
            settings,
            world,
            trebuchet,
            state,
            accumulator: 0.0,
            estimate: None,
            records: LaunchRecords::new(),
            events: Vec::new(),
        };
        controller.refresh_estimate();
        controller
    }

    /// Replace the live trebuchet. Parameters are checked before anything
    /// is torn down.
    pub fn build(&mut self, archetype: Archetype, params: ParameterSet) -> SimResult<()> {
        if let Err(e) = params.validate() {
            log::warn!("Rejected build of {}: {}", archetype.label(), e);
            return Err(e);
        }
        self.install(archetype, params);
        self.refresh_estimate();
        Ok(())
    }

    /// Build by archetype name; `None` takes that archetype's defaults.
    /// An unknown name leaves the current trebuchet in place.
    pub fn build_trebuchet(&mut self, name: &str, params: Option<ParameterSet>) -> SimResult<()> {
        let Some(archetype) = Archetype::from_name(name) else {
            log::warn!("Unknown archetype '{}', keeping {}", name, self.state.archetype.label());
            return Err(SimError::UnknownArchetype(name.to_string()));
        };
        let params = params.unwrap_or_else(|| archetype.default_parameters());
        self.build(archetype, params)
    }

    /// Rebuild with the current archetype and parameters. Always ends paused.
    /// The estimate carries over since the design hasn't changed.
    pub fn reset(&mut self) {
        let estimated = self.state.stats.estimated_distance;
        self.install(self.state.archetype, self.state.params.clone());
        self.state.stats.estimated_distance = estimated;
        log::info!("Reset {}", self.state.archetype.label());
    }

    /// Start the throw. False when already fired or nothing to throw.
    pub fn fire(&mut self) -> bool {
        match fire(&mut self.world, &mut self.trebuchet, &mut self.state) {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    /// Toggle pause; returns the new paused flag
    pub fn pause(&mut self) -> bool {
        self.state.paused = !self.state.paused;
        if !self.state.fired() {
            self.state.phase = if self.state.paused {
                LaunchPhase::Idle
            } else {
                LaunchPhase::Armed
            };
        }
        self.accumulator = 0.0;
        log::debug!("Paused: {}", self.state.paused);
        self.state.paused
    }

    /// Run exactly `n` fixed ticks, paused or not
    pub fn step(&mut self, n: u32) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Feed wall-clock time; runs whole ticks while unpaused. Returns the
    /// number of ticks run.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        if self.state.paused {
            return 0;
        }
        let dt = self.settings.sim_dt;
        if dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < MAX_SUBSTEPS {
            self.advance();
            self.accumulator -= dt;
            substeps += 1;
        }
        // Don't spiral after a long stall
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(dt);
        }
        substeps
    }

    /// Change one parameter by name and rebuild
    pub fn update_parameter(&mut self, name: &str, value: f32) -> SimResult<()> {
        let mut params = self.state.params.clone();
        if let Err(e) = params.set_named(name, value) {
            log::warn!("Rejected {} = {}: {}", name, value, e);
            return Err(e);
        }
        self.build(self.state.archetype, params)
    }

    pub fn stats(&self) -> Stats {
        self.state.stats
    }

    pub fn formatted_stats(&self) -> FormattedStats {
        self.state.stats.formatted()
    }

    /// Parameter form for an archetype
    pub fn default_parameters(archetype: Archetype) -> Vec<ParamSpec> {
        archetype.schema()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            archetype: self.state.archetype,
            phase: self.state.phase,
            paused: self.state.paused,
            parts: self.trebuchet.snapshot(&self.world),
            sling: self.trebuchet.sling_anchors(&self.world).map(|(a, b)| [a, b]),
            stats: self.state.stats,
        }
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<LaunchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn phase(&self) -> LaunchPhase {
        self.state.phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn archetype(&self) -> Archetype {
        self.state.archetype
    }

    pub fn params(&self) -> &ParameterSet {
        &self.state.params
    }

    pub fn estimate(&self) -> Option<&Estimate> {
        self.estimate.as_ref()
    }

    pub fn records(&self) -> &LaunchRecords {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut LaunchRecords {
        &mut self.records
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn trebuchet(&self) -> &Trebuchet {
        &self.trebuchet
    }

    /// Swap in a fresh build and tear the old one down
    fn install(&mut self, archetype: Archetype, params: ParameterSet) {
        let fresh = archetype.build(&mut self.world, self.settings.base(), &params);
        let old = std::mem::replace(&mut self.trebuchet, fresh);
        old.destroy(&mut self.world);

        let policy = archetype.release_policy(&params, &self.settings);
        self.state = SimState::new(archetype, params, policy);
        self.accumulator = 0.0;
        self.events.clear();
    }

    fn refresh_estimate(&mut self) {
        if !self.settings.estimate_on_build {
            self.estimate = None;
            return;
        }
        let estimate = estimate_range(self.state.archetype, &self.state.params, &self.settings);
        log::info!(
            "Estimated range for {}: {:.2} m",
            self.state.archetype.label(),
            estimate.distance
        );
        self.state.stats.estimated_distance = estimate.distance;
        self.estimate = Some(estimate);
    }

    fn advance(&mut self) {
        let events = tick(
            &mut self.world,
            &mut self.trebuchet,
            &mut self.state,
            self.settings.sim_dt,
        );
        for event in &events {
            if let LaunchEvent::Landed { .. } = event {
                self.records.record(self.state.archetype, &self.state.stats);
            }
        }
        self.events.extend(events);
    }
}

impl Default for LaunchController {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
