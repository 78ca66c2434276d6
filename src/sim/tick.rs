//! Fixed timestep launch tick
//!
//! One call advances the engine by `dt`, then evaluates sling release, ground
//! impact and statistics in that order. Shared by the live controller and the
//! headless estimator so both see identical physics.

use glam::Vec2;

use super::build::Trebuchet;
use super::state::{LaunchEvent, LaunchPhase, SimState};
use crate::angle_of;
use crate::consts::*;
use crate::physics::PhysicsWorld;

/// When the sling lets go
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleasePolicy {
    /// Release as the flight angle drops through `target` (radians above
    /// horizontal) while moving forward at `min_speed` or more
    Angle { target: f32, min_speed: f32 },
    /// Release `delay` seconds after fire
    Timed { delay: f32 },
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        ReleasePolicy::Angle {
            target: DEFAULT_RELEASE_ANGLE_DEG.to_radians(),
            min_speed: MIN_RELEASE_SPEED,
        }
    }
}

impl ReleasePolicy {
    /// `previous_angle` is the flight angle one tick ago; `elapsed` is time
    /// since fire
    pub fn should_release(&self, previous_angle: Option<f32>, velocity: Vec2, elapsed: f32) -> bool {
        match *self {
            ReleasePolicy::Angle { target, min_speed } => {
                let Some(previous) = previous_angle else {
                    return false;
                };
                let angle = angle_of(velocity);
                velocity.x > 0.0 && velocity.length() >= min_speed && previous > target && angle <= target
            }
            ReleasePolicy::Timed { delay } => elapsed >= delay,
        }
    }
}

/// Trip the trigger and start the throw. `None` when already fired or when
/// there is nothing to throw.
pub fn fire(world: &mut PhysicsWorld, trebuchet: &mut Trebuchet, state: &mut SimState) -> Option<LaunchEvent> {
    if state.fired() || trebuchet.projectile.is_none() {
        return None;
    }
    if let Some(trigger) = trebuchet.take_trigger() {
        world.remove_joint(trigger);
    }
    state.phase = LaunchPhase::Launched;
    state.paused = false;
    state.ticks_since_fire = 0;
    state.last_flight_angle = None;
    state.airborne = false;
    log::info!("Fired {} trebuchet", trebuchet.archetype.label());
    Some(LaunchEvent::Fired)
}

/// Advance one fixed step
pub fn tick(world: &mut PhysicsWorld, trebuchet: &mut Trebuchet, state: &mut SimState, dt: f32) -> Vec<LaunchEvent> {
    let mut events = Vec::new();
    world.step(dt);

    let Some(projectile) = trebuchet.projectile else {
        return events;
    };

    if state.landed() {
        world.freeze(projectile.body);
        return events;
    }
    if !state.fired() {
        return events;
    }
    state.ticks_since_fire += 1;

    let Some(body) = world.body_state(projectile.body) else {
        return events;
    };
    let elapsed = state.ticks_since_fire as f32 * dt;

    // Release
    let release_due = state.phase == LaunchPhase::Launched
        && state
            .release_policy
            .should_release(state.last_flight_angle, body.linvel, elapsed);
    if release_due {
        if let Some(sling) = trebuchet.take_release_joint() {
            world.remove_joint(sling);
            state.phase = LaunchPhase::Released;
            let speed = body.linvel.length();
            let angle_deg = angle_of(body.linvel).to_degrees();
            log::info!("Released at {:.2}s, {:.2} m/s, {:.1}°", elapsed, speed, angle_deg);
            events.push(LaunchEvent::Released {
                time: elapsed,
                speed,
                angle_deg,
            });
        }
    }
    state.last_flight_angle = Some(angle_of(body.linvel));

    // Impact
    let touching = world.in_contact(projectile.collider, world.ground_collider());
    let rise = body.position.y - trebuchet.launch_position.y;
    if !touching && rise > 2.0 * projectile.radius {
        state.airborne = true;
    }
    // Trough contact only counts as impact once the sling has let go
    let landed_now = touching && (state.airborne || state.phase == LaunchPhase::Released);
    if landed_now {
        world.freeze(projectile.body);
        state.phase = LaunchPhase::Landed;
    }

    // Statistics
    let (position, velocity) = match world.body_state(projectile.body) {
        Some(now) => (now.position, now.linvel),
        None => (body.position, body.linvel),
    };
    let offset = position - trebuchet.launch_position;
    let stats = &mut state.stats;
    stats.distance = offset.x.max(0.0);
    stats.height = offset.y;
    stats.velocity = velocity.length();
    stats.max_distance = stats.max_distance.max(stats.distance);
    stats.max_height = stats.max_height.max(stats.height);
    stats.max_velocity = stats.max_velocity.max(stats.velocity);
    stats.time += dt;

    if landed_now {
        log::info!(
            "Landed after {:.2}s: {:.2} m out, peak {:.2} m",
            stats.time,
            stats.distance,
            stats.max_height
        );
        events.push(LaunchEvent::Landed {
            time: stats.time,
            distance: stats.distance,
            max_height: stats.max_height,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::archetype::Archetype;

    fn setup(archetype: Archetype, policy: ReleasePolicy) -> (PhysicsWorld, Trebuchet, SimState) {
        let mut world = PhysicsWorld::new(GRAVITY, 0.0);
        let params = archetype.default_parameters();
        let trebuchet = archetype.build(&mut world, Vec2::ZERO, &params);
        let state = SimState::new(archetype, params, policy);
        (world, trebuchet, state)
    }

    fn run_until_landed(world: &mut PhysicsWorld, trebuchet: &mut Trebuchet, state: &mut SimState) -> Vec<LaunchEvent> {
        let mut events = Vec::new();
        for _ in 0..1800 {
            events.extend(tick(world, trebuchet, state, SIM_DT));
            if state.landed() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_angle_policy_needs_downward_crossing() {
        let policy = ReleasePolicy::Angle {
            target: 45f32.to_radians(),
            min_speed: 10.0,
        };
        let fast_40deg = Vec2::new(20.0, 16.8);
        assert!(policy.should_release(Some(50f32.to_radians()), fast_40deg, 1.0));
        // No history yet
        assert!(!policy.should_release(None, fast_40deg, 1.0));
        // Rising through the target
        assert!(!policy.should_release(Some(30f32.to_radians()), fast_40deg, 1.0));
        // Too slow
        assert!(!policy.should_release(Some(50f32.to_radians()), Vec2::new(2.0, 1.6), 1.0));
        // Moving backward
        assert!(!policy.should_release(Some(170f32.to_radians()), Vec2::new(-20.0, -10.0), 1.0));
    }

    #[test]
    fn test_timed_policy() {
        let policy = ReleasePolicy::Timed { delay: 0.5 };
        assert!(!policy.should_release(None, Vec2::ZERO, 0.49));
        assert!(policy.should_release(None, Vec2::ZERO, 0.5));
    }

    #[test]
    fn test_unfired_tick_measures_nothing() {
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::default());
        for _ in 0..30 {
            assert!(tick(&mut world, &mut trebuchet, &mut state, SIM_DT).is_empty());
        }
        assert_eq!(state.stats.time, 0.0);
        assert_eq!(state.ticks_since_fire, 0);
        assert!(trebuchet.release_joint.is_some());
    }

    #[test]
    fn test_fire_only_once() {
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::default());
        let joints = world.joint_count();
        assert_eq!(fire(&mut world, &mut trebuchet, &mut state), Some(LaunchEvent::Fired));
        assert_eq!(world.joint_count(), joints - 1);
        assert!(!state.paused);
        assert_eq!(fire(&mut world, &mut trebuchet, &mut state), None);
        assert_eq!(world.joint_count(), joints - 1);
    }

    #[test]
    fn test_fire_without_projectile_is_noop() {
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::default());
        trebuchet.projectile = None;
        assert_eq!(fire(&mut world, &mut trebuchet, &mut state), None);
        assert_eq!(state.phase, LaunchPhase::Idle);
    }

    fn release_times(events: &[LaunchEvent]) -> Vec<f32> {
        events
            .iter()
            .filter_map(|e| match e {
                LaunchEvent::Released { time, .. } => Some(*time),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_timed_release_fires_once_on_schedule() {
        // Time the sling to the angle rule's release so the throw is real
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::default());
        fire(&mut world, &mut trebuchet, &mut state);
        let angle_releases = release_times(&run_until_landed(&mut world, &mut trebuchet, &mut state));
        assert_eq!(angle_releases.len(), 1);
        let delay = angle_releases[0];

        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::Timed { delay });
        fire(&mut world, &mut trebuchet, &mut state);
        let releases = release_times(&run_until_landed(&mut world, &mut trebuchet, &mut state));
        assert_eq!(releases.len(), 1);
        assert!(releases[0] >= delay && releases[0] < delay + 2.0 * SIM_DT);
        assert!(trebuchet.release_joint.is_none());
        assert!(state.landed());
        assert!(state.stats.max_distance > 0.0);
    }

    #[test]
    fn test_release_in_trough_still_lands() {
        let (mut world, mut trebuchet, mut state) =
            setup(Archetype::Hinged, ReleasePolicy::Timed { delay: 2.0 * SIM_DT });
        fire(&mut world, &mut trebuchet, &mut state);
        let events = run_until_landed(&mut world, &mut trebuchet, &mut state);
        assert_eq!(release_times(&events).len(), 1);
        assert!(state.landed());

        let time = state.stats.time;
        for _ in 0..30 {
            tick(&mut world, &mut trebuchet, &mut state, SIM_DT);
        }
        assert_eq!(state.stats.time, time);
    }

    #[test]
    fn test_landing_freezes_projectile() {
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Hinged, ReleasePolicy::default());
        fire(&mut world, &mut trebuchet, &mut state);
        let events = run_until_landed(&mut world, &mut trebuchet, &mut state);
        assert!(state.landed());
        assert_eq!(
            events.iter().filter(|e| matches!(e, LaunchEvent::Landed { .. })).count(),
            1
        );

        let body = trebuchet.projectile.unwrap().body;
        let time = state.stats.time;
        let resting = world.position(body).unwrap();
        for _ in 0..60 {
            assert!(tick(&mut world, &mut trebuchet, &mut state, SIM_DT).is_empty());
            let now = world.body_state(body).unwrap();
            assert_eq!(now.linvel, Vec2::ZERO);
            assert_eq!(now.angvel, 0.0);
            assert_eq!(now.position, resting);
        }
        assert_eq!(state.stats.time, time);
    }

    #[test]
    fn test_peaks_never_below_live_values() {
        let (mut world, mut trebuchet, mut state) = setup(Archetype::Whipper, ReleasePolicy::default());
        fire(&mut world, &mut trebuchet, &mut state);
        for _ in 0..600 {
            tick(&mut world, &mut trebuchet, &mut state, SIM_DT);
            let s = state.stats;
            assert!(s.distance >= 0.0);
            assert!(s.max_distance >= s.distance);
            assert!(s.max_height >= s.height);
            assert!(s.max_velocity >= s.velocity);
        }
    }
}
