//! Trebuchet Sim entry point
//!
//! Native: headless launcher that builds one trebuchet, throws it and prints
//! the result. The web build goes through `trebuchet_sim::wasm` instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use trebuchet_sim::sim::{LaunchEvent, LaunchPhase};
    use trebuchet_sim::{Archetype, LaunchController, LaunchRecords, ParameterSet, ReleaseMode, Settings, SimError};

    /// Build a trebuchet and throw it
    #[derive(Parser, Debug)]
    #[command(name = "trebuchet-sim", version, about)]
    pub struct Args {
        /// fixed, hinged, whipper, floating, walking or sandbox
        #[arg(short, long, default_value = "hinged")]
        archetype: String,

        /// Override a parameter, e.g. --set counterweightMass=350
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, f32)>,

        /// Settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Sling release rule: angle or timed (overrides the settings file)
        #[arg(long, value_name = "MODE", value_parser = parse_release_mode)]
        release_mode: Option<ReleaseMode>,

        /// Timed release delay in seconds; unset times it to the angle release
        #[arg(long, value_name = "SECS")]
        release_delay: Option<f32>,

        /// Give up after this much simulated time
        #[arg(long, default_value_t = 30.0)]
        max_secs: f32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// List archetypes and their parameters, then exit
        #[arg(long)]
        list: bool,

        /// Leaderboard file to load and update
        #[arg(long)]
        records: Option<PathBuf>,
    }

    fn parse_assignment(s: &str) -> Result<(String, f32), String> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
        let value = value
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("bad value for {}: {}", name, e))?;
        Ok((name.trim().to_string(), value))
    }

    fn parse_release_mode(s: &str) -> Result<ReleaseMode, String> {
        ReleaseMode::from_name(s).ok_or_else(|| format!("unknown release mode '{}', expected angle or timed", s))
    }

    fn list() {
        for archetype in Archetype::ALL {
            println!("{} ({})", archetype.as_str(), archetype.label());
            for spec in archetype.schema() {
                println!(
                    "  {:<24} {:>8.2} {:<3} [{} .. {}]",
                    spec.id.as_str(),
                    spec.default,
                    spec.unit,
                    spec.min,
                    spec.max
                );
            }
        }
    }

    pub fn run(args: Args) -> Result<(), SimError> {
        if args.list {
            list();
            return Ok(());
        }

        let mut settings = match &args.settings {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };
        if let Some(mode) = args.release_mode {
            settings.release_mode = mode;
        }
        if args.release_delay.is_some() {
            settings.release_delay = args.release_delay;
        }
        log::info!("Release mode: {}", settings.release_mode.as_str());
        let archetype = Archetype::from_name(&args.archetype)
            .ok_or_else(|| SimError::UnknownArchetype(args.archetype.clone()))?;
        let mut params = ParameterSet::defaults_for(archetype);
        for (name, value) in &args.set {
            params.set_named(name, *value)?;
        }

        let sim_dt = settings.sim_dt;
        let release_mode = settings.release_mode;
        let mut controller = LaunchController::new(settings);
        controller.build(archetype, params)?;
        controller.fire();

        let max_ticks = if sim_dt > 0.0 {
            (args.max_secs.max(0.0) / sim_dt).round() as u32
        } else {
            0
        };
        let mut events = controller.drain_events();
        for _ in 0..max_ticks {
            controller.step(1);
            events.extend(controller.drain_events());
            if controller.phase() == LaunchPhase::Landed {
                break;
            }
        }
        if controller.phase() != LaunchPhase::Landed {
            log::warn!("No landing within {:.1}s", args.max_secs);
        }

        let stats = controller.stats();
        if args.json {
            let report = serde_json::json!({
                "archetype": archetype,
                "releaseMode": release_mode.as_str(),
                "phase": controller.phase(),
                "stats": stats,
                "events": events,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{} trebuchet, {} release", archetype.label(), release_mode.as_str());
            for event in &events {
                match event {
                    LaunchEvent::Fired => println!("  fired"),
                    LaunchEvent::Released { time, speed, angle_deg } => {
                        println!("  released at {:.2}s, {:.2} m/s at {:.1}°", time, speed, angle_deg)
                    }
                    LaunchEvent::Landed { time, distance, .. } => {
                        println!("  landed at {:.2}s, {:.2} m out", time, distance)
                    }
                }
            }
            let formatted = stats.formatted();
            println!("  distance   {} m (estimate {} m)", formatted.distance, formatted.estimated_distance);
            println!("  max height {} m", formatted.max_height);
            println!("  max speed  {} m/s", formatted.max_velocity);
            println!("  flight     {} s", formatted.time);
        }

        if let Some(path) = &args.records {
            let mut records = if path.exists() {
                LaunchRecords::load_from(path)?
            } else {
                LaunchRecords::new()
            };
            if controller.phase() == LaunchPhase::Landed {
                if let Some(rank) = records.record(archetype, &stats) {
                    println!("  leaderboard rank #{}", rank);
                }
            }
            records.save_to(path)?;
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Trebuchet Sim (native) starting...");

    if let Err(e) = native::run(native::Args::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web entry point is trebuchet_sim::wasm::start, this is just to satisfy the compiler
}
