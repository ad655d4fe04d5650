//! Staircase Walk Demo
//!
//! Loads a level from `resources/levels`, drops a body at the foot of its
//! staircase and walks it to the right for three seconds of simulated time,
//! logging every collision, phase change and door traversal.
//!
//! Usage: `level_demo [config.toml|config.ron] [level-name]`

use std::collections::HashSet;
use std::path::PathBuf;

use level_engine::events::{Event, EventHandler, EventSystem, EventType};
use level_engine::foundation::logging;
use level_engine::level::LevelLoadError;
use level_engine::prelude::*;
use level_engine::core::ConfigError;
use thiserror::Error;

// Simulation settings
const TICK: f32 = 1.0 / 60.0;
const TICKS: usize = 180;
const WALK_SPEED: f32 = 2.0;
const DEFAULT_LEVEL: &str = "staircase";

#[derive(Error, Debug)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("level error: {0}")]
    Level(#[from] LevelLoadError),
}

/// Logs every event it sees and lets it through to later handlers
struct EventLogger;

impl EventHandler for EventLogger {
    fn on_event(&mut self, event: &Event) -> bool {
        match event.event_type {
            EventType::Collision => log::trace!(
                "[{:.3}s] collision {:?} surface={:?}",
                event.timestamp,
                event.get_subject(),
                event.get_surface()
            ),
            EventType::TransitionChanged => log::info!(
                "[{:.3}s] {:?} -> {:?}",
                event.timestamp,
                event.get_subject(),
                event.get_phase()
            ),
            EventType::LevelChanged => log::info!(
                "[{:.3}s] {:?} leaves for '{}'",
                event.timestamp,
                event.get_subject(),
                event.get_level().unwrap_or("?")
            ),
            EventType::LocomotionRestored => {
                log::info!("[{:.3}s] {:?} walks again", event.timestamp, event.get_subject());
            }
        }
        false
    }
}

fn main() {
    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("level_demo: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let level_name = args.next().unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    let config = EngineConfig::load_or_default(config_path.as_deref())?;
    config.validate()?;
    logging::init_with_level(&config.log_level);

    let registry = LevelRegistry::new(config.levels.clone());
    let level = registry.load(&level_name)?;
    log::info!(
        "Level '{}': {} cells in {} nodes",
        level.name(),
        level.index().cell_count(),
        level.index().node_count()
    );

    let mut events = EventSystem::new();
    for event_type in [
        EventType::Collision,
        EventType::TransitionChanged,
        EventType::LevelChanged,
        EventType::LocomotionRestored,
    ] {
        events.register_handler(event_type, Box::new(EventLogger));
    }

    let mut bodies = BodySet::with_key();
    let hero = bodies.insert(Body::new(Vec3::new(0.5, 1.0, 0.0), 0.5));
    bodies[hero].walk(Direction::Right, WALK_SPEED);

    let resolver = CollisionResolver::new(&config.physics);
    let inventory: HashSet<String> = HashSet::new();

    for tick in 0..TICKS {
        events.update_time(f64::from(TICK) * tick as f64);
        let mut ctx = CollisionContext::for_level(&level, &inventory, &mut events);
        resolver.update(&mut bodies, TICK, &mut ctx);
        events.dispatch();
    }

    let body = &bodies[hero];
    log::info!(
        "Finished at ({:.3}, {:.3}) facing {} after {} ticks",
        body.position().x,
        body.position().y,
        body.facing,
        TICKS
    );
    Ok(())
}
