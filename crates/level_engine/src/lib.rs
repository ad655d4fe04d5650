//! # Level Engine
//!
//! Voxel level indexing and collision response for side-on platform games.
//!
//! ## Features
//!
//! - **Level Loading**: Text grid levels parsed and built all-or-nothing
//! - **Spatial Index**: Adaptive octree over the level's static cells
//! - **Collision**: Four-probe floor, ceiling and wall response per tick
//! - **Locomotion**: Staircase, ladder and door state machines
//! - **Events**: Notifications for collisions, phase changes and level changes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use level_engine::prelude::*;
//! use std::collections::HashSet;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let registry = LevelRegistry::new(config.levels.clone());
//!     let level = registry.load("staircase")?;
//!
//!     let mut bodies = BodySet::with_key();
//!     let hero = bodies.insert(Body::new(Vec3::new(0.5, 1.0, 0.0), 0.5));
//!     bodies[hero].walk(Direction::Right, 2.0);
//!
//!     let resolver = CollisionResolver::new(&config.physics);
//!     let inventory: HashSet<String> = HashSet::new();
//!     let mut notifications: Vec<Notification> = Vec::new();
//!     for _ in 0..60 {
//!         let mut ctx = CollisionContext::for_level(&level, &inventory, &mut notifications);
//!         resolver.update(&mut bodies, 1.0 / 60.0, &mut ctx);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;

pub mod events;
pub mod foundation;
pub mod level;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, EngineConfig, LevelConfig, PhysicsConfig},
        events::{EventSystem, EventType, Notification, NotificationSink},
        foundation::math::{Vec2, Vec3, AABB},
        level::{Door, Inventory, Level, LevelLoadError, LevelRegistry},
        physics::{Body, BodyId, BodySet, CollisionContext, CollisionResolver, Vertical},
        spatial::{CellTag, Direction, SpatialIndex},
    };
}
