//! Physics module for collision detection and response
//!
//! Bodies fall under gravity and are resolved against a level's spatial index
//! with four short probes per tick. Staircases, ladders and doors are handled
//! by small per-body state machines layered on top of the generic responses.

pub mod body;
pub mod integrator;
pub mod probe;
pub mod resolver;
pub mod transition;

#[cfg(test)]
mod tests;

pub use body::{Body, BodyId, BodySet, Intent, Vertical};
pub use integrator::MotionIntegrator;
pub use probe::{CellHit, ProbeFlags, ProbeHit, ProbeReport, LATERAL_OFFSET, PROBE_RADIUS};
pub use resolver::{CollisionContext, CollisionResolver, TickFrame};
pub use transition::{DoorMachine, LadderMachine, StaircaseMachine, TransitionState};
