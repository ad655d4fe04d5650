//! Staircase ascent and descent
//!
//! A staircase is a row of ramp cells. While `Climbing`, the body is pinned to
//! the ramp surface under its center every tick; `Finishing` plants it on the
//! exit edge for one tick before handing back to the generic floor response.
//!
//! Entry patterns, looking one lateral offset ahead in the direction of motion:
//! - ascending: the side point is a ramp rising toward the motion
//! - descending: the side point is open and the cell one unit below it is a
//!   ramp falling toward the motion
//! - landing: a ramp lies under the body, either one probe radius below its
//!   center or at its feet. On a ramp set into the floor row the down probe
//!   passes under the ramp cell, so the feet are checked as well.
//!
//! Every entry passes through `Starting`. Once a step is known the body is
//! pinned to it from that tick on.

use super::announce;
use crate::core::config::PhysicsConfig;
use crate::events::{Locomotion, ProbeDirection, Surface, TransitionPhase};
use crate::foundation::math::Vec3;
use crate::physics::probe::{classify, ProbeHit, LATERAL_OFFSET, PROBE_RADIUS};
use crate::physics::resolver::{CollisionContext, TickFrame};
use crate::spatial::{Direction, NodeId, Ramp, SpatialIndex};

/// Staircase sub-machine: `Idle -> Starting -> Climbing -> Finishing -> Idle`
#[derive(Debug, Clone, Default)]
pub struct StaircaseMachine {
    phase: TransitionPhase,
    course: Option<Direction>,
    ramp_row: f32,
    last_step: Option<(Ramp, NodeId)>,
    exit_height: f32,
}

impl StaircaseMachine {
    /// Current phase
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// True when away from `Idle`
    pub fn is_active(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    /// Direction of travel the staircase was entered with
    pub fn course(&self) -> Option<Direction> {
        self.course
    }

    pub(crate) fn pre_adjust(
        &mut self,
        frame: &mut TickFrame,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) {
        let target = match self.phase {
            TransitionPhase::Starting | TransitionPhase::Climbing => {
                if let Some(step) = step_at(ctx.index, frame.position.x, self.ramp_row, frame.position.z) {
                    self.last_step = Some(step);
                }
                let Some((ramp, node)) = self.last_step else {
                    return;
                };
                let target = ramp.surface_at(frame.position.x) + config.ground_clearance;
                ctx.collide(
                    frame.subject,
                    Some(node),
                    ProbeDirection::Down,
                    Surface::Plane,
                    target - frame.position.y,
                );
                target
            }
            TransitionPhase::Finishing => self.exit_height + config.ground_clearance,
            _ => return,
        };

        frame.position.y = target;
        frame.velocity.y = 0.0;
        frame.hold_y = true;
    }

    pub(crate) fn detect(
        &mut self,
        frame: &mut TickFrame,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) -> bool {
        let p = frame.position;
        match self.phase {
            TransitionPhase::Idle => self.detect_entry(frame, config, ctx),
            TransitionPhase::Starting => {
                if let Some(step) = step_at(ctx.index, p.x, self.ramp_row, p.z) {
                    self.last_step = Some(step);
                    self.enter(TransitionPhase::Climbing, frame, ctx);
                    ctx.collide(frame.subject, Some(step.1), ProbeDirection::Down, Surface::Plane, 0.0);
                    return true;
                }
                let ahead = self.course.map_or(0.0, Direction::sign) * LATERAL_OFFSET;
                if step_at(ctx.index, p.x + ahead, self.ramp_row, p.z).is_none() {
                    // Turned away before reaching the first step
                    self.enter(TransitionPhase::Idle, frame, ctx);
                    return true;
                }
                false
            }
            TransitionPhase::Climbing => {
                if let Some(step) = step_at(ctx.index, p.x, self.ramp_row, p.z) {
                    self.last_step = Some(step);
                    return false;
                }
                self.exit_height = self
                    .last_step
                    .map_or(p.y - config.ground_clearance, |(ramp, _)| ramp.surface_at(p.x));
                self.enter(TransitionPhase::Finishing, frame, ctx);
                true
            }
            TransitionPhase::Finishing | TransitionPhase::Stopped => {
                let below = classify(ctx.index, p - Vec3::new(0.0, PROBE_RADIUS, 0.0));
                self.course = None;
                self.last_step = None;
                self.enter(TransitionPhase::Idle, frame, ctx);
                if let Some(hit) = below.cell().filter(|_| below.is_solid()) {
                    ctx.collide(frame.subject, Some(hit.node), ProbeDirection::Down, Surface::Box, 0.0);
                }
                true
            }
        }
    }

    fn detect_entry(
        &mut self,
        frame: &mut TickFrame,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) -> bool {
        let p = frame.position;
        let below = classify(ctx.index, p - Vec3::new(0.0, PROBE_RADIUS, 0.0));
        let feet = classify(ctx.index, p - Vec3::new(0.0, config.ground_clearance, 0.0));

        let landing = [below, feet].into_iter().find_map(|hit| match hit {
            ProbeHit::Cell(hit) => Ramp::new(hit.bounds, hit.tag).map(|ramp| (ramp, hit)),
            ProbeHit::Open => None,
        });
        if let Some((ramp, hit)) = landing {
            self.ramp_row = hit.bounds.center().y;
            self.last_step = Some((ramp, hit.node));
            self.course = frame.moving();
            if let Some(direction) = self.course {
                frame.facing = facing(direction);
            }
            self.enter(TransitionPhase::Starting, frame, ctx);
            return true;
        }

        let Some(direction) = frame.moving() else {
            return false;
        };
        if !below.is_solid() {
            return false;
        }

        let side = Vec3::new(p.x + direction.sign() * LATERAL_OFFSET, p.y, p.z);
        let row = match classify(ctx.index, side) {
            ProbeHit::Cell(hit) if hit.tag.rises_toward() == Some(direction) => hit.bounds.center().y,
            ProbeHit::Open => match classify(ctx.index, side - Vec3::new(0.0, PROBE_RADIUS, 0.0)) {
                ProbeHit::Cell(hit) if hit.tag.rises_toward() == Some(direction.reversed()) => {
                    hit.bounds.center().y
                }
                _ => return false,
            },
            ProbeHit::Cell(_) => return false,
        };

        self.ramp_row = row;
        self.course = Some(direction);
        self.last_step = None;
        frame.facing = facing(direction);
        self.enter(TransitionPhase::Starting, frame, ctx);
        true
    }

    fn enter(&mut self, to: TransitionPhase, frame: &TickFrame, ctx: &mut CollisionContext<'_>) {
        let from = std::mem::replace(&mut self.phase, to);
        announce(ctx, frame.subject, Locomotion::Staircase, from, to);
    }
}

/// Yaw snapped to face along a staircase
fn facing(direction: Direction) -> f32 {
    match direction {
        Direction::Right => 90.0,
        Direction::Left => 270.0,
    }
}

/// The ramp cell at `(x, row)`, if there is one
fn step_at(index: &SpatialIndex, x: f32, row: f32, z: f32) -> Option<(Ramp, NodeId)> {
    match classify(index, Vec3::new(x, row, z)) {
        ProbeHit::Cell(hit) => Ramp::new(hit.bounds, hit.tag).map(|ramp| (ramp, hit.node)),
        ProbeHit::Open => None,
    }
}
