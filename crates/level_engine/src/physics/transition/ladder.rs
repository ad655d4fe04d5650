//! Ladder climbing
//!
//! A body engages a ladder by holding a vertical command while touching a
//! rung. While engaged it is pinned to the rung column and moves at a fixed
//! climb speed; gravity and horizontal motion are suppressed. Reaching the top
//! plants it on the last rung, reaching the floor plants it on the floor, and
//! leaving the ladder hands control back to ordinary walking.

use super::announce;
use crate::core::config::PhysicsConfig;
use crate::events::{Locomotion, Notification, ProbeDirection, Surface, TransitionPhase};
use crate::foundation::math::{AABB, Vec2, Vec3};
use crate::physics::body::Vertical;
use crate::physics::probe::{classify, ProbeHit, LATERAL_OFFSET, PROBE_RADIUS};
use crate::physics::resolver::{CollisionContext, TickFrame};
use crate::spatial::{CellTag, NodeId};

/// Ladder sub-machine: `Idle -> Starting -> Climbing -> Finishing -> Stopped -> Idle`
#[derive(Debug, Clone, Default)]
pub struct LadderMachine {
    phase: TransitionPhase,
    column_x: f32,
    last_rung: Option<(AABB, NodeId)>,
    exit_height: f32,
    exit_node: Option<NodeId>,
}

impl LadderMachine {
    /// Current phase
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// True when away from `Idle`
    pub fn is_active(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    /// Whether the top rung may be stood on: only when not climbing
    pub fn allows_standing(&self) -> bool {
        matches!(self.phase, TransitionPhase::Idle | TransitionPhase::Stopped)
    }

    /// X of the rung column the body is pinned to
    pub fn column_x(&self) -> f32 {
        self.column_x
    }

    pub(crate) fn pre_adjust(
        &mut self,
        frame: &mut TickFrame,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) {
        match self.phase {
            TransitionPhase::Starting => {
                frame.velocity = Vec2::zeros();
                frame.position = Vec3::new(self.column_x, frame.previous.y, frame.previous.z);
            }
            TransitionPhase::Climbing => {
                let vy = frame.vertical.map_or(0.0, Vertical::sign) * config.climb_speed;
                frame.velocity = Vec2::new(0.0, vy);
                frame.position = Vec3::new(
                    self.column_x,
                    frame.previous.y + vy * frame.dt,
                    frame.previous.z,
                );
            }
            TransitionPhase::Finishing => {
                let target = self.exit_height + config.ground_clearance;
                let correction = target - frame.position.y;
                frame.velocity = Vec2::zeros();
                frame.position = Vec3::new(self.column_x, target, frame.previous.z);
                ctx.collide(
                    frame.subject,
                    self.exit_node,
                    ProbeDirection::Down,
                    Surface::Box,
                    correction,
                );
            }
            TransitionPhase::Idle | TransitionPhase::Stopped => return,
        }
        frame.hold_x = true;
        frame.hold_y = true;
    }

    pub(crate) fn detect(
        &mut self,
        frame: &mut TickFrame,
        _config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) -> bool {
        let p = frame.position;
        match self.phase {
            TransitionPhase::Idle => self.try_engage(frame, ctx),
            TransitionPhase::Stopped => {
                if self.try_engage(frame, ctx) {
                    return true;
                }
                let touching = [-LATERAL_OFFSET, 0.0, LATERAL_OFFSET]
                    .iter()
                    .any(|&dx| classify(ctx.index, p + Vec3::new(dx, 0.0, 0.0)).is(CellTag::Ladder));
                if touching {
                    return false;
                }
                self.last_rung = None;
                self.enter(TransitionPhase::Idle, frame, ctx);
                ctx.notify(Notification::LocomotionRestored {
                    subject: frame.subject,
                });
                true
            }
            TransitionPhase::Starting => {
                self.enter(TransitionPhase::Climbing, frame, ctx);
                true
            }
            TransitionPhase::Climbing => self.follow_column(frame, ctx),
            TransitionPhase::Finishing => {
                self.enter(TransitionPhase::Stopped, frame, ctx);
                true
            }
        }
    }

    /// Check the committed position against the rungs while climbing
    fn follow_column(&mut self, frame: &mut TickFrame, ctx: &mut CollisionContext<'_>) -> bool {
        let p = Vec3::new(self.column_x, frame.position.y, frame.position.z);
        let here = classify(ctx.index, p);
        if let ProbeHit::Cell(hit) = here {
            if hit.tag == CellTag::Ladder {
                self.last_rung = Some((hit.bounds, hit.node));
            }
        }

        if frame.velocity.y > 0.0 {
            if here.is(CellTag::Ladder) {
                return false;
            }
            // Climbed past the top rung
            let (exit_height, exit_node) = match self.last_rung {
                Some((bounds, node)) => (bounds.max.y, Some(node)),
                None => (p.y, None),
            };
            self.exit_height = exit_height;
            self.exit_node = exit_node;
            self.enter(TransitionPhase::Finishing, frame, ctx);
            return true;
        }

        if frame.velocity.y < 0.0 {
            let below = classify(ctx.index, p - Vec3::new(0.0, PROBE_RADIUS, 0.0));
            if let Some(hit) = below.cell().filter(|_| below.is_solid()) {
                // Reached the floor
                self.exit_height = hit.bounds.max.y;
                self.exit_node = Some(hit.node);
                self.enter(TransitionPhase::Finishing, frame, ctx);
                return true;
            }
            if !here.is(CellTag::Ladder) && !below.is(CellTag::Ladder) {
                // Slid off the bottom of a ladder with nothing underneath
                self.enter(TransitionPhase::Stopped, frame, ctx);
                return true;
            }
        }
        false
    }

    /// Engage the ladder if the vertical command points along a rung
    fn try_engage(&mut self, frame: &mut TickFrame, ctx: &mut CollisionContext<'_>) -> bool {
        let Some(vertical) = frame.vertical else {
            return false;
        };
        let p = frame.position;
        let travel = frame.travel.sign() * LATERAL_OFFSET;

        let rung = match vertical {
            Vertical::Up => {
                let far_side = classify(ctx.index, p - Vec3::new(travel, 0.0, 0.0));
                if far_side.is_solid() {
                    return false;
                }
                [p, p + Vec3::new(travel, 0.0, 0.0)]
                    .into_iter()
                    .map(|point| classify(ctx.index, point))
                    .find(|hit| hit.is(CellTag::Ladder))
            }
            Vertical::Down => {
                Some(classify(ctx.index, p - Vec3::new(0.0, PROBE_RADIUS, 0.0)))
                    .filter(|hit| hit.is(CellTag::Ladder))
            }
        };
        let Some(ProbeHit::Cell(rung)) = rung else {
            return false;
        };

        self.column_x = rung.bounds.center().x;
        self.last_rung = Some((rung.bounds, rung.node));
        self.exit_node = None;
        self.enter(TransitionPhase::Starting, frame, ctx);
        true
    }

    fn enter(&mut self, to: TransitionPhase, frame: &TickFrame, ctx: &mut CollisionContext<'_>) {
        let from = std::mem::replace(&mut self.phase, to);
        announce(ctx, frame.subject, Locomotion::Ladder, from, to);
    }
}
