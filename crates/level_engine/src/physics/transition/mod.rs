//! Locomotion transitions layered on the collision probes
//!
//! Each body carries a staircase machine, a ladder machine and a door gate.
//! The staircase and ladder machines are mutually exclusive: only one may be
//! away from `Idle` at a time, and when both are idle a held vertical command
//! gives the ladder the first chance to engage.

mod door;
mod ladder;
mod staircase;

pub use door::DoorMachine;
pub use ladder::LadderMachine;
pub use staircase::StaircaseMachine;

use super::body::BodyId;
use super::probe::ProbeReport;
use super::resolver::{CollisionContext, TickFrame};
use crate::core::config::PhysicsConfig;
use crate::events::{Locomotion, Notification, TransitionNotice, TransitionPhase};

/// Locomotion state owned by a body
#[derive(Debug, Clone, Default)]
pub struct TransitionState {
    /// Staircase ascent and descent
    pub staircase: StaircaseMachine,
    /// Ladder climbing
    pub ladder: LadderMachine,
    /// Door gating
    pub door: DoorMachine,
}

impl TransitionState {
    /// True when neither locomotion machine is engaged
    pub fn is_idle(&self) -> bool {
        !self.staircase.is_active() && !self.ladder.is_active()
    }

    /// Adjust the frame before the generic collision responses run
    pub(crate) fn pre_adjust(
        &mut self,
        frame: &mut TickFrame,
        report: &ProbeReport,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) {
        if self.ladder.is_active() {
            self.ladder.pre_adjust(frame, config, ctx);
        } else if self.staircase.is_active() {
            self.staircase.pre_adjust(frame, config, ctx);
        }
        self.door.pre_adjust(frame, report, ctx);
    }

    /// Re-evaluate the machines against the committed position
    pub(crate) fn detect(
        &mut self,
        frame: &mut TickFrame,
        config: &PhysicsConfig,
        ctx: &mut CollisionContext<'_>,
    ) {
        if self.ladder.is_active() {
            self.ladder.detect(frame, config, ctx);
        } else if self.staircase.is_active() {
            self.staircase.detect(frame, config, ctx);
        } else {
            let engaged = frame.vertical.is_some() && self.ladder.detect(frame, config, ctx);
            if !engaged {
                self.staircase.detect(frame, config, ctx);
            }
        }
    }
}

/// Record and broadcast a phase change
fn announce(
    ctx: &mut CollisionContext<'_>,
    subject: BodyId,
    machine: Locomotion,
    from: TransitionPhase,
    to: TransitionPhase,
) {
    log::debug!("{:?} {:?}: {:?} -> {:?}", subject, machine, from, to);
    ctx.notify(Notification::Transition(TransitionNotice {
        subject,
        machine,
        from,
        to,
    }));
}
