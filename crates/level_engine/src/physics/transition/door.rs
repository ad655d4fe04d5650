//! Door gating
//!
//! A door cell in the index is matched to one of the level's door records by
//! the lateral probe that touched it. Locked doors act as walls for a body
//! walking into them; an unlocked door fires a single level change for as long
//! as the body stays near it.

use crate::events::{LevelChange, Notification, Surface};
use crate::foundation::math::AABB;
use crate::physics::probe::{probe_point, ProbeReport, PROBE_RADIUS};
use crate::physics::resolver::{side_probe, CollisionContext, TickFrame};
use crate::spatial::{CellTag, Direction};

/// Door gate owned by a body
#[derive(Debug, Clone, Default)]
pub struct DoorMachine {
    door: Option<usize>,
    activated: bool,
}

impl DoorMachine {
    /// Index into the level's door list of the door being approached
    pub fn captured(&self) -> Option<usize> {
        self.door
    }

    /// Whether the captured door has already fired its level change
    pub fn activated(&self) -> bool {
        self.activated
    }

    pub(crate) fn pre_adjust(
        &mut self,
        frame: &mut TickFrame,
        report: &ProbeReport,
        ctx: &mut CollisionContext<'_>,
    ) {
        if self.door.is_none() {
            self.capture(frame, report, ctx);
        }
        let Some(index) = self.door else {
            return;
        };
        let doors = ctx.doors;
        let Some(door) = doors.get(index) else {
            self.release();
            return;
        };

        if !AABB::cube(frame.position, PROBE_RADIUS).overlaps(&door.bounds) {
            self.release();
            return;
        }

        if door.is_unlocked(ctx.inventory) {
            if !self.activated {
                self.activated = true;
                log::info!("{:?} passes door to '{}'", frame.subject, door.next_level);
                ctx.notify(Notification::LevelChanged(LevelChange {
                    subject: frame.subject,
                    next_level: door.next_level.clone(),
                    spawn: door.next_position,
                }));
            }
            return;
        }

        let toward = Direction::from_sign(door.bounds.center().x - frame.previous.x);
        if let Some(side) = frame.moving().filter(|&side| Some(side) == toward) {
            let correction = frame.block_horizontal();
            ctx.collide(frame.subject, None, side_probe(side), Surface::Box, correction);
        }
    }

    /// Match a door cell touched by a lateral probe to its record
    fn capture(&mut self, frame: &mut TickFrame, report: &ProbeReport, ctx: &mut CollisionContext<'_>) {
        for side in [Direction::Left, Direction::Right] {
            let hit = report.side(side);
            let Some(cell) = hit.cell().filter(|cell| cell.tag == CellTag::Door) else {
                continue;
            };
            let point = probe_point(report.center, side_probe(side));
            if let Some(index) = ctx.doors.iter().position(|door| door.bounds.contains_point(point)) {
                self.door = Some(index);
                self.activated = false;
                return;
            }

            log::warn!("Door cell {} at {:?} has no door record", cell.cell, point);
            if frame.moving() == Some(side) && !frame.hold_x {
                let correction = frame.block_horizontal();
                ctx.collide(frame.subject, Some(cell.node), side_probe(side), Surface::Box, correction);
            }
        }
    }

    fn release(&mut self) {
        self.door = None;
        self.activated = false;
    }
}
