//! Per-tick collision pipeline
//!
//! For every body, in order:
//! 1. integrate gravity into a tentative position
//! 2. probe the four points around it
//! 3. let the active locomotion machine and the door gate adjust the frame
//! 4. apply the generic floor, ceiling and wall responses on axes nobody pinned
//! 5. commit the position
//! 6. re-evaluate the machines against the committed position

use super::body::{Body, BodyId, BodySet, Vertical};
use super::integrator::MotionIntegrator;
use super::probe::{self, ProbeHit, ProbeReport};
use super::transition::TransitionState;
use crate::core::config::PhysicsConfig;
use crate::events::{CollisionNotification, Notification, NotificationSink, ProbeDirection, Surface};
use crate::foundation::math::{Vec2, Vec3};
use crate::level::{Door, Inventory, Level};
use crate::spatial::{CellTag, Direction, NodeId, Ramp, SpatialIndex};

/// Everything a tick reads from or writes to outside the body itself
pub struct CollisionContext<'a> {
    /// Static geometry of the active level
    pub index: &'a SpatialIndex,
    /// Door records of the active level
    pub doors: &'a [Door],
    /// Item lookup for locked doors
    pub inventory: &'a dyn Inventory,
    /// Where notifications go
    pub sink: &'a mut dyn NotificationSink,
}

impl<'a> CollisionContext<'a> {
    /// Create a context from its parts
    pub fn new(
        index: &'a SpatialIndex,
        doors: &'a [Door],
        inventory: &'a dyn Inventory,
        sink: &'a mut dyn NotificationSink,
    ) -> Self {
        Self {
            index,
            doors,
            inventory,
            sink,
        }
    }

    /// Create a context for a loaded level
    pub fn for_level(
        level: &'a Level,
        inventory: &'a dyn Inventory,
        sink: &'a mut dyn NotificationSink,
    ) -> Self {
        Self::new(level.index(), level.doors(), inventory, sink)
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.sink.notify(notification);
    }

    pub(crate) fn collide(
        &mut self,
        subject: BodyId,
        node: Option<NodeId>,
        direction: ProbeDirection,
        surface: Surface,
        correction: f32,
    ) {
        self.notify(Notification::Collision(CollisionNotification {
            subject,
            node,
            direction,
            surface,
            correction,
        }));
    }
}

/// A body's motion while one tick is resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickFrame {
    /// Body being resolved
    pub subject: BodyId,
    /// Position committed last tick
    pub previous: Vec3,
    /// Position being built this tick
    pub position: Vec3,
    /// Velocity being built this tick
    pub velocity: Vec2,
    /// Look-ahead direction
    pub travel: Direction,
    /// Vertical command
    pub vertical: Option<Vertical>,
    /// Yaw in degrees
    pub facing: f32,
    /// Tick length in seconds
    pub dt: f32,
    /// X was pinned and generic responses must leave it alone
    pub hold_x: bool,
    /// Y was pinned and generic responses must leave it alone
    pub hold_y: bool,
}

impl TickFrame {
    /// Direction the body is actually moving in, `None` when not moving
    pub fn moving(&self) -> Option<Direction> {
        Direction::from_sign(self.velocity.x)
    }

    /// Undo this tick's horizontal motion
    pub(crate) fn block_horizontal(&mut self) -> f32 {
        let correction = self.previous.x - self.position.x;
        self.position.x = self.previous.x;
        self.velocity.x = 0.0;
        self.hold_x = true;
        correction
    }
}

/// Probe direction of a lateral side
pub(crate) fn side_probe(side: Direction) -> ProbeDirection {
    match side {
        Direction::Left => ProbeDirection::Left,
        Direction::Right => ProbeDirection::Right,
    }
}

/// Resolves every body against the active level once per tick
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    integrator: MotionIntegrator,
    config: PhysicsConfig,
}

impl CollisionResolver {
    /// Create a resolver from physics settings
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            integrator: MotionIntegrator::new(config),
            config: config.clone(),
        }
    }

    /// Physics settings in use
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Resolve every body for one tick, in set order
    pub fn update(&self, bodies: &mut BodySet, dt: f32, ctx: &mut CollisionContext<'_>) {
        for (id, body) in bodies.iter_mut() {
            self.step(id, body, dt, ctx);
        }
    }

    /// Resolve one body for one tick
    pub fn step(&self, subject: BodyId, body: &mut Body, dt: f32, ctx: &mut CollisionContext<'_>) {
        let previous = body.position();
        let (velocity, tentative) = self.integrator.advance(previous, body.velocity, dt);
        if !body.collides {
            body.velocity = velocity;
            body.set_position(tentative);
            return;
        }

        let report = probe::probe(ctx.index, tentative);
        let mut frame = TickFrame {
            subject,
            previous,
            position: tentative,
            velocity,
            travel: body.intent.travel_direction(),
            vertical: body.intent.vertical,
            facing: body.facing,
            dt,
            hold_x: false,
            hold_y: false,
        };

        let mut state = std::mem::take(&mut body.transition);
        state.pre_adjust(&mut frame, &report, &self.config, ctx);
        self.respond(&mut frame, &report, &state, ctx);

        body.velocity = frame.velocity;
        body.set_position(frame.position);
        body.flags = report.flags();

        state.detect(&mut frame, &self.config, ctx);
        body.facing = frame.facing;
        body.transition = state;
    }

    fn respond(
        &self,
        frame: &mut TickFrame,
        report: &ProbeReport,
        state: &TransitionState,
        ctx: &mut CollisionContext<'_>,
    ) {
        if !frame.hold_y {
            self.respond_down(frame, report, state, ctx);
            Self::respond_up(frame, report, ctx);
        }
        if !frame.hold_x {
            Self::respond_lateral(frame, report, ctx);
        }
    }

    fn respond_down(
        &self,
        frame: &mut TickFrame,
        report: &ProbeReport,
        state: &TransitionState,
        ctx: &mut CollisionContext<'_>,
    ) {
        // Open space below means falling
        let ProbeHit::Cell(hit) = report.down else {
            return;
        };
        if frame.velocity.y > 0.0 {
            return;
        }

        let (top, surface) = match hit.tag {
            CellTag::Staircase1Up
            | CellTag::Staircase1Down
            | CellTag::Staircase2Up
            | CellTag::Staircase2Down => match Ramp::new(hit.bounds, hit.tag) {
                Some(ramp) => (ramp.surface_at(frame.position.x), Surface::Plane),
                None => return,
            },
            CellTag::Ladder => {
                let above = hit.bounds.center() + Vec3::new(0.0, hit.bounds.max.y - hit.bounds.min.y, 0.0);
                let is_top = !probe::classify(ctx.index, above).is(CellTag::Ladder);
                if !is_top || !state.ladder.allows_standing() {
                    return;
                }
                (hit.bounds.max.y, Surface::Box)
            }
            CellTag::None | CellTag::Door => (hit.bounds.max.y, Surface::Box),
        };

        let target = top + self.config.ground_clearance;
        let correction = target - frame.position.y;
        frame.position.y = target;
        frame.velocity.y = 0.0;
        ctx.collide(frame.subject, Some(hit.node), ProbeDirection::Down, surface, correction);
    }

    fn respond_up(frame: &mut TickFrame, report: &ProbeReport, ctx: &mut CollisionContext<'_>) {
        let ProbeHit::Cell(hit) = report.up else {
            return;
        };
        if hit.tag == CellTag::Ladder || frame.velocity.y <= 0.0 {
            return;
        }
        // Back to last tick's height; the notice carries the shift applied
        let rise = frame.position.y;
        frame.velocity.y = 0.0;
        frame.position.y = frame.previous.y.min(frame.position.y);
        ctx.collide(
            frame.subject,
            Some(hit.node),
            ProbeDirection::Up,
            Surface::Box,
            frame.position.y - rise,
        );
    }

    fn respond_lateral(frame: &mut TickFrame, report: &ProbeReport, ctx: &mut CollisionContext<'_>) {
        let Some(side) = frame.moving() else {
            return;
        };
        let ProbeHit::Cell(hit) = report.side(side) else {
            return;
        };
        // Ladders, staircases and doors belong to their machines
        if hit.tag != CellTag::None {
            return;
        }
        let correction = frame.block_horizontal();
        ctx.collide(frame.subject, Some(hit.node), side_probe(side), Surface::Box, correction);
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}
