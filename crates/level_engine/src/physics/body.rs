//! Moving bodies and their per-tick collision state

use slotmap::{new_key_type, SlotMap};

use super::probe::ProbeFlags;
use super::transition::TransitionState;
use crate::foundation::math::{BoundingSphere, Vec2, Vec3};
use crate::spatial::Direction;

new_key_type! {
    /// Handle to a body in a [`BodySet`]
    pub struct BodyId;
}

/// All bodies simulated against one level
pub type BodySet = SlotMap<BodyId, Body>;

/// Commanded vertical direction, used on ladders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    /// Climb up
    Up,
    /// Climb down
    Down,
}

impl Vertical {
    /// Unit sign along y
    pub fn sign(self) -> f32 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }
}

/// The direction a body was last told to move in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    /// Current horizontal command, `None` when not walking
    pub horizontal: Option<Direction>,
    /// Last non-`None` horizontal command
    pub last_horizontal: Direction,
    /// Current vertical command
    pub vertical: Option<Vertical>,
}

impl Intent {
    /// Direction used by probes that look ahead: the current command, or the
    /// last one when the body is not walking
    pub fn travel_direction(&self) -> Direction {
        self.horizontal.unwrap_or(self.last_horizontal)
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            horizontal: None,
            last_horizontal: Direction::Right,
            vertical: None,
        }
    }
}

/// Collision state of one moving entity
#[derive(Debug, Clone)]
pub struct Body {
    /// Position and visual radius
    pub sphere: BoundingSphere,
    /// Velocity in the XY plane
    pub velocity: Vec2,
    /// Probes that hit geometry on the last tick
    pub flags: ProbeFlags,
    /// Commanded direction
    pub intent: Intent,
    /// Yaw in degrees; snapped to 90 or 270 on staircases
    pub facing: f32,
    /// Whether the body takes part in collision at all
    pub collides: bool,
    /// Locomotion machines
    pub transition: TransitionState,
}

impl Body {
    /// Create a colliding body at rest
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            sphere: BoundingSphere::new(position, radius),
            velocity: Vec2::zeros(),
            flags: ProbeFlags::empty(),
            intent: Intent::default(),
            facing: 90.0,
            collides: true,
            transition: TransitionState::default(),
        }
    }

    /// Disable collision; the body then follows the integrator alone
    pub fn without_collision(mut self) -> Self {
        self.collides = false;
        self
    }

    /// Current center
    pub fn position(&self) -> Vec3 {
        self.sphere.center
    }

    /// Move the center
    pub fn set_position(&mut self, position: Vec3) {
        self.sphere.center = position;
    }

    /// Walk in `direction` at `speed`
    pub fn walk(&mut self, direction: Direction, speed: f32) {
        self.intent.horizontal = Some(direction);
        self.intent.last_horizontal = direction;
        self.velocity.x = direction.sign() * speed;
    }

    /// Stop walking, keeping the last direction for look-ahead probes
    pub fn stop(&mut self) {
        self.intent.horizontal = None;
        self.velocity.x = 0.0;
    }

    /// Set or clear the vertical command
    pub fn climb(&mut self, vertical: Option<Vertical>) {
        self.intent.vertical = vertical;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_remembers_last_direction() {
        let mut body = Body::new(Vec3::zeros(), 0.5);
        assert_eq!(body.intent.travel_direction(), Direction::Right);

        body.walk(Direction::Left, 2.0);
        assert_eq!(body.velocity.x, -2.0);
        body.stop();
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.intent.horizontal, None);
        assert_eq!(body.intent.travel_direction(), Direction::Left);
    }
}
