//! Gravity integration
//!
//! Velocity is updated semi-implicitly, then quantized, and the position step
//! adds an explicit `-g*dt^2/2` term on top. The extra term slightly
//! overstates the fall per tick at low frame rates; level tuning depends on it.

use crate::core::config::PhysicsConfig;
use crate::foundation::math::{utils, Vec2, Vec3};

/// Advances a body's tentative position, independent of any geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntegrator {
    gravity: f32,
    speed_decimals: u32,
}

impl MotionIntegrator {
    /// Create an integrator from physics settings
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity,
            speed_decimals: config.speed_decimals,
        }
    }

    /// Apply one tick of gravity, returning the new velocity and the tentative
    /// position. Z is left untouched.
    pub fn advance(&self, position: Vec3, velocity: Vec2, dt: f32) -> (Vec2, Vec3) {
        let vy = velocity.y - self.gravity * dt;
        let velocity = Vec2::new(
            utils::round_to(velocity.x, self.speed_decimals),
            utils::round_to(vy, self.speed_decimals),
        );
        let tentative = position
            + Vec3::new(
                velocity.x * dt,
                velocity.y * dt - 0.5 * self.gravity * dt * dt,
                0.0,
            );
        (velocity, tentative)
    }
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_step_from_rest() {
        let integrator = MotionIntegrator::default();
        let (velocity, position) = integrator.advance(Vec3::new(0.0, 10.0, 2.0), Vec2::new(2.0, 0.0), 0.1);

        assert_relative_eq!(velocity.y, -0.981, epsilon = 1e-6);
        assert_relative_eq!(velocity.x, 2.0);
        assert_relative_eq!(position.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(position.y, 10.0 - 0.0981 - 0.04905, epsilon = 1e-5);
        assert_eq!(position.z, 2.0);
    }

    #[test]
    fn test_velocity_is_quantized() {
        let integrator = MotionIntegrator::default();
        let (velocity, _) = integrator.advance(Vec3::zeros(), Vec2::new(1.234_56, 0.0), 1.0 / 60.0);
        assert_relative_eq!(velocity.x, 1.235, epsilon = 1e-6);
        // -9.81 / 60 = -0.1635
        assert!((velocity.y + 0.1635).abs() <= 0.000_51);
        assert_relative_eq!(velocity.y * 1000.0, (velocity.y * 1000.0).round(), epsilon = 1e-3);
    }

    #[test]
    fn test_zero_gravity_keeps_height() {
        let integrator = MotionIntegrator::new(&PhysicsConfig::default().with_gravity(0.0));
        let (velocity, position) = integrator.advance(Vec3::new(1.0, 1.0, 0.0), Vec2::new(-1.0, 0.0), 0.5);
        assert_eq!(velocity.y, 0.0);
        assert_relative_eq!(position, Vec3::new(0.5, 1.0, 0.0));
    }
}
