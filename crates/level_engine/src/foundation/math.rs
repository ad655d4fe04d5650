//! Math utilities and types
//!
//! Provides the vector aliases and the bounding volumes used by the spatial
//! index and the collision probes.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// How one bounding box relates to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The boxes share no volume (touching faces count as disjoint)
    Disjoint,
    /// The boxes overlap partially
    Intersects,
    /// The other box lies entirely inside this one
    Contains,
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Create a cube centered at a point with the given half size
    pub fn cube(center: Vec3, half_size: f32) -> Self {
        Self::from_center_extents(center, Vec3::repeat(half_size))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point (closed on every face)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB owns a point under the half-open `[min, max)` rule.
    ///
    /// Sibling octree cells share faces; the half-open rule assigns every point
    /// on a shared face to exactly one of them.
    pub fn owns_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x < self.max.x &&
        point.y >= self.min.y && point.y < self.max.y &&
        point.z >= self.min.z && point.z < self.max.z
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if this AABB shares volume with another AABB (touching does not count)
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y &&
        self.min.z < other.max.z && self.max.z > other.min.z
    }

    /// Classify `other` against this box
    pub fn containment(&self, other: &AABB) -> Containment {
        if !self.overlaps(other) {
            Containment::Disjoint
        } else if self.contains_point(other.min) && self.contains_point(other.max) {
            Containment::Contains
        } else {
            Containment::Intersects
        }
    }

    /// Return this box moved by `delta`
    pub fn translated(&self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Math utility functions
pub mod utils {
    /// Round `value` to `decimals` places after the point
    pub fn round_to(value: f32, decimals: u32) -> f32 {
        let scale = 10_f32.powi(decimals as i32);
        (value * scale).round() / scale
    }

    /// Wrap an angle in degrees into `[0, 360)`
    pub fn wrap_degrees(degrees: f32) -> f32 {
        degrees.rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> AABB {
        AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_half_open_ownership() {
        let aabb = unit_box();
        assert!(aabb.owns_point(Vec3::new(0.0, 0.0, 0.0)));
        assert!(!aabb.owns_point(Vec3::new(1.0, 0.5, 0.5)));
        assert!(aabb.contains_point(Vec3::new(1.0, 0.5, 0.5)));
    }

    #[test]
    fn test_containment_classification() {
        let aabb = unit_box();
        let inner = AABB::new(Vec3::new(0.25, 0.25, 0.25), Vec3::new(0.75, 0.75, 0.75));
        let straddling = AABB::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.5, 1.5, 1.5));
        let touching = AABB::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));

        assert_eq!(aabb.containment(&inner), Containment::Contains);
        assert_eq!(aabb.containment(&straddling), Containment::Intersects);
        assert_eq!(aabb.containment(&touching), Containment::Disjoint);
        assert!(aabb.intersects(&touching));
    }

    #[test]
    fn test_round_to() {
        assert_relative_eq!(utils::round_to(-0.163_61, 3), -0.164, epsilon = 1e-6);
        assert_relative_eq!(utils::round_to(2.0, 3), 2.0);
        assert_relative_eq!(utils::wrap_degrees(-90.0), 270.0);
    }
}
