//! Door records attached to a level

use std::collections::HashSet;

use crate::foundation::math::{AABB, Vec3};

/// Source of truth for the items an entity carries
pub trait Inventory {
    /// Check whether the named item is held
    fn has_item(&self, item: &str) -> bool;
}

impl Inventory for HashSet<String> {
    fn has_item(&self, item: &str) -> bool {
        self.contains(item)
    }
}

/// A door leading to another level, static for the lifetime of its level
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    /// World-space region that triggers the door
    pub bounds: AABB,
    /// Name of the level the door leads to
    pub next_level: String,
    /// Spawn position in the next level
    pub next_position: Vec3,
    /// Item needed to pass, `None` for an unlocked door
    pub required_item: Option<String>,
}

impl Door {
    /// Check whether `inventory` opens this door
    pub fn is_unlocked(&self, inventory: &dyn Inventory) -> bool {
        self.required_item
            .as_deref()
            .map_or(true, |item| inventory.has_item(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(required_item: Option<&str>) -> Door {
        Door {
            bounds: AABB::cube(Vec3::new(3.0, 1.0, 0.0), 0.5),
            next_level: "Vault".to_string(),
            next_position: Vec3::new(1.0, 1.0, 0.0),
            required_item: required_item.map(str::to_string),
        }
    }

    #[test]
    fn test_door_gating() {
        let mut inventory = HashSet::new();
        assert!(door(None).is_unlocked(&inventory));
        assert!(!door(Some("CardKey")).is_unlocked(&inventory));

        inventory.insert("CardKey".to_string());
        assert!(door(Some("CardKey")).is_unlocked(&inventory));
    }
}
