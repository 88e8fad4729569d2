//! Script zones: volumes anchored on the boss or a fixed location
//!
//! ZONE_FULL enumerates every block position inside the volume; ZONE_BORDER
//! only the outer shell. Block positions come out in deterministic scan
//! order (x, then y, then z).

use serde::Deserialize;

use crate::core::types::Location;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ZoneShape {
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
}

impl ZoneShape {
    pub fn radius(&self) -> f64 {
        match self {
            ZoneShape::Sphere { radius } => *radius,
            ZoneShape::Cylinder { radius, .. } => *radius,
        }
    }

    pub fn clamped(self, max_radius: f64) -> Self {
        match self {
            ZoneShape::Sphere { radius } => ZoneShape::Sphere { radius: radius.min(max_radius) },
            ZoneShape::Cylinder { radius, height } => ZoneShape::Cylinder {
                radius: radius.min(max_radius),
                height,
            },
        }
    }
}

/// Parsed zone description attached to a script
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneBlueprint {
    #[serde(flatten)]
    pub shape: ZoneShape,
    /// Fixed `world,x,y,z` anchor; absent means the acting boss's location.
    #[serde(default)]
    pub anchor: Option<String>,
}

/// A zone bound to a concrete anchor location at execution time
#[derive(Debug, Clone)]
pub struct AnchoredZone {
    pub shape: ZoneShape,
    pub anchor: Location,
}

impl AnchoredZone {
    pub fn contains(&self, location: &Location) -> bool {
        if location.world != self.anchor.world {
            return false;
        }
        match self.shape {
            ZoneShape::Sphere { radius } => {
                location.distance_squared(&self.anchor) <= radius * radius
            }
            ZoneShape::Cylinder { radius, height } => {
                let dx = location.x - self.anchor.x;
                let dz = location.z - self.anchor.z;
                dx * dx + dz * dz <= radius * radius
                    && location.y >= self.anchor.y
                    && location.y <= self.anchor.y + height
            }
        }
    }

    fn on_border(&self, location: &Location) -> bool {
        if !self.contains(location) {
            return false;
        }
        match self.shape {
            ZoneShape::Sphere { radius } => {
                let inner = (radius - 1.0).max(0.0);
                location.distance_squared(&self.anchor) >= inner * inner
            }
            ZoneShape::Cylinder { radius, .. } => {
                let dx = location.x - self.anchor.x;
                let dz = location.z - self.anchor.z;
                let inner = (radius - 1.0).max(0.0);
                dx * dx + dz * dz >= inner * inner
            }
        }
    }

    /// All block positions inside the volume, as uncentered block-corner
    /// locations.
    pub fn full_blocks(&self) -> Vec<Location> {
        self.blocks(|zone, candidate| zone.contains(candidate))
    }

    /// Only the outer one-block shell of the volume.
    pub fn border_blocks(&self) -> Vec<Location> {
        self.blocks(|zone, candidate| zone.on_border(candidate))
    }

    fn blocks(&self, keep: impl Fn(&Self, &Location) -> bool) -> Vec<Location> {
        let r = self.shape.radius().ceil() as i32;
        let (y_min, y_max) = match self.shape {
            ZoneShape::Sphere { .. } => (-r, r),
            ZoneShape::Cylinder { height, .. } => (0, height.ceil() as i32),
        };
        let base = self.anchor.block_pos();
        let mut blocks = Vec::new();
        for dx in -r..=r {
            for dy in y_min..=y_max {
                for dz in -r..=r {
                    let block = Location::new(
                        self.anchor.world.clone(),
                        (base.x + dx) as f64,
                        (base.y + dy) as f64,
                        (base.z + dz) as f64,
                    );
                    // Membership is judged at the cell center.
                    let sample = Location {
                        y: block.y + 0.5,
                        ..block.block_center()
                    };
                    if keep(self, &sample) {
                        blocks.push(block);
                    }
                }
            }
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(radius: f64) -> AnchoredZone {
        AnchoredZone {
            shape: ZoneShape::Sphere { radius },
            anchor: Location::new("overworld", 0.5, 64.5, 0.5),
        }
    }

    #[test]
    fn test_sphere_contains() {
        let zone = sphere(3.0);
        assert!(zone.contains(&Location::new("overworld", 1.0, 64.0, 1.0)));
        assert!(!zone.contains(&Location::new("overworld", 10.0, 64.0, 0.0)));
        assert!(!zone.contains(&Location::new("nether", 0.5, 64.5, 0.5)));
    }

    #[test]
    fn test_border_is_subset_of_full() {
        let zone = sphere(3.0);
        let full = zone.full_blocks();
        let border = zone.border_blocks();
        assert!(!border.is_empty());
        assert!(border.len() < full.len());
        for b in &border {
            assert!(full.contains(b));
        }
    }

    #[test]
    fn test_cylinder_extends_upward_from_anchor() {
        let zone = AnchoredZone {
            shape: ZoneShape::Cylinder { radius: 2.0, height: 4.0 },
            anchor: Location::new("overworld", 0.5, 64.0, 0.5),
        };
        assert!(zone.contains(&Location::new("overworld", 0.5, 67.0, 0.5)));
        assert!(!zone.contains(&Location::new("overworld", 0.5, 63.0, 0.5)));
        assert!(!zone.contains(&Location::new("overworld", 0.5, 69.0, 0.5)));
    }

    #[test]
    fn test_blueprint_parses_from_toml() {
        let zone: ZoneBlueprint = toml::from_str(
            r#"
shape = "sphere"
radius = 5.0
anchor = "overworld,0,64,0"
"#,
        )
        .unwrap();
        assert_eq!(zone.shape, ZoneShape::Sphere { radius: 5.0 });
        assert!(zone.anchor.is_some());
    }

    #[test]
    fn test_clamp_caps_radius() {
        let shape = ZoneShape::Sphere { radius: 100.0 }.clamped(32.0);
        assert_eq!(shape.radius(), 32.0);
    }
}
