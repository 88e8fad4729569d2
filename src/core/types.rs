//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for live entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// 3D vector for positions, velocities and offsets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len, z: self.z / len }
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs, z: self.z * rhs }
    }
}

/// Integer coordinates of one voxel in the block grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Chunk coordinates (16x16 block columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn containing(pos: BlockPos) -> Self {
        Self { x: pos.x >> 4, z: pos.z >> 4 }
    }
}

/// A point in a named world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self { world: world.into(), x, y, z }
    }

    /// Parse a `world,x,y,z` location string.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',').map(str::trim);
        let world = parts.next()?.to_string();
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() || world.is_empty() {
            return None;
        }
        Some(Self { world, x, y, z })
    }

    pub fn block_pos(&self) -> BlockPos {
        BlockPos {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos::containing(self.block_pos())
    }

    /// The same location snapped to the horizontal center of its grid cell.
    /// Position-sensitive effects (particles) use this; block placement does not.
    pub fn block_center(&self) -> Self {
        Self {
            world: self.world.clone(),
            x: self.x.floor() + 0.5,
            y: self.y,
            z: self.z.floor() + 0.5,
        }
    }

    pub fn offset(&self, v: Vec3) -> Self {
        Self {
            world: self.world.clone(),
            x: self.x + v.x,
            y: self.y + v.y,
            z: self.z + v.z,
        }
    }

    /// Squared distance; infinite across worlds.
    pub fn distance_squared(&self, other: &Self) -> f64 {
        if self.world != other.world {
            return f64::INFINITY;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn vector_to(&self, other: &Self) -> Vec3 {
        Vec3::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{:.1},{:.1},{:.1}", self.world, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_roundtrip() {
        let loc = Location::parse("overworld,10.5,64,-3").unwrap();
        assert_eq!(loc.world, "overworld");
        assert_eq!(loc.x, 10.5);
        assert_eq!(loc.y, 64.0);
        assert_eq!(loc.z, -3.0);
    }

    #[test]
    fn test_location_parse_rejects_garbage() {
        assert!(Location::parse("overworld,1,2").is_none());
        assert!(Location::parse("overworld,1,2,3,4").is_none());
        assert!(Location::parse(",1,2,3").is_none());
        assert!(Location::parse("overworld,a,2,3").is_none());
    }

    #[test]
    fn test_block_center_snaps_horizontally_only() {
        let loc = Location::new("overworld", 10.9, 64.2, -3.7);
        let centered = loc.block_center();
        assert_eq!(centered.x, 10.5);
        assert_eq!(centered.y, 64.2);
        assert_eq!(centered.z, -3.5);
    }

    #[test]
    fn test_block_pos_floors_negatives() {
        let loc = Location::new("overworld", -0.5, 64.0, -16.1);
        let pos = loc.block_pos();
        assert_eq!(pos, BlockPos { x: -1, y: 64, z: -17 });
        assert_eq!(loc.chunk_pos(), ChunkPos { x: -1, z: -2 });
    }

    #[test]
    fn test_distance_across_worlds_is_infinite() {
        let a = Location::new("overworld", 0.0, 0.0, 0.0);
        let b = Location::new("nether", 0.0, 0.0, 0.0);
        assert_eq!(a.distance_squared(&b), f64::INFINITY);
    }

    #[test]
    fn test_vec3_normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-9);
    }
}
