//! Live entity records for the server-side world model

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Location, Tick, Vec3};

/// Kinds of entities the script engine can act on or summon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Boss,
    Zombie,
    Skeleton,
    Spider,
    Blaze,
    Silverfish,
    Arrow,
    Fireball,
    Snowball,
    FallingBlock,
}

impl EntityKind {
    /// Projectile kinds are launched from a shooter rather than spawned in place.
    pub fn is_projectile(&self) -> bool {
        matches!(self, EntityKind::Arrow | EntityKind::Fireball | EntityKind::Snowball)
    }

    /// Kinds pulled down by gravity each tick by the world model.
    pub fn has_gravity(&self) -> bool {
        self.is_projectile() || matches!(self, EntityKind::FallingBlock)
    }

    /// Parse the entity-type string used by SUMMON_ENTITY blueprints.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "player" => Some(EntityKind::Player),
            "boss" => Some(EntityKind::Boss),
            "zombie" => Some(EntityKind::Zombie),
            "skeleton" => Some(EntityKind::Skeleton),
            "spider" => Some(EntityKind::Spider),
            "blaze" => Some(EntityKind::Blaze),
            "silverfish" => Some(EntityKind::Silverfish),
            "arrow" => Some(EntityKind::Arrow),
            "fireball" => Some(EntityKind::Fireball),
            "snowball" => Some(EntityKind::Snowball),
            "falling_block" => Some(EntityKind::FallingBlock),
            _ => None,
        }
    }
}

/// Potion effects scripts can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionEffectKind {
    Speed,
    Slowness,
    Strength,
    Weakness,
    Regeneration,
    Poison,
    Levitation,
    Nausea,
    Blindness,
}

/// One potion effect currently applied to an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedPotionEffect {
    pub effect: PotionEffectKind,
    pub remaining_ticks: u32,
    pub amplifier: u8,
}

/// An in-flight navigation order set by the NAVIGATE action
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOrder {
    pub destination: Location,
    pub speed: f64,
    pub avoid_obstacles: bool,
    pub expires_at: Tick,
}

/// One live entity in the world model
#[derive(Debug, Clone)]
pub struct LivingEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub location: Location,
    pub velocity: Vec3,
    pub health: f64,
    pub max_health: f64,
    /// Cleared on death or removal; invalid entities are skipped by effects.
    pub valid: bool,
    pub on_ground: bool,
    pub fire_ticks: u32,
    pub freeze_ticks: u32,
    pub invulnerable: bool,
    pub ai_enabled: bool,
    pub aware: bool,
    pub scale: f64,
    pub tags: Vec<String>,
    pub potion_effects: Vec<AppliedPotionEffect>,
    /// Set on launched projectiles for damage attribution.
    pub shooter: Option<EntityId>,
    pub navigation: Option<NavigationOrder>,
}

impl LivingEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>, location: Location) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind,
            location,
            velocity: Vec3::ZERO,
            health: 20.0,
            max_health: 20.0,
            valid: true,
            on_ground: false,
            fire_ticks: 0,
            freeze_ticks: 0,
            invulnerable: false,
            ai_enabled: true,
            aware: true,
            scale: 1.0,
            tags: Vec::new(),
            potion_effects: Vec::new(),
            shooter: None,
            navigation: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn add_potion_effect(&mut self, effect: PotionEffectKind, duration: u32, amplifier: u8) {
        self.potion_effects.push(AppliedPotionEffect {
            effect,
            remaining_ticks: duration,
            amplifier,
        });
    }

    pub fn has_potion_effect(&self, effect: PotionEffectKind) -> bool {
        self.potion_effects.iter().any(|e| e.effect == effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_classification() {
        assert!(EntityKind::Arrow.is_projectile());
        assert!(EntityKind::Fireball.is_projectile());
        assert!(!EntityKind::FallingBlock.is_projectile());
        assert!(EntityKind::FallingBlock.has_gravity());
        assert!(!EntityKind::Zombie.is_projectile());
    }

    #[test]
    fn test_entity_kind_from_name_is_case_insensitive() {
        assert_eq!(EntityKind::from_name("ARROW"), Some(EntityKind::Arrow));
        assert_eq!(EntityKind::from_name("Falling_Block"), Some(EntityKind::FallingBlock));
        assert_eq!(EntityKind::from_name("dragon"), None);
    }

    #[test]
    fn test_health_fraction() {
        let mut entity = LivingEntity::new(
            EntityKind::Zombie,
            "zombie",
            Location::new("overworld", 0.0, 64.0, 0.0),
        );
        entity.health = 5.0;
        assert_eq!(entity.health_fraction(), 0.25);
    }
}
