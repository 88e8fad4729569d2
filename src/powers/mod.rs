//! Minor combat powers
//!
//! Bosses can carry a small set of built-in on-hit powers that fire
//! alongside their scripts. Each power is independent and rate-limited by
//! its own cooldown.

use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::core::types::{EntityId, Tick, Vec3};
use crate::world::entity::{EntityKind, PotionEffectKind};
use crate::world::GameWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    /// Lift the victim briefly off the ground.
    Gravity,
    /// Nauseate the victim.
    Confusing,
    /// Loose a spread of arrows at the victim.
    ArrowVolley,
}

/// Power grant in the engine configuration, keyed by boss name
#[derive(Debug, Clone, Deserialize)]
pub struct PowerBlueprint {
    pub kind: PowerKind,
    #[serde(default = "default_power_cooldown")]
    pub cooldown: u32,
}

fn default_power_cooldown() -> u32 {
    100
}

/// One power instance carried by a tracked boss
#[derive(Debug, Clone)]
pub struct MinorPower {
    pub kind: PowerKind,
    pub cooldown_ticks: u32,
    last_fired: Option<Tick>,
}

impl MinorPower {
    pub fn new(kind: PowerKind, cooldown_ticks: u32) -> Self {
        Self { kind, cooldown_ticks, last_fired: None }
    }

    pub fn ready(&self, now: Tick) -> bool {
        match self.last_fired {
            Some(at) => now >= at + u64::from(self.cooldown_ticks),
            None => true,
        }
    }

    /// Fire at the victim if off cooldown. Returns whether it fired.
    pub fn fire(
        &mut self,
        world: &mut GameWorld,
        rng: &mut impl Rng,
        boss: EntityId,
        victim: EntityId,
    ) -> bool {
        let now = world.current_tick;
        if !self.ready(now) {
            return false;
        }
        if !world.is_valid(boss) || !world.is_valid(victim) {
            return false;
        }
        match self.kind {
            PowerKind::Gravity => {
                if let Some(entity) = world.entity_mut(victim) {
                    entity.add_potion_effect(PotionEffectKind::Levitation, 40, 1);
                    entity.velocity.y += 0.8;
                }
            }
            PowerKind::Confusing => {
                if let Some(entity) = world.entity_mut(victim) {
                    entity.add_potion_effect(PotionEffectKind::Nausea, 100, 0);
                }
            }
            PowerKind::ArrowVolley => {
                let Some(direction) = world
                    .entity(boss)
                    .zip(world.entity(victim))
                    .map(|(b, v)| b.location.vector_to(&v.location).normalize())
                else {
                    return false;
                };
                for _ in 0..3 {
                    let jitter = Vec3::new(
                        rng.gen_range(-0.1..=0.1),
                        rng.gen_range(0.0..=0.15),
                        rng.gen_range(-0.1..=0.1),
                    );
                    world.launch_projectile(boss, EntityKind::Arrow, (direction + jitter) * 1.6);
                }
            }
        }
        self.last_fired = Some(now);
        debug!(kind = ?self.kind, ?boss, ?victim, "Minor power fired");
        true
    }
}
