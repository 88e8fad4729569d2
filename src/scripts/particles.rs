//! Particle blueprints: cosmetic clouds emitted at resolved locations

use serde::Deserialize;

use crate::core::types::{Location, Vec3};
use crate::world::{GameWorld, ParticleRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct ParticleBlueprint {
    pub particle: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default)]
    pub spread: Vec3,
    #[serde(default)]
    pub speed: f64,
}

fn default_amount() -> u32 {
    1
}

impl ParticleBlueprint {
    /// Emit this cloud at one location.
    pub fn visualize(&self, world: &mut GameWorld, location: Location) {
        let tick = world.current_tick;
        world.spawn_particles(ParticleRecord {
            tick,
            location,
            particle: self.particle.clone(),
            amount: self.amount,
            spread: self.spread,
            speed: self.speed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visualize_records_particle_cloud() {
        let mut world = GameWorld::new();
        world.add_world("overworld".to_string());
        let blueprint: ParticleBlueprint = toml::from_str(
            r#"
            particle = "FLAME"
            amount = 12
            speed = 0.1
            "#,
        )
        .unwrap();
        blueprint.visualize(&mut world, Location::new("overworld", 0.5, 64.0, 0.5));
        assert_eq!(world.effects.particles.len(), 1);
        assert_eq!(world.effects.particles[0].particle, "FLAME");
        assert_eq!(world.effects.particles[0].amount, 12);
    }
}
