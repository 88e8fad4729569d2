//! Relative vectors: a direction computed at runtime from the acting boss
//! (or another origin) toward a resolved target, scaled by a multiplier

use serde::Deserialize;

use crate::core::config::EngineConfig;
use crate::core::types::{Location, Vec3};
use crate::scripts::data::ScriptActionData;
use crate::scripts::targets::{ScriptTargets, TargetSpec};
use crate::scripts::zone::ZoneBlueprint;
use crate::world::tracker::EntityTracker;
use crate::world::GameWorld;

#[derive(Debug, Clone, Deserialize)]
pub struct RelativeVectorBlueprint {
    pub target: TargetSpec,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// A relative-vector blueprint bound to its owning script
#[derive(Debug, Clone)]
pub struct RelativeVector {
    targets: ScriptTargets,
    multiplier: f64,
}

impl RelativeVector {
    pub fn new(
        blueprint: RelativeVectorBlueprint,
        zone: Option<ZoneBlueprint>,
        script_name: &str,
    ) -> Self {
        Self {
            targets: ScriptTargets::new(blueprint.target, zone, script_name),
            multiplier: blueprint.multiplier,
        }
    }

    /// Direction from `origin` to the first resolved target location, scaled.
    /// Resolution is uncached so the vector tracks live positions on
    /// repeating tasks. None when nothing resolves or worlds differ.
    pub fn compute(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &ScriptActionData,
        origin: &Location,
    ) -> Option<Vec3> {
        let destinations = self.targets.resolve_locations(world, tracker, config, data);
        let destination = destinations.first()?;
        if destination.world != origin.world {
            return None;
        }
        Some(origin.vector_to(destination) * self.multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ScriptEvent, TriggerEvent};
    use crate::scripts::targets::TargetKind;
    use crate::world::entity::EntityKind;

    #[test]
    fn test_vector_points_toward_target_and_scales() {
        let mut world = GameWorld::new();
        let tracker = EntityTracker::new();
        let config = EngineConfig::default();
        let boss = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 64.0, 0.0));
        let victim = world.spawn_player("alice", Location::new("overworld", 4.0, 64.0, 0.0));

        let data = ScriptActionData::from_event(
            boss,
            Some(victim),
            ScriptEvent::new(TriggerEvent::Timer),
        );
        let blueprint = RelativeVectorBlueprint {
            target: TargetSpec {
                kind: TargetKind::DirectTarget,
                ..TargetSpec::self_spec()
            },
            multiplier: 0.5,
        };
        let vector = RelativeVector::new(blueprint, None, "test");
        let origin = world.entity(boss).unwrap().location.clone();
        let computed = vector.compute(&world, &tracker, &config, &data, &origin).unwrap();
        assert!((computed.x - 2.0).abs() < 1e-9);
        assert!(computed.y.abs() < 1e-9);
    }

    #[test]
    fn test_vector_none_when_nothing_resolves() {
        let mut world = GameWorld::new();
        let tracker = EntityTracker::new();
        let config = EngineConfig::default();
        let boss = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 64.0, 0.0));
        let data =
            ScriptActionData::from_event(boss, None, ScriptEvent::new(TriggerEvent::Timer));
        let blueprint = RelativeVectorBlueprint {
            target: TargetSpec {
                kind: TargetKind::DirectTarget,
                ..TargetSpec::self_spec()
            },
            multiplier: 1.0,
        };
        let vector = RelativeVector::new(blueprint, None, "test");
        let origin = world.entity(boss).unwrap().location.clone();
        assert!(vector.compute(&world, &tracker, &config, &data, &origin).is_none());
    }
}
