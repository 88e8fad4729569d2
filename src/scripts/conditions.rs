//! Condition evaluation: filters on resolved targets and the yes/no gate
//! checked before an action fires or repeats
//!
//! Clauses AND together. A missing conditions blueprint means "always
//! true"; an absent clause is simply not checked.

use rand::Rng;
use serde::Deserialize;

use crate::core::config::EngineConfig;
use crate::core::types::{EntityId, Location};
use crate::scripts::data::ScriptActionData;
use crate::scripts::targets::{ScriptTargets, TargetSpec};
use crate::scripts::zone::ZoneBlueprint;
use crate::world::tracker::EntityTracker;
use crate::world::{GameWorld, Material};

/// Parsed condition clauses of one script or action
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionsBlueprint {
    #[serde(default)]
    pub is_alive: Option<bool>,
    #[serde(default)]
    pub is_player: Option<bool>,
    /// Entity must carry every listed tag.
    #[serde(default)]
    pub has_tags: Vec<String>,
    /// Entity must carry none of the listed tags.
    #[serde(default)]
    pub lacks_tags: Vec<String>,
    /// Health fraction bounds (0.0 to 1.0).
    #[serde(default)]
    pub health_above: Option<f64>,
    #[serde(default)]
    pub health_below: Option<f64>,
    /// Gate-only dice roll, 0.0 to 1.0.
    #[serde(default)]
    pub random_chance: Option<f64>,
    /// Location clause: the block there must (not) be air.
    #[serde(default)]
    pub requires_air: Option<bool>,
    /// What the yes/no gate inspects. When absent the entity clauses act
    /// purely as per-target filters and the gate only rolls random_chance.
    #[serde(default)]
    pub target: Option<TargetSpec>,
}

/// A conditions blueprint bound to its owning script
#[derive(Debug, Clone)]
pub struct ScriptConditions {
    blueprint: Option<ConditionsBlueprint>,
    gate_targets: Option<ScriptTargets>,
}

impl ScriptConditions {
    pub fn new(
        blueprint: Option<ConditionsBlueprint>,
        zone: Option<ZoneBlueprint>,
        script_name: &str,
    ) -> Self {
        let gate_targets = blueprint
            .as_ref()
            .and_then(|bp| bp.target.clone())
            .map(|spec| ScriptTargets::new(spec, zone, script_name));
        Self { blueprint, gate_targets }
    }

    pub fn is_empty(&self) -> bool {
        self.blueprint.is_none()
    }

    /// Keep only candidates satisfying every entity clause.
    pub fn validate_entities(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        candidates: Vec<EntityId>,
    ) -> Vec<EntityId> {
        let Some(blueprint) = &self.blueprint else {
            return candidates;
        };
        candidates
            .into_iter()
            .filter(|id| Self::entity_satisfies(blueprint, world, tracker, *id))
            .collect()
    }

    /// Keep only locations satisfying every location clause.
    pub fn validate_locations(&self, world: &GameWorld, candidates: Vec<Location>) -> Vec<Location> {
        let Some(blueprint) = &self.blueprint else {
            return candidates;
        };
        let Some(requires_air) = blueprint.requires_air else {
            return candidates;
        };
        candidates
            .into_iter()
            .filter(|location| {
                let is_air = world.block(&location.world, location.block_pos()) == Material::Air;
                is_air == requires_air
            })
            .collect()
    }

    /// The single gate checked before firing or re-firing an action.
    /// Resolution here is uncached so gate checks on later beats of a
    /// repeating task see live world state.
    pub fn meets_action_conditions(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        rng: &mut impl Rng,
        data: &ScriptActionData,
    ) -> bool {
        let Some(blueprint) = &self.blueprint else {
            return true;
        };
        if let Some(chance) = blueprint.random_chance {
            if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
                return false;
            }
        }
        let Some(gate_targets) = &self.gate_targets else {
            return true;
        };
        let gate_entities = gate_targets.resolve_entities(world, tracker, config, data);
        gate_entities
            .iter()
            .all(|id| Self::entity_satisfies(blueprint, world, tracker, *id))
    }

    fn entity_satisfies(
        blueprint: &ConditionsBlueprint,
        world: &GameWorld,
        tracker: &EntityTracker,
        id: EntityId,
    ) -> bool {
        let Some(entity) = world.entity(id) else {
            // A vanished entity can only satisfy an explicit is_alive=false.
            return blueprint.is_alive == Some(false);
        };
        if let Some(expected) = blueprint.is_alive {
            if (entity.valid && entity.health > 0.0) != expected {
                return false;
            }
        }
        if let Some(expected) = blueprint.is_player {
            if entity.is_player() != expected {
                return false;
            }
        }
        let carries = |tag: &String| {
            tracker.has_tag(id, tag) || entity.tags.iter().any(|t| t == tag)
        };
        if !blueprint.has_tags.iter().all(carries) {
            return false;
        }
        if blueprint.lacks_tags.iter().any(carries) {
            return false;
        }
        if let Some(bound) = blueprint.health_above {
            if entity.health_fraction() <= bound {
                return false;
            }
        }
        if let Some(bound) = blueprint.health_below {
            if entity.health_fraction() >= bound {
                return false;
            }
        }
        true
    }
}
