//! Per-invocation execution context
//!
//! One `ScriptActionData` exists per action invocation. It owns the resolved
//! target caches (so resolution is idempotent within the invocation) and the
//! context a chained child inherits: the parent's resolved targets, the
//! parent script's zone anchor, and any landing location.

use crate::core::types::{EntityId, Location};
use crate::events::ScriptEvent;
use crate::scripts::zone::AnchoredZone;

/// Targets an action ended up acting on, handed to chained children
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    pub entities: Vec<EntityId>,
    pub locations: Vec<Location>,
}

impl ResolvedSet {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.locations.is_empty()
    }
}

/// Context inherited from the parent invocation in a script chain
#[derive(Debug, Clone)]
pub struct InheritedContext {
    pub previous: ResolvedSet,
    pub zone: Option<AnchoredZone>,
}

/// Mutable state for one action invocation
#[derive(Debug, Clone)]
pub struct ScriptActionData {
    pub boss: EntityId,
    pub direct_target: Option<EntityId>,
    pub event: ScriptEvent,
    pub landing_location: Option<Location>,
    pub inherited: Option<InheritedContext>,
    pub chain_depth: u32,
    pub entity_cache: Option<Vec<EntityId>>,
    pub location_cache: Option<Vec<Location>>,
    pub final_location_cache: Option<Vec<Location>>,
    /// Filled after this action validates its targets.
    pub chain_result: ResolvedSet,
}

impl ScriptActionData {
    pub fn from_event(boss: EntityId, direct_target: Option<EntityId>, event: ScriptEvent) -> Self {
        Self {
            boss,
            direct_target,
            event,
            landing_location: None,
            inherited: None,
            chain_depth: 0,
            entity_cache: None,
            location_cache: None,
            final_location_cache: None,
            chain_result: ResolvedSet::default(),
        }
    }

    /// Fresh context for a chained child invocation. Caches reset; the
    /// child sees this invocation's resolved targets as PREVIOUS_RESULT and
    /// the given zone as its inherit-script-zone.
    pub fn for_chain(&self, zone: Option<AnchoredZone>) -> Self {
        let previous = if self.chain_result.is_empty() {
            self.inherited
                .as_ref()
                .map(|i| i.previous.clone())
                .unwrap_or_default()
        } else {
            self.chain_result.clone()
        };
        Self {
            boss: self.boss,
            direct_target: self.direct_target,
            event: self.event.clone(),
            landing_location: self.landing_location.clone(),
            inherited: Some(InheritedContext { previous, zone }),
            chain_depth: self.chain_depth + 1,
            entity_cache: None,
            location_cache: None,
            final_location_cache: None,
            chain_result: ResolvedSet::default(),
        }
    }

    pub fn with_landing(mut self, location: Location) -> Self {
        self.landing_location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TriggerEvent;

    #[test]
    fn test_for_chain_resets_caches_and_bumps_depth() {
        let mut data = ScriptActionData::from_event(
            EntityId::new(),
            None,
            ScriptEvent::new(TriggerEvent::Timer),
        );
        data.entity_cache = Some(vec![EntityId::new()]);
        data.chain_result.entities.push(EntityId::new());

        let child = data.for_chain(None);
        assert!(child.entity_cache.is_none());
        assert_eq!(child.chain_depth, 1);
        assert_eq!(
            child.inherited.as_ref().map(|i| i.previous.entities.len()),
            Some(1)
        );
    }

    #[test]
    fn test_for_chain_falls_back_to_inherited_previous() {
        let boss = EntityId::new();
        let marker = EntityId::new();
        let mut data =
            ScriptActionData::from_event(boss, None, ScriptEvent::new(TriggerEvent::Timer));
        data.inherited = Some(InheritedContext {
            previous: ResolvedSet { entities: vec![marker], locations: vec![] },
            zone: None,
        });

        // This invocation resolved nothing, so the grandparent's result
        // keeps flowing to the child.
        let child = data.for_chain(None);
        assert_eq!(child.inherited.unwrap().previous.entities, vec![marker]);
    }

    #[test]
    fn test_with_landing_sets_location() {
        let data = ScriptActionData::from_event(
            EntityId::new(),
            None,
            ScriptEvent::new(TriggerEvent::Timer),
        )
        .with_landing(Location::new("overworld", 1.0, 2.0, 3.0));
        assert!(data.landing_location.is_some());
    }
}
