//! The targeting sublanguage: abstract target specs resolved to concrete
//! entities or locations at execution time
//!
//! Resolution is idempotent per invocation: the first lookup fills a cache
//! in `ScriptActionData` and later lookups (the effect and its condition
//! validation) see the identical ordered result even if the world changed
//! in between.

use serde::Deserialize;
use tracing::warn;

use crate::core::config::EngineConfig;
use crate::core::types::{EntityId, Location, Vec3};
use crate::scripts::data::ScriptActionData;
use crate::scripts::zone::{AnchoredZone, ZoneBlueprint};
use crate::world::scanner;
use crate::world::tracker::EntityTracker;
use crate::world::GameWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    #[serde(rename = "SELF")]
    Self_,
    DirectTarget,
    Nearby,
    AllPlayers,
    ZoneFull,
    ZoneBorder,
    Location,
    Locations,
    LandingLocation,
    PreviousResult,
    InheritScriptZoneFull,
    InheritScriptZoneBorder,
}

impl TargetKind {
    /// Location kinds get block-centered before position-sensitive effects.
    pub fn needs_centering(&self) -> bool {
        matches!(
            self,
            TargetKind::ZoneFull
                | TargetKind::ZoneBorder
                | TargetKind::InheritScriptZoneFull
                | TargetKind::InheritScriptZoneBorder
                | TargetKind::Location
                | TargetKind::Locations
                | TargetKind::LandingLocation
        )
    }
}

/// Parsed target specification of one action
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    pub kind: TargetKind,
    /// Scan radius for NEARBY; engine default when absent.
    #[serde(default)]
    pub range: Option<f64>,
    /// `world,x,y,z` string for LOCATION.
    #[serde(default)]
    pub location: Option<String>,
    /// `world,x,y,z` strings for LOCATIONS.
    #[serde(default)]
    pub locations: Vec<String>,
    /// Offset added to every resolved location.
    #[serde(default)]
    pub offset: Option<Vec3>,
}

impl TargetSpec {
    pub fn self_spec() -> Self {
        Self {
            kind: TargetKind::Self_,
            range: None,
            location: None,
            locations: Vec::new(),
            offset: None,
        }
    }
}

/// Which cache slot a resolution uses within the invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSlot {
    Primary,
    Final,
}

/// A target spec bound to its owning script (for zone context and warnings)
#[derive(Debug, Clone)]
pub struct ScriptTargets {
    pub spec: TargetSpec,
    zone: Option<ZoneBlueprint>,
    script_name: String,
}

impl ScriptTargets {
    pub fn new(spec: TargetSpec, zone: Option<ZoneBlueprint>, script_name: impl Into<String>) -> Self {
        Self { spec, zone, script_name: script_name.into() }
    }

    /// The owning script's zone bound to its anchor: a fixed location if the
    /// blueprint names one, otherwise the acting boss's current position.
    pub fn anchored_zone(
        &self,
        world: &GameWorld,
        config: &EngineConfig,
        data: &ScriptActionData,
    ) -> Option<AnchoredZone> {
        let blueprint = self.zone.as_ref()?;
        let anchor = match &blueprint.anchor {
            Some(raw) => match Location::parse(raw) {
                Some(location) => location,
                None => {
                    warn!(script = %self.script_name, anchor = %raw, "Invalid zone anchor location string");
                    return None;
                }
            },
            None => world.entity(data.boss)?.location.clone(),
        };
        let mut shape = blueprint.shape;
        if shape.radius() > config.max_zone_radius {
            warn!(
                script = %self.script_name,
                radius = shape.radius(),
                cap = config.max_zone_radius,
                "Zone radius exceeds cap, clamping"
            );
            shape = shape.clamped(config.max_zone_radius);
        }
        Some(AnchoredZone { shape, anchor })
    }

    /// Eagerly resolve both domains into the invocation's caches, so every
    /// later beat of a repeating task acts on one consistent set.
    pub fn cache_targets(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &mut ScriptActionData,
        slot: TargetSlot,
    ) {
        if slot == TargetSlot::Primary {
            self.entities(world, tracker, config, data);
        }
        self.locations(world, tracker, config, data, slot);
    }

    /// Resolved living entities, cached per invocation.
    pub fn entities(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &mut ScriptActionData,
    ) -> Vec<EntityId> {
        if let Some(cached) = &data.entity_cache {
            return cached.clone();
        }
        let resolved = self.resolve_entities(world, tracker, config, data);
        data.entity_cache = Some(resolved.clone());
        resolved
    }

    /// Resolved locations, cached per invocation and slot.
    pub fn locations(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &mut ScriptActionData,
        slot: TargetSlot,
    ) -> Vec<Location> {
        let cached = match slot {
            TargetSlot::Primary => &data.location_cache,
            TargetSlot::Final => &data.final_location_cache,
        };
        if let Some(cached) = cached {
            return cached.clone();
        }
        let resolved = self.resolve_locations(world, tracker, config, data);
        match slot {
            TargetSlot::Primary => data.location_cache = Some(resolved.clone()),
            TargetSlot::Final => data.final_location_cache = Some(resolved.clone()),
        }
        resolved
    }

    /// Uncached resolution, used by condition gates so they never disturb
    /// the action's own caches.
    pub fn resolve_entities(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &ScriptActionData,
    ) -> Vec<EntityId> {
        match self.spec.kind {
            TargetKind::Self_ => vec![data.boss],
            TargetKind::DirectTarget => data.direct_target.into_iter().collect(),
            TargetKind::Nearby => {
                let Some(boss) = world.entity(data.boss) else {
                    return Vec::new();
                };
                let range = self.spec.range.unwrap_or(config.nearby_scan_range);
                scanner::nearby_players(world, tracker, &boss.location, range)
            }
            TargetKind::AllPlayers => match world.entity(data.boss) {
                Some(boss) => world.players_in_world(&boss.location.world),
                None => Vec::new(),
            },
            TargetKind::ZoneFull => self.entities_in_zone(world, config, data, false),
            TargetKind::ZoneBorder => self.entities_in_zone(world, config, data, true),
            TargetKind::InheritScriptZoneFull => {
                self.entities_in_inherited_zone(world, data, false)
            }
            TargetKind::InheritScriptZoneBorder => {
                self.entities_in_inherited_zone(world, data, true)
            }
            TargetKind::PreviousResult => data
                .inherited
                .as_ref()
                .map(|i| i.previous.entities.clone())
                .unwrap_or_default(),
            TargetKind::Location | TargetKind::Locations | TargetKind::LandingLocation => {
                Vec::new()
            }
        }
    }

    pub fn resolve_locations(
        &self,
        world: &GameWorld,
        tracker: &EntityTracker,
        config: &EngineConfig,
        data: &ScriptActionData,
    ) -> Vec<Location> {
        let resolved = match self.spec.kind {
            TargetKind::Location => self
                .spec
                .location
                .as_deref()
                .and_then(|raw| self.parse_location(raw))
                .into_iter()
                .collect(),
            TargetKind::Locations => self
                .spec
                .locations
                .iter()
                .filter_map(|raw| self.parse_location(raw))
                .collect(),
            TargetKind::LandingLocation => data.landing_location.clone().into_iter().collect(),
            TargetKind::ZoneFull => self.zone_blocks(world, config, data, false),
            TargetKind::ZoneBorder => self.zone_blocks(world, config, data, true),
            TargetKind::InheritScriptZoneFull => Self::inherited_zone_blocks(data, false),
            TargetKind::InheritScriptZoneBorder => Self::inherited_zone_blocks(data, true),
            TargetKind::PreviousResult => data
                .inherited
                .as_ref()
                .map(|i| i.previous.locations.clone())
                .unwrap_or_default(),
            // Entity kinds resolve to the entities' positions.
            TargetKind::Self_
            | TargetKind::DirectTarget
            | TargetKind::Nearby
            | TargetKind::AllPlayers => self
                .resolve_entities(world, tracker, config, data)
                .into_iter()
                .filter_map(|id| world.entity(id).map(|e| e.location.clone()))
                .collect(),
        };
        match self.spec.offset {
            Some(offset) => resolved.into_iter().map(|l| l.offset(offset)).collect(),
            None => resolved,
        }
    }

    fn parse_location(&self, raw: &str) -> Option<Location> {
        let parsed = Location::parse(raw);
        if parsed.is_none() {
            warn!(script = %self.script_name, location = %raw, "Invalid location string in target spec");
        }
        parsed
    }

    fn entities_in_zone(
        &self,
        world: &GameWorld,
        config: &EngineConfig,
        data: &ScriptActionData,
        border: bool,
    ) -> Vec<EntityId> {
        match self.anchored_zone(world, config, data) {
            Some(zone) => Self::collect_zone_entities(world, &zone, border),
            None => {
                warn!(script = %self.script_name, "Zone target used by a script without a zone");
                Vec::new()
            }
        }
    }

    fn entities_in_inherited_zone(
        &self,
        world: &GameWorld,
        data: &ScriptActionData,
        border: bool,
    ) -> Vec<EntityId> {
        match data.inherited.as_ref().and_then(|i| i.zone.as_ref()) {
            Some(zone) => Self::collect_zone_entities(world, zone, border),
            None => {
                warn!(script = %self.script_name, "Inherit-zone target without an inherited zone");
                Vec::new()
            }
        }
    }

    fn collect_zone_entities(world: &GameWorld, zone: &AnchoredZone, border: bool) -> Vec<EntityId> {
        let shell = AnchoredZone { shape: zone.shape, anchor: zone.anchor.clone() };
        let mut found: Vec<&crate::world::entity::LivingEntity> = world
            .entities()
            .filter(|e| e.valid)
            .filter(|e| {
                if border {
                    // Border membership at entity granularity means inside
                    // the zone but within one block of its edge.
                    shell.contains(&e.location)
                        && !AnchoredZone {
                            shape: shell.shape.clamped(shell.shape.radius() - 1.0),
                            anchor: shell.anchor.clone(),
                        }
                        .contains(&e.location)
                } else {
                    shell.contains(&e.location)
                }
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found.into_iter().map(|e| e.id).collect()
    }

    fn inherited_zone_blocks(data: &ScriptActionData, border: bool) -> Vec<Location> {
        match data.inherited.as_ref().and_then(|i| i.zone.as_ref()) {
            Some(zone) => {
                if border {
                    zone.border_blocks()
                } else {
                    zone.full_blocks()
                }
            }
            None => Vec::new(),
        }
    }

    fn zone_blocks(
        &self,
        world: &GameWorld,
        config: &EngineConfig,
        data: &ScriptActionData,
        border: bool,
    ) -> Vec<Location> {
        match self.anchored_zone(world, config, data) {
            Some(zone) => {
                if border {
                    zone.border_blocks()
                } else {
                    zone.full_blocks()
                }
            }
            None => {
                warn!(script = %self.script_name, "Zone target used by a script without a zone");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ScriptEvent, TriggerEvent};
    use crate::world::entity::EntityKind;

    fn setup() -> (GameWorld, EntityTracker, EngineConfig) {
        (GameWorld::new(), EntityTracker::new(), EngineConfig::default())
    }

    fn data_for(boss: EntityId) -> ScriptActionData {
        ScriptActionData::from_event(boss, None, ScriptEvent::new(TriggerEvent::Timer))
    }

    #[test]
    fn test_self_resolves_to_boss() {
        let (mut world, tracker, config) = setup();
        let boss = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 64.0, 0.0));
        let targets = ScriptTargets::new(TargetSpec::self_spec(), None, "test");
        let mut data = data_for(boss);
        assert_eq!(targets.entities(&world, &tracker, &config, &mut data), vec![boss]);
    }

    #[test]
    fn test_resolution_is_idempotent_within_invocation() {
        let (mut world, mut tracker, config) = setup();
        let boss = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 64.0, 0.0));
        let near = world.spawn_player("near", Location::new("overworld", 2.0, 64.0, 0.0));
        tracker.register_player(near);

        let spec = TargetSpec { kind: TargetKind::Nearby, ..TargetSpec::self_spec() };
        let targets = ScriptTargets::new(spec, None, "test");
        let mut data = data_for(boss);

        let first = targets.entities(&world, &tracker, &config, &mut data);
        assert_eq!(first, vec![near]);

        // World state changes between the two lookups; the cached result
        // must not.
        let late = world.spawn_player("late", Location::new("overworld", 1.0, 64.0, 0.0));
        tracker.register_player(late);
        let second = targets.entities(&world, &tracker, &config, &mut data);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fresh_invocation_sees_new_world_state() {
        let (mut world, mut tracker, config) = setup();
        let boss = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 64.0, 0.0));
        let spec = TargetSpec { kind: TargetKind::Nearby, ..TargetSpec::self_spec() };
        let targets = ScriptTargets::new(spec, None, "test");

        let mut data = data_for(boss);
        assert!(targets.entities(&world, &tracker, &config, &mut data).is_empty());

        let near = world.spawn_player("near", Location::new("overworld", 2.0, 64.0, 0.0));
        tracker.register_player(near);
        let mut fresh = data_for(boss);
        assert_eq!(targets.entities(&world, &tracker, &config, &mut fresh), vec![near]);
    }

    #[test]
    fn test_location_strings_parse_with_offset() {
        let (world, tracker, config) = setup();
        let spec = TargetSpec {
            kind: TargetKind::Locations,
            locations: vec!["overworld,1,64,1".into(), "bogus".into()],
            offset: Some(Vec3::new(0.0, 2.0, 0.0)),
            ..TargetSpec::self_spec()
        };
        let targets = ScriptTargets::new(spec, None, "test");
        let mut data = data_for(EntityId::new());
        let locations = targets.locations(&world, &tracker, &config, &mut data, TargetSlot::Primary);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].y, 66.0);
    }

    #[test]
    fn test_landing_location_resolves_from_data() {
        let (world, tracker, config) = setup();
        let spec = TargetSpec { kind: TargetKind::LandingLocation, ..TargetSpec::self_spec() };
        let targets = ScriptTargets::new(spec, None, "test");
        let mut data = data_for(EntityId::new()).with_landing(Location::new("overworld", 3.0, 64.0, 3.0));
        let locations = targets.locations(&world, &tracker, &config, &mut data, TargetSlot::Primary);
        assert_eq!(locations, vec![Location::new("overworld", 3.0, 64.0, 3.0)]);
    }

    #[test]
    fn test_centering_rule_by_kind() {
        assert!(TargetKind::ZoneFull.needs_centering());
        assert!(TargetKind::LandingLocation.needs_centering());
        assert!(!TargetKind::Self_.needs_centering());
        assert!(!TargetKind::DirectTarget.needs_centering());
    }
}
