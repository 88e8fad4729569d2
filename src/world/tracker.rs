//! Registries for tracked bosses and player profiles
//!
//! Scripts tag both: a tracked boss entity carries script tags, and each
//! player has a profile record (the server-side inventory view) that carries
//! tags of its own.

use ahash::{AHashMap, AHashSet};

use crate::core::types::EntityId;
use crate::powers::MinorPower;

/// A live custom boss known to the plugin
#[derive(Debug, Clone)]
pub struct TrackedBoss {
    pub entity_id: EntityId,
    pub boss_name: String,
    tags: AHashSet<String>,
    pub powers: Vec<MinorPower>,
}

impl TrackedBoss {
    pub fn new(entity_id: EntityId, boss_name: impl Into<String>) -> Self {
        Self {
            entity_id,
            boss_name: boss_name.into(),
            tags: AHashSet::new(),
            powers: Vec::new(),
        }
    }

    pub fn add_tags(&mut self, tags: &[String]) {
        self.tags.extend(tags.iter().cloned());
    }

    pub fn remove_tags(&mut self, tags: &[String]) {
        for tag in tags {
            self.tags.remove(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

/// Per-player profile record keyed by the live player entity
#[derive(Debug, Clone, Default)]
pub struct PlayerProfile {
    tags: AHashSet<String>,
}

impl PlayerProfile {
    pub fn add_tags(&mut self, tags: &[String]) {
        self.tags.extend(tags.iter().cloned());
    }

    pub fn remove_tags(&mut self, tags: &[String]) {
        for tag in tags {
            self.tags.remove(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

/// Bookkeeping for every boss and player the plugin cares about
#[derive(Debug, Default)]
pub struct EntityTracker {
    bosses: AHashMap<EntityId, TrackedBoss>,
    players: AHashMap<EntityId, PlayerProfile>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_boss(&mut self, boss: TrackedBoss) {
        self.bosses.insert(boss.entity_id, boss);
    }

    pub fn unregister_boss(&mut self, id: EntityId) {
        self.bosses.remove(&id);
    }

    pub fn boss(&self, id: EntityId) -> Option<&TrackedBoss> {
        self.bosses.get(&id)
    }

    pub fn boss_mut(&mut self, id: EntityId) -> Option<&mut TrackedBoss> {
        self.bosses.get_mut(&id)
    }

    pub fn is_tracked_boss(&self, id: EntityId) -> bool {
        self.bosses.contains_key(&id)
    }

    pub fn register_player(&mut self, id: EntityId) {
        self.players.entry(id).or_default();
    }

    pub fn unregister_player(&mut self, id: EntityId) {
        self.players.remove(&id);
    }

    pub fn profile(&self, id: EntityId) -> Option<&PlayerProfile> {
        self.players.get(&id)
    }

    pub fn profile_mut(&mut self, id: EntityId) -> Option<&mut PlayerProfile> {
        self.players.get_mut(&id)
    }

    pub fn has_profile(&self, id: EntityId) -> bool {
        self.players.contains_key(&id)
    }

    /// True when either the tracked boss, the player profile, or the raw
    /// entity tag list would hold this tag. Raw tags are checked by callers
    /// with world access.
    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.bosses.get(&id).map_or(false, |b| b.has_tag(tag))
            || self.players.get(&id).map_or(false, |p| p.has_tag(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_tags_add_remove() {
        let id = EntityId::new();
        let mut tracker = EntityTracker::new();
        tracker.register_boss(TrackedBoss::new(id, "ember_knight"));

        let tags = vec!["enraged".to_string(), "phase_two".to_string()];
        tracker.boss_mut(id).unwrap().add_tags(&tags);
        assert!(tracker.has_tag(id, "enraged"));

        tracker.boss_mut(id).unwrap().remove_tags(&tags[..1]);
        assert!(!tracker.has_tag(id, "enraged"));
        assert!(tracker.has_tag(id, "phase_two"));
    }

    #[test]
    fn test_player_profile_tags_independent_of_boss_tags() {
        let id = EntityId::new();
        let mut tracker = EntityTracker::new();
        tracker.register_player(id);
        tracker.profile_mut(id).unwrap().add_tags(&["marked".to_string()]);
        assert!(tracker.has_tag(id, "marked"));
        assert!(!tracker.is_tracked_boss(id));
    }

    #[test]
    fn test_unregister_clears_lookup() {
        let id = EntityId::new();
        let mut tracker = EntityTracker::new();
        tracker.register_boss(TrackedBoss::new(id, "ember_knight"));
        tracker.unregister_boss(id);
        assert!(tracker.boss(id).is_none());
    }
}
