//! Nearby-player scan used by NEARBY targeting

use crate::core::types::{EntityId, Location};
use crate::world::tracker::EntityTracker;
use crate::world::GameWorld;

/// Valid, profiled players within `range` blocks of `center`, closest first.
pub fn nearby_players(
    world: &GameWorld,
    tracker: &EntityTracker,
    center: &Location,
    range: f64,
) -> Vec<EntityId> {
    let range_squared = range * range;
    let mut found: Vec<(f64, EntityId)> = world
        .entities()
        .filter(|e| e.valid && e.is_player() && tracker.has_profile(e.id))
        .filter_map(|e| {
            let d = e.location.distance_squared(center);
            (d <= range_squared).then_some((d, e.id))
        })
        .collect();
    found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    found.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_range_world_and_profile() {
        let mut world = GameWorld::new();
        let mut tracker = EntityTracker::new();
        let center = Location::new("overworld", 0.0, 64.0, 0.0);

        let near = world.spawn_player("near", Location::new("overworld", 3.0, 64.0, 0.0));
        let far = world.spawn_player("far", Location::new("overworld", 500.0, 64.0, 0.0));
        let other_world = world.spawn_player("other", Location::new("nether", 0.0, 64.0, 0.0));
        let unprofiled = world.spawn_player("ghost", Location::new("overworld", 1.0, 64.0, 0.0));
        tracker.register_player(near);
        tracker.register_player(far);
        tracker.register_player(other_world);
        let _ = unprofiled;

        let result = nearby_players(&world, &tracker, &center, 80.0);
        assert_eq!(result, vec![near]);
    }

    #[test]
    fn test_scan_orders_closest_first() {
        let mut world = GameWorld::new();
        let mut tracker = EntityTracker::new();
        let center = Location::new("overworld", 0.0, 64.0, 0.0);
        let far = world.spawn_player("b", Location::new("overworld", 10.0, 64.0, 0.0));
        let near = world.spawn_player("a", Location::new("overworld", 2.0, 64.0, 0.0));
        tracker.register_player(far);
        tracker.register_player(near);
        assert_eq!(nearby_players(&world, &tracker, &center, 80.0), vec![near, far]);
    }
}
