//! In-memory model of the host game world
//!
//! This is the surface the script engine mutates: entities, per-world state,
//! the sparse voxel grid, and an effect log. Effects are fire-and-forget for
//! the engine, but the log keeps them observable for operators and tests.

pub mod entity;
pub mod scanner;
pub mod tracker;

use std::sync::Mutex;

use ahash::{AHashMap, AHashSet};

use crate::core::error::{EmberError, Result};
use crate::core::types::{BlockPos, ChunkPos, EntityId, Location, Tick, Vec3};
use entity::{EntityKind, LivingEntity, NavigationOrder};

/// Block materials scripts can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Air,
    Stone,
    Dirt,
    Sand,
    Gravel,
    Ice,
    Magma,
    Obsidian,
    Cobweb,
}

impl Material {
    pub fn is_solid(&self) -> bool {
        !matches!(self, Material::Air | Material::Cobweb)
    }
}

/// Weather states per world
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Clear,
    Precipitation,
    Thunder,
}

/// Per-world mutable state
#[derive(Debug, Clone)]
pub struct WorldState {
    pub time: u64,
    pub weather: Weather,
    pub weather_duration: u32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self { time: 0, weather: Weather::Clear, weather_duration: 0 }
    }
}

/// A reinforcement waiting for its chunk to load
#[derive(Debug, Clone)]
pub struct PendingSpawn {
    pub boss_name: String,
    pub location: Location,
    pub despawn_after: u32,
    pub velocity: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BossBarId(pub u64);

#[derive(Debug, Clone)]
pub struct DamageRecord {
    pub tick: Tick,
    pub victim: EntityId,
    pub amount: f64,
    pub source: Option<EntityId>,
    /// Explicit per-call multiplier applied to player victims.
    pub player_multiplier: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub tick: Tick,
    pub recipient: EntityId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub tick: Tick,
    pub recipient: EntityId,
    pub title: String,
    pub subtitle: String,
    pub fade_in: u32,
    pub duration: u32,
    pub fade_out: u32,
}

#[derive(Debug, Clone)]
pub struct BossBarRecord {
    pub recipient: EntityId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SoundRecord {
    pub tick: Tick,
    pub location: Location,
    pub sound: String,
    pub volume: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone)]
pub struct ParticleRecord {
    pub tick: Tick,
    pub location: Location,
    pub particle: String,
    pub amount: u32,
    pub spread: Vec3,
    pub speed: f64,
}

#[derive(Debug, Clone)]
pub struct FireworkRecord {
    pub tick: Tick,
    pub location: Location,
    pub effects: Vec<(String, Vec<String>)>,
    pub flicker: bool,
    pub trail: bool,
    pub power: u32,
    pub velocity: Option<Vec3>,
}

/// Observable log of fire-and-forget effects
#[derive(Debug, Default)]
pub struct EffectLog {
    pub damage: Vec<DamageRecord>,
    pub messages: Vec<MessageRecord>,
    pub action_bars: Vec<MessageRecord>,
    pub titles: Vec<TitleRecord>,
    pub sounds: Vec<SoundRecord>,
    pub particles: Vec<ParticleRecord>,
    pub lightning: Vec<Location>,
    pub fireworks: Vec<FireworkRecord>,
}

/// The authoritative server-side world
#[derive(Debug)]
pub struct GameWorld {
    pub current_tick: Tick,
    entities: AHashMap<EntityId, LivingEntity>,
    worlds: AHashMap<String, WorldState>,
    blocks: AHashMap<(String, BlockPos), Material>,
    loaded_chunks: AHashSet<(String, ChunkPos)>,
    // Chunk-load callbacks may arrive off the simulation thread on some hosts.
    pending_spawns: Mutex<AHashMap<(String, ChunkPos), Vec<PendingSpawn>>>,
    boss_bars: AHashMap<BossBarId, BossBarRecord>,
    next_boss_bar: u64,
    pub effects: EffectLog,
}

impl GameWorld {
    pub fn new() -> Self {
        Self {
            current_tick: 0,
            entities: AHashMap::new(),
            worlds: AHashMap::new(),
            blocks: AHashMap::new(),
            loaded_chunks: AHashSet::new(),
            pending_spawns: Mutex::new(AHashMap::new()),
            boss_bars: AHashMap::new(),
            next_boss_bar: 1,
            effects: EffectLog::default(),
        }
    }

    // --- worlds and blocks ---

    pub fn add_world(&mut self, name: impl Into<String>) {
        self.worlds.entry(name.into()).or_default();
    }

    pub fn world(&self, name: &str) -> Option<&WorldState> {
        self.worlds.get(name)
    }

    pub fn world_mut(&mut self, name: &str) -> Option<&mut WorldState> {
        self.worlds.get_mut(name)
    }

    pub fn block(&self, world: &str, pos: BlockPos) -> Material {
        self.blocks
            .get(&(world.to_string(), pos))
            .copied()
            .unwrap_or(Material::Air)
    }

    pub fn set_block(&mut self, world: &str, pos: BlockPos, material: Material) {
        if material == Material::Air {
            self.blocks.remove(&(world.to_string(), pos));
        } else {
            self.blocks.insert((world.to_string(), pos), material);
        }
    }

    // --- chunks and pending reinforcement spawns ---

    pub fn is_chunk_loaded(&self, world: &str, chunk: ChunkPos) -> bool {
        self.loaded_chunks.contains(&(world.to_string(), chunk))
    }

    pub fn mark_chunk_loaded(&mut self, world: &str, chunk: ChunkPos) {
        self.loaded_chunks.insert((world.to_string(), chunk));
    }

    pub fn mark_chunk_unloaded(&mut self, world: &str, chunk: ChunkPos) {
        self.loaded_chunks.remove(&(world.to_string(), chunk));
    }

    pub fn queue_pending_spawn(&self, world: &str, chunk: ChunkPos, spawn: PendingSpawn) {
        let mut pending = self.pending_spawns.lock().unwrap_or_else(|p| p.into_inner());
        pending.entry((world.to_string(), chunk)).or_default().push(spawn);
    }

    /// Drain reinforcements queued for a chunk, typically after it loads.
    pub fn take_pending_spawns(&self, world: &str, chunk: ChunkPos) -> Vec<PendingSpawn> {
        let mut pending = self.pending_spawns.lock().unwrap_or_else(|p| p.into_inner());
        pending.remove(&(world.to_string(), chunk)).unwrap_or_default()
    }

    pub fn pending_spawn_count(&self) -> usize {
        let pending = self.pending_spawns.lock().unwrap_or_else(|p| p.into_inner());
        pending.values().map(Vec::len).sum()
    }

    // --- entities ---

    pub fn spawn(&mut self, kind: EntityKind, name: impl Into<String>, location: Location) -> EntityId {
        self.add_world(location.world.clone());
        let entity = LivingEntity::new(kind, name, location);
        let id = entity.id;
        self.entities.insert(id, entity);
        id
    }

    pub fn spawn_player(&mut self, name: impl Into<String>, location: Location) -> EntityId {
        self.spawn(EntityKind::Player, name, location)
    }

    /// Launch a projectile from a live shooter. Returns `None` when the
    /// shooter is gone, mirroring the host API throwing in that case.
    pub fn launch_projectile(
        &mut self,
        shooter: EntityId,
        kind: EntityKind,
        velocity: Vec3,
    ) -> Option<EntityId> {
        let origin = {
            let entity = self.entities.get(&shooter)?;
            if !entity.valid {
                return None;
            }
            entity.location.clone()
        };
        let id = self.spawn(kind, format!("{kind:?}").to_lowercase(), origin);
        if let Some(projectile) = self.entities.get_mut(&id) {
            projectile.velocity = velocity;
            projectile.shooter = Some(shooter);
        }
        Some(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&LivingEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut LivingEntity> {
        self.entities.get_mut(&id)
    }

    pub fn is_valid(&self, id: EntityId) -> bool {
        self.entities.get(&id).map_or(false, |e| e.valid)
    }

    /// Mark an entity dead/removed. It stays queryable until `remove`.
    pub fn invalidate(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.valid = false;
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &LivingEntity> {
        self.entities.values()
    }

    /// Valid players in the given world, name-ordered for determinism.
    pub fn players_in_world(&self, world: &str) -> Vec<EntityId> {
        let mut players: Vec<&LivingEntity> = self
            .entities
            .values()
            .filter(|e| e.valid && e.is_player() && e.location.world == world)
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players.into_iter().map(|e| e.id).collect()
    }

    // --- entity mutation primitives ---

    pub fn teleport(&mut self, id: EntityId, destination: Location) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .filter(|e| e.valid)
            .ok_or(EmberError::EntityInvalid(id))?;
        entity.location = destination;
        entity.on_ground = false;
        Ok(())
    }

    /// Apply damage. The multiplier is recorded and applied for player
    /// victims only; invulnerable victims take nothing.
    pub fn deal_damage(
        &mut self,
        victim: EntityId,
        amount: f64,
        source: Option<EntityId>,
        player_multiplier: Option<f64>,
    ) {
        let tick = self.current_tick;
        let Some(entity) = self.entities.get_mut(&victim) else {
            return;
        };
        if !entity.valid || entity.invulnerable {
            return;
        }
        let multiplier = if entity.is_player() { player_multiplier } else { None };
        entity.health -= amount * multiplier.unwrap_or(1.0);
        if entity.health <= 0.0 {
            entity.health = 0.0;
            entity.valid = false;
        }
        self.effects.damage.push(DamageRecord {
            tick,
            victim,
            amount,
            source,
            player_multiplier: multiplier,
        });
    }

    pub fn navigate(
        &mut self,
        id: EntityId,
        speed: f64,
        destination: Location,
        avoid_obstacles: bool,
        timeout: u32,
    ) {
        let expires_at = self.current_tick + timeout as Tick;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.navigation = Some(NavigationOrder {
                destination,
                speed,
                avoid_obstacles,
                expires_at,
            });
        }
    }

    // --- messaging ---

    pub fn send_message(&mut self, recipient: EntityId, text: impl Into<String>) {
        let record = MessageRecord { tick: self.current_tick, recipient, text: text.into() };
        self.effects.messages.push(record);
    }

    pub fn send_action_bar(&mut self, recipient: EntityId, text: impl Into<String>) {
        let record = MessageRecord { tick: self.current_tick, recipient, text: text.into() };
        self.effects.action_bars.push(record);
    }

    pub fn send_title(&mut self, record: TitleRecord) {
        self.effects.titles.push(record);
    }

    pub fn show_boss_bar(&mut self, recipient: EntityId, text: impl Into<String>) -> BossBarId {
        let id = BossBarId(self.next_boss_bar);
        self.next_boss_bar += 1;
        self.boss_bars.insert(id, BossBarRecord { recipient, text: text.into() });
        id
    }

    pub fn remove_boss_bar(&mut self, id: BossBarId) {
        self.boss_bars.remove(&id);
    }

    pub fn active_boss_bars(&self) -> usize {
        self.boss_bars.len()
    }

    // --- world effects ---

    pub fn play_sound(&mut self, location: Location, sound: impl Into<String>, volume: f32, pitch: f32) {
        let record = SoundRecord {
            tick: self.current_tick,
            location,
            sound: sound.into(),
            volume,
            pitch,
        };
        self.effects.sounds.push(record);
    }

    pub fn spawn_particles(&mut self, record: ParticleRecord) {
        self.effects.particles.push(record);
    }

    pub fn strike_lightning(&mut self, location: Location) {
        self.effects.lightning.push(location);
    }

    pub fn spawn_fireworks(&mut self, record: FireworkRecord) {
        self.effects.fireworks.push(record);
    }

    // --- simulation ---

    /// Advance one tick: integrate velocities, apply gravity to projectiles
    /// and falling blocks, settle entities onto solid ground, and count down
    /// timed entity state.
    pub fn tick(&mut self) {
        self.current_tick += 1;
        let mut moves: Vec<(EntityId, Location, Vec3, bool)> = Vec::new();
        for entity in self.entities.values() {
            if !entity.valid || entity.on_ground {
                continue;
            }
            let mut velocity = entity.velocity;
            if entity.kind.has_gravity() {
                velocity.y -= 0.05;
            }
            if velocity == Vec3::ZERO {
                continue;
            }
            let next = entity.location.offset(velocity);
            let below = BlockPos { y: next.y.floor() as i32 - 1, ..next.block_pos() };
            let grounded = next.y <= 0.0 || self.block(&next.world, below).is_solid();
            moves.push((entity.id, next, velocity, grounded));
        }
        for (id, next, velocity, grounded) in moves {
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.location = next;
                entity.velocity = if grounded { Vec3::ZERO } else { velocity };
                entity.on_ground = grounded;
            }
        }
        for entity in self.entities.values_mut() {
            entity.fire_ticks = entity.fire_ticks.saturating_sub(1);
            entity.freeze_ticks = entity.freeze_ticks.saturating_sub(1);
            for effect in &mut entity.potion_effects {
                effect.remaining_ticks = effect.remaining_ticks.saturating_sub(1);
            }
            entity.potion_effects.retain(|e| e.remaining_ticks > 0);
            if entity
                .navigation
                .as_ref()
                .map_or(false, |n| n.expires_at <= self.current_tick)
            {
                entity.navigation = None;
            }
        }
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_loc() -> Location {
        Location::new("overworld", 0.0, 64.0, 0.0)
    }

    #[test]
    fn test_spawn_and_teleport() {
        let mut world = GameWorld::new();
        let id = world.spawn(EntityKind::Zombie, "zombie", spawn_loc());
        world.teleport(id, Location::new("overworld", 5.0, 64.0, 5.0)).unwrap();
        assert_eq!(world.entity(id).unwrap().location.x, 5.0);
    }

    #[test]
    fn test_teleport_invalid_entity_fails() {
        let mut world = GameWorld::new();
        let id = world.spawn(EntityKind::Zombie, "zombie", spawn_loc());
        world.invalidate(id);
        assert!(world.teleport(id, spawn_loc()).is_err());
    }

    #[test]
    fn test_damage_kills_and_invalidates() {
        let mut world = GameWorld::new();
        let id = world.spawn(EntityKind::Zombie, "zombie", spawn_loc());
        world.deal_damage(id, 25.0, None, None);
        assert!(!world.is_valid(id));
        assert_eq!(world.effects.damage.len(), 1);
    }

    #[test]
    fn test_invulnerable_entity_takes_no_damage() {
        let mut world = GameWorld::new();
        let id = world.spawn_player("alice", spawn_loc());
        world.entity_mut(id).unwrap().invulnerable = true;
        world.deal_damage(id, 100.0, None, None);
        assert!(world.is_valid(id));
        assert!(world.effects.damage.is_empty());
        assert_eq!(world.entity(id).unwrap().health, 20.0);
    }

    #[test]
    fn test_multiplier_recorded_for_players_only() {
        let mut world = GameWorld::new();
        let player = world.spawn_player("alice", spawn_loc());
        let zombie = world.spawn(EntityKind::Zombie, "zombie", spawn_loc());
        world.deal_damage(player, 2.0, None, Some(2.0));
        world.deal_damage(zombie, 2.0, None, Some(2.0));
        assert_eq!(world.effects.damage[0].player_multiplier, Some(2.0));
        assert_eq!(world.effects.damage[1].player_multiplier, None);
        assert_eq!(world.entity(player).unwrap().health, 16.0);
        assert_eq!(world.entity(zombie).unwrap().health, 18.0);
    }

    #[test]
    fn test_projectile_falls_and_lands() {
        let mut world = GameWorld::new();
        let shooter = world.spawn(EntityKind::Boss, "boss", Location::new("overworld", 0.0, 3.0, 0.0));
        let arrow = world
            .launch_projectile(shooter, EntityKind::Arrow, Vec3::new(0.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..40 {
            world.tick();
        }
        let arrow = world.entity(arrow).unwrap();
        assert!(arrow.on_ground);
        assert_eq!(arrow.shooter, Some(shooter));
    }

    #[test]
    fn test_pending_spawn_queue_roundtrip() {
        let world = GameWorld::new();
        let chunk = ChunkPos { x: 0, z: 0 };
        world.queue_pending_spawn(
            "overworld",
            chunk,
            PendingSpawn {
                boss_name: "ember_knight".into(),
                location: Location::new("overworld", 1.0, 64.0, 1.0),
                despawn_after: 0,
                velocity: None,
            },
        );
        assert_eq!(world.pending_spawn_count(), 1);
        let drained = world.take_pending_spawns("overworld", chunk);
        assert_eq!(drained.len(), 1);
        assert_eq!(world.pending_spawn_count(), 0);
    }

    #[test]
    fn test_players_in_world_sorted_by_name() {
        let mut world = GameWorld::new();
        world.spawn_player("zoe", spawn_loc());
        world.spawn_player("alice", spawn_loc());
        world.spawn_player("bob", Location::new("nether", 0.0, 64.0, 0.0));
        let players = world.players_in_world("overworld");
        let names: Vec<_> = players
            .iter()
            .map(|id| world.entity(*id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["alice", "zoe"]);
    }
}
