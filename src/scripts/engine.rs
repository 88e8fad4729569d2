//! The script engine: event intake, the per-tick task drain, and teardown
//!
//! The engine owns the script registry, the scheduler, the entity tracker,
//! the RNG and the invulnerability registry. The host feeds it trigger
//! events and ticks; everything else is internal.

use std::path::Path;
use std::sync::Mutex;

use ahash::AHashSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::core::config::EngineConfig;
use crate::core::error::{EmberError, Result};
use crate::core::types::{ChunkPos, EntityId, Location};
use crate::events::{DamagePayload, ScriptEvent, TriggerEvent, TriggerKind};
use crate::scheduler::{ScheduledTask, TaskWork, TickScheduler};
use crate::scripts::action::{apply_tags, BeatOutcome, ExecCtx};
use crate::scripts::blueprint::ScriptFileBlueprint;
use crate::scripts::data::ScriptActionData;
use crate::scripts::script::ScriptRegistry;
use crate::world::entity::EntityKind;
use crate::world::tracker::{EntityTracker, TrackedBoss};
use crate::world::GameWorld;

/// Entities currently made invulnerable by scripts
///
/// Owned here so teardown has one place to find and revert every entry.
/// Mutex-guarded because host teardown hooks may run off the simulation
/// thread.
#[derive(Debug, Default)]
pub struct InvulnerabilityRegistry {
    entries: Mutex<AHashSet<EntityId>>,
}

impl InvulnerabilityRegistry {
    pub fn add(&self, id: EntityId) {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).insert(id);
    }

    pub fn remove(&self, id: EntityId) {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).remove(&id);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn drain(&self) -> Vec<EntityId> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.drain().collect()
    }
}

pub struct ScriptEngine {
    registry: ScriptRegistry,
    scheduler: TickScheduler,
    invulnerable: InvulnerabilityRegistry,
    pub tracker: EntityTracker,
    rng: ChaCha8Rng,
    config: EngineConfig,
}

impl ScriptEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            registry: ScriptRegistry::new(),
            scheduler: TickScheduler::new(),
            invulnerable: InvulnerabilityRegistry::default(),
            tracker: EntityTracker::new(),
            rng,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn invulnerability(&self) -> &InvulnerabilityRegistry {
        &self.invulnerable
    }

    // --- loading ---

    /// Load scripts from one TOML document. `source_name` labels errors and
    /// log lines, typically the file name.
    pub fn load_scripts_str(&mut self, raw: &str, source_name: &str) -> Result<usize> {
        let file: ScriptFileBlueprint =
            toml::from_str(raw).map_err(|err| EmberError::InvalidBlueprint {
                source_name: source_name.to_string(),
                message: err.to_string(),
            })?;
        let added = self.registry.register_blueprints(&file.scripts);
        info!(source = source_name, added, total = self.registry.len(), "Scripts loaded");
        self.registry.warn_on_chain_cycles();
        Ok(added)
    }

    /// Load every `.toml` file in a directory, non-recursively.
    pub fn load_scripts_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut added = 0;
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .collect();
        entries.sort();
        for path in entries {
            let raw = std::fs::read_to_string(&path)?;
            let name = path.file_name().map(|n| n.to_string_lossy().to_string());
            added += self.load_scripts_str(&raw, name.as_deref().unwrap_or("script file"))?;
        }
        Ok(added)
    }

    // --- event intake ---

    /// Damage involving a tracked boss. Runs every damage-subscribed script
    /// and the boss's minor powers, then returns the (possibly script-
    /// modified) damage the host should apply.
    pub fn on_damage(
        &mut self,
        world: &mut GameWorld,
        attacker: EntityId,
        victim: EntityId,
        damage: f64,
    ) -> f64 {
        let boss = if self.tracker.is_tracked_boss(attacker) {
            attacker
        } else if self.tracker.is_tracked_boss(victim) {
            victim
        } else {
            return damage;
        };
        let direct_target = if boss == attacker { victim } else { attacker };
        let event = ScriptEvent::new(TriggerEvent::Damage(DamagePayload {
            attacker,
            victim,
            damage,
        }));
        let data = ScriptActionData::from_event(boss, Some(direct_target), event.clone());
        self.dispatch(world, TriggerKind::Damage, &data);

        // Built-in powers fire when the boss lands a hit on a player.
        if boss == attacker && world.entity(victim).map_or(false, |e| e.is_player()) {
            if let Some(tracked) = self.tracker.boss_mut(boss) {
                let mut powers = std::mem::take(&mut tracked.powers);
                for power in &mut powers {
                    power.fire(world, &mut self.rng, boss, victim);
                }
                if let Some(tracked) = self.tracker.boss_mut(boss) {
                    tracked.powers = powers;
                }
            }
        }
        event.damage().unwrap_or(damage)
    }

    pub fn on_spawn(&mut self, world: &mut GameWorld, boss: EntityId) {
        let event = ScriptEvent::new(TriggerEvent::Spawn { entity: boss });
        let data = ScriptActionData::from_event(boss, None, event);
        self.dispatch(world, TriggerKind::Spawn, &data);
    }

    pub fn on_target_acquire(&mut self, world: &mut GameWorld, boss: EntityId, target: EntityId) {
        let event = ScriptEvent::new(TriggerEvent::TargetAcquire { entity: boss, target });
        let data = ScriptActionData::from_event(boss, Some(target), event);
        self.dispatch(world, TriggerKind::TargetAcquire, &data);
    }

    /// Run one script by name, outside any trigger event.
    pub fn run_script_by_name(
        &mut self,
        world: &mut GameWorld,
        name: &str,
        boss: EntityId,
        direct_target: Option<EntityId>,
    ) -> Result<()> {
        let script = self
            .registry
            .get(name)
            .ok_or_else(|| EmberError::ScriptNotFound(name.to_string()))?;
        let event = ScriptEvent::new(TriggerEvent::Timer);
        let data = ScriptActionData::from_event(boss, direct_target, event);
        let mut ctx = ExecCtx {
            world,
            tracker: &mut self.tracker,
            scheduler: &mut self.scheduler,
            scripts: &self.registry,
            invulnerable: &self.invulnerable,
            rng: &mut self.rng,
            config: &self.config,
        };
        script.run_from_event(&mut ctx, &data);
        Ok(())
    }

    fn dispatch(&mut self, world: &mut GameWorld, kind: TriggerKind, data: &ScriptActionData) {
        let scripts = self.registry.scripts_for(kind);
        if scripts.is_empty() {
            return;
        }
        let mut ctx = ExecCtx {
            world,
            tracker: &mut self.tracker,
            scheduler: &mut self.scheduler,
            scripts: &self.registry,
            invulnerable: &self.invulnerable,
            rng: &mut self.rng,
            config: &self.config,
        };
        for script in scripts {
            script.run_from_event(&mut ctx, data);
        }
    }

    // --- tick ---

    /// Advance the world one tick, then run every due scheduled task.
    pub fn tick(&mut self, world: &mut GameWorld) {
        world.tick();
        let due = self.scheduler.take_due(world.current_tick);
        if due.is_empty() {
            return;
        }
        let mut ctx = ExecCtx {
            world,
            tracker: &mut self.tracker,
            scheduler: &mut self.scheduler,
            scripts: &self.registry,
            invulnerable: &self.invulnerable,
            rng: &mut self.rng,
            config: &self.config,
        };
        for task in due {
            Self::run_task(&mut ctx, task);
        }
    }

    fn run_task(ctx: &mut ExecCtx, task: ScheduledTask) {
        let now = ctx.world.current_tick;
        match task.work {
            TaskWork::ActionBeat { action, mut data, mut state } => {
                let outcome = action.run_beat(ctx, &mut data, &mut state);
                let repeat = action.blueprint.repeat_every;
                if outcome == BeatOutcome::Continue && repeat > 0 {
                    ctx.scheduler.requeue(
                        task.handle,
                        now + u64::from(repeat),
                        TaskWork::ActionBeat { action, data, state },
                    );
                }
            }
            TaskWork::ApplyPush { targets, velocities, additive } => {
                for (target, velocity) in targets.into_iter().zip(velocities) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        if !entity.valid {
                            continue;
                        }
                        entity.velocity =
                            if additive { entity.velocity + velocity } else { velocity };
                        entity.on_ground = false;
                    }
                }
            }
            TaskWork::RevertInvulnerable { entity, invulnerable } => {
                if let Some(living) = ctx.world.entity_mut(entity) {
                    living.invulnerable = invulnerable;
                }
                if invulnerable {
                    ctx.invulnerable.add(entity);
                } else {
                    ctx.invulnerable.remove(entity);
                }
            }
            TaskWork::RevertTags { entity, tags, reapply } => {
                apply_tags(ctx, entity, &tags, reapply);
            }
            TaskWork::RevertAi { entity, enabled } => {
                if let Some(living) = ctx.world.entity_mut(entity) {
                    living.ai_enabled = enabled;
                }
            }
            TaskWork::RevertAware { entity, aware } => {
                if let Some(living) = ctx.world.entity_mut(entity) {
                    living.aware = aware;
                }
            }
            TaskWork::RevertScale { entity } => {
                if let Some(living) = ctx.world.entity_mut(entity) {
                    living.scale = 1.0;
                }
            }
            TaskWork::RemoveBossBar { bar } => {
                ctx.world.remove_boss_bar(bar);
            }
            TaskWork::RevertBlock { world, pos, material } => {
                ctx.world.set_block(&world, pos, material);
            }
            TaskWork::DespawnReinforcement { entity } => {
                ctx.tracker.unregister_boss(entity);
                ctx.world.invalidate(entity);
                debug!(?entity, "Reinforcement despawned");
            }
            TaskWork::LandingWatch { entity, scripts, data, deadline } => {
                let Some(living) = ctx.world.entity(entity) else {
                    warn!(?entity, "Landing watch lost its entity");
                    return;
                };
                // An entity that vanishes mid-flight still lands, at its
                // last known position.
                let landed = living.on_ground || !living.valid;
                let landing = living.location.clone();
                if !landed {
                    if now < deadline {
                        ctx.scheduler.requeue(
                            task.handle,
                            now + 1,
                            TaskWork::LandingWatch { entity, scripts, data, deadline },
                        );
                        return;
                    }
                    warn!(?entity, "Landing watch hit its deadline, firing anyway");
                }
                let child = data.for_chain(None).with_landing(landing);
                for name in &scripts {
                    let Some(script) = ctx.scripts.get(name) else {
                        warn!(script = %name, "Landing script not found");
                        continue;
                    };
                    script.run_chained(ctx, child.clone());
                }
            }
            TaskWork::RevertWeather { world } => {
                if let Some(state) = ctx.world.world_mut(&world) {
                    state.weather = crate::world::Weather::Clear;
                    state.weather_duration = 0;
                }
            }
        }
    }

    // --- host lifecycle hooks ---

    /// A chunk finished loading: flush reinforcements queued for it.
    pub fn chunk_loaded(&mut self, world: &mut GameWorld, world_name: &str, chunk: ChunkPos) {
        world.mark_chunk_loaded(world_name, chunk);
        let now = world.current_tick;
        for spawn in world.take_pending_spawns(world_name, chunk) {
            let id = world.spawn(EntityKind::Boss, spawn.boss_name.clone(), spawn.location.clone());
            let mut tracked = TrackedBoss::new(id, spawn.boss_name.clone());
            tracked.powers = self.config.powers_for(&spawn.boss_name);
            self.tracker.register_boss(tracked);
            if let Some(velocity) = spawn.velocity {
                if let Some(entity) = world.entity_mut(id) {
                    entity.velocity = velocity;
                }
            }
            if spawn.despawn_after > 0 {
                self.scheduler.run_after(
                    now,
                    spawn.despawn_after,
                    TaskWork::DespawnReinforcement { entity: id },
                );
            }
        }
    }

    /// Spawn and track a boss entity directly.
    pub fn spawn_boss(
        &mut self,
        world: &mut GameWorld,
        boss_name: &str,
        location: Location,
    ) -> EntityId {
        let id = world.spawn(EntityKind::Boss, boss_name, location);
        let mut tracked = TrackedBoss::new(id, boss_name);
        tracked.powers = self.config.powers_for(boss_name);
        self.tracker.register_boss(tracked);
        id
    }

    /// Cancel every scheduled task and revert every script-granted
    /// invulnerability. Timed reverts die with the queue, so the registry
    /// is the source of truth here.
    pub fn shutdown(&mut self, world: &mut GameWorld) {
        let cancelled = self.scheduler.len();
        self.scheduler.cancel_all();
        let reverted = self.invulnerable.drain();
        for id in &reverted {
            if let Some(entity) = world.entity_mut(*id) {
                entity.invulnerable = false;
            }
        }
        info!(cancelled, reverted = reverted.len(), "Script engine shut down");
    }
}
