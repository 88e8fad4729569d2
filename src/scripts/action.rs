//! Action execution: one `ScriptAction` interprets one action blueprint
//!
//! An invocation resolves its targets eagerly, then either fires inline or
//! schedules beats on the tick scheduler. After its own effect, an action
//! fans out to its chained scripts.

use std::rc::Rc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::core::config::EngineConfig;
use crate::core::types::{EntityId, Location, Vec3};
use crate::scheduler::{BeatState, TaskWork, TickScheduler};
use crate::scripts::blueprint::{ActionBlueprint, ActionKind};
use crate::scripts::conditions::ScriptConditions;
use crate::scripts::data::{ResolvedSet, ScriptActionData};
use crate::scripts::engine::InvulnerabilityRegistry;
use crate::scripts::script::ScriptRegistry;
use crate::scripts::targets::{ScriptTargets, TargetSlot};
use crate::scripts::vector::{RelativeVector, RelativeVectorBlueprint};
use crate::scripts::zone::ZoneBlueprint;
use crate::world::entity::EntityKind;
use crate::world::tracker::{EntityTracker, TrackedBoss};
use crate::world::{FireworkRecord, GameWorld, PendingSpawn, TitleRecord, Weather};

/// Borrowed engine state threaded through action execution
pub struct ExecCtx<'a> {
    pub world: &'a mut GameWorld,
    pub tracker: &'a mut EntityTracker,
    pub scheduler: &'a mut TickScheduler,
    pub scripts: &'a ScriptRegistry,
    pub invulnerable: &'a InvulnerabilityRegistry,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a EngineConfig,
}

/// Whether a repeating task keeps its slot on the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatOutcome {
    Continue,
    Terminate,
}

/// One bound action of a script
#[derive(Debug)]
pub struct ScriptAction {
    pub blueprint: ActionBlueprint,
    pub script_name: String,
    zone: Option<ZoneBlueprint>,
    targets: ScriptTargets,
    final_targets: Option<ScriptTargets>,
    conditions: ScriptConditions,
}

impl ScriptAction {
    pub fn new(
        blueprint: ActionBlueprint,
        zone: Option<ZoneBlueprint>,
        script_name: impl Into<String>,
    ) -> Self {
        let script_name = script_name.into();
        let targets = ScriptTargets::new(blueprint.target.clone(), zone.clone(), &script_name);
        let final_targets = blueprint
            .final_target
            .clone()
            .map(|spec| ScriptTargets::new(spec, zone.clone(), &script_name));
        let conditions =
            ScriptConditions::new(blueprint.conditions.clone(), zone.clone(), &script_name);
        Self { blueprint, script_name, zone, targets, final_targets, conditions }
    }

    /// Entry point for one invocation. Targets are resolved into the
    /// invocation's caches up front, so delayed and repeating beats act on
    /// the set that existed when the script fired.
    pub fn run(self: &Rc<Self>, ctx: &mut ExecCtx, mut data: ScriptActionData) {
        let now = ctx.world.current_tick;
        self.targets
            .cache_targets(ctx.world, ctx.tracker, ctx.config, &mut data, TargetSlot::Primary);
        if let Some(final_targets) = &self.final_targets {
            final_targets
                .cache_targets(ctx.world, ctx.tracker, ctx.config, &mut data, TargetSlot::Final);
        }

        let blueprint = &self.blueprint;
        if blueprint.wait == 0 && blueprint.repeat_every == 0 {
            let mut state = BeatState::default();
            self.run_beat(ctx, &mut data, &mut state);
            return;
        }
        if blueprint.wait > 0 {
            let work = TaskWork::ActionBeat {
                action: Rc::clone(self),
                data,
                state: BeatState::default(),
            };
            ctx.scheduler.run_after(now, blueprint.wait, work);
            return;
        }
        // Repeating with no initial wait: first beat fires immediately.
        let mut state = BeatState::default();
        if self.run_beat(ctx, &mut data, &mut state) == BeatOutcome::Continue {
            let work = TaskWork::ActionBeat { action: Rc::clone(self), data, state };
            ctx.scheduler.run_after(now, blueprint.repeat_every, work);
        }
    }

    /// One beat: bump the counter, check the gate and termination rules,
    /// then fire the effect and the chained scripts.
    pub fn run_beat(
        self: &Rc<Self>,
        ctx: &mut ExecCtx,
        data: &mut ScriptActionData,
        state: &mut BeatState,
    ) -> BeatOutcome {
        let blueprint = &self.blueprint;
        state.counter += 1;
        if blueprint.repeat_every > 0 {
            if blueprint.times > 0 && state.counter > blueprint.times {
                return BeatOutcome::Terminate;
            }
            // Unbounded repeats live exactly as long as the acting boss.
            if blueprint.times <= 0 && !ctx.world.is_valid(data.boss) {
                debug!(script = %self.script_name, action = blueprint.kind.name(),
                       "Stopping unbounded repeat, actor gone");
                return BeatOutcome::Terminate;
            }
        }
        if !self.conditions.meets_action_conditions(ctx.world, ctx.tracker, ctx.config, ctx.rng, data)
        {
            return BeatOutcome::Terminate;
        }
        // Children see the post-filter set, not the raw resolution, so
        // targets the conditions excluded never leak into PREVIOUS_RESULT.
        let entities = self.entity_targets(ctx, data);
        let locations = self.location_targets(ctx, data, TargetSlot::Primary, false);
        self.run_effect(ctx, data);
        data.chain_result = ResolvedSet { entities, locations };
        self.run_additional_scripts(ctx, data);
        BeatOutcome::Continue
    }

    /// Validated entity targets of the primary spec.
    fn entity_targets(&self, ctx: &mut ExecCtx, data: &mut ScriptActionData) -> Vec<EntityId> {
        let resolved = self.targets.entities(ctx.world, ctx.tracker, ctx.config, data);
        self.conditions.validate_entities(ctx.world, ctx.tracker, resolved)
    }

    /// Validated location targets of the given slot. Zone and fixed-location
    /// kinds are block-centered for position effects when `center` is set.
    fn location_targets(
        &self,
        ctx: &mut ExecCtx,
        data: &mut ScriptActionData,
        slot: TargetSlot,
        center: bool,
    ) -> Vec<Location> {
        let targets = match slot {
            TargetSlot::Primary => &self.targets,
            TargetSlot::Final => match &self.final_targets {
                Some(targets) => targets,
                None => {
                    warn!(script = %self.script_name, action = self.blueprint.kind.name(),
                          "Action needs a final_target but none is set");
                    return Vec::new();
                }
            },
        };
        let resolved = targets.locations(ctx.world, ctx.tracker, ctx.config, data, slot);
        let resolved = self.conditions.validate_locations(ctx.world, resolved);
        if center && targets.spec.kind.needs_centering() {
            resolved.into_iter().map(|l| l.block_center()).collect()
        } else {
            resolved
        }
    }

    fn bound_vector(&self, blueprint: &RelativeVectorBlueprint) -> RelativeVector {
        RelativeVector::new(blueprint.clone(), self.zone.clone(), &self.script_name)
    }

    /// Explicit velocity, else the relative vector from `origin`, else None.
    fn launch_velocity(
        &self,
        ctx: &ExecCtx,
        data: &ScriptActionData,
        origin: &Location,
        velocity: &Option<Vec3>,
        relative_vector: &Option<RelativeVectorBlueprint>,
    ) -> Option<Vec3> {
        if let Some(velocity) = velocity {
            return Some(*velocity);
        }
        let blueprint = relative_vector.as_ref()?;
        self.bound_vector(blueprint)
            .compute(ctx.world, ctx.tracker, ctx.config, data, origin)
    }

    fn run_effect(&self, ctx: &mut ExecCtx, data: &mut ScriptActionData) {
        let now = ctx.world.current_tick;
        match &self.blueprint.kind {
            ActionKind::Teleport => {
                let destinations = self.location_targets(ctx, data, TargetSlot::Final, false);
                let Some(destination) = destinations.first().cloned() else {
                    warn!(script = %self.script_name, "TELEPORT resolved no destination");
                    return;
                };
                for target in self.entity_targets(ctx, data) {
                    if let Err(err) = ctx.world.teleport(target, destination.clone()) {
                        warn!(script = %self.script_name, %err, "Teleport skipped a target");
                    }
                }
            }
            ActionKind::Message { message } => {
                for target in self.entity_targets(ctx, data) {
                    if ctx.world.entity(target).map_or(false, |e| e.is_player()) {
                        ctx.world.send_message(target, message.clone());
                    } else {
                        warn!(script = %self.script_name, "MESSAGE target is not a player");
                    }
                }
            }
            ActionKind::ActionBarMessage { message } => {
                for target in self.entity_targets(ctx, data) {
                    if ctx.world.entity(target).map_or(false, |e| e.is_player()) {
                        ctx.world.send_action_bar(target, message.clone());
                    } else {
                        warn!(script = %self.script_name, "ACTION_BAR_MESSAGE target is not a player");
                    }
                }
            }
            ActionKind::TitleMessage { title, subtitle, fade_in, duration, fade_out } => {
                for target in self.entity_targets(ctx, data) {
                    if ctx.world.entity(target).map_or(false, |e| e.is_player()) {
                        ctx.world.send_title(TitleRecord {
                            tick: now,
                            recipient: target,
                            title: title.clone(),
                            subtitle: subtitle.clone(),
                            fade_in: *fade_in,
                            duration: *duration,
                            fade_out: *fade_out,
                        });
                    } else {
                        warn!(script = %self.script_name, "TITLE_MESSAGE target is not a player");
                    }
                }
            }
            ActionKind::BossBarMessage { message, duration } => {
                for target in self.entity_targets(ctx, data) {
                    if ctx.world.entity(target).map_or(false, |e| e.is_player()) {
                        let bar = ctx.world.show_boss_bar(target, message.clone());
                        if *duration > 0 {
                            ctx.scheduler.run_after(now, *duration, TaskWork::RemoveBossBar { bar });
                        }
                    } else {
                        warn!(script = %self.script_name, "BOSS_BAR_MESSAGE target is not a player");
                    }
                }
            }
            ActionKind::PotionEffect { effect, duration, amplifier } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        entity.add_potion_effect(*effect, *duration, *amplifier);
                    }
                }
            }
            ActionKind::Damage { amount, multiplier } => {
                let source = ctx.world.is_valid(data.boss).then_some(data.boss);
                for target in self.entity_targets(ctx, data) {
                    ctx.world.deal_damage(target, *amount, source, Some(*multiplier));
                }
            }
            ActionKind::SetOnFire { duration } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        // Overwrites any existing burn rather than extending it.
                        entity.fire_ticks = *duration;
                    }
                }
            }
            ActionKind::Freeze { amount } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        entity.freeze_ticks = entity.freeze_ticks.saturating_add(*amount);
                    }
                }
            }
            ActionKind::PlaceBlock { material, duration } => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, false) {
                    let pos = location.block_pos();
                    let original = ctx.world.block(&location.world, pos);
                    ctx.world.set_block(&location.world, pos, *material);
                    if *duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            *duration,
                            TaskWork::RevertBlock {
                                world: location.world.clone(),
                                pos,
                                material: original,
                            },
                        );
                    }
                }
            }
            ActionKind::StrikeLightning => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    ctx.world.strike_lightning(location);
                }
            }
            ActionKind::SpawnParticle { particles } => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    for particle in particles {
                        particle.visualize(ctx.world, location.clone());
                    }
                }
            }
            ActionKind::SetMobAi { enabled, duration } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        let previous = entity.ai_enabled;
                        entity.ai_enabled = *enabled;
                        if *duration > 0 && previous != *enabled {
                            ctx.scheduler.run_after(
                                now,
                                *duration,
                                TaskWork::RevertAi { entity: target, enabled: previous },
                            );
                        }
                    }
                }
            }
            ActionKind::SetMobAware { aware, duration } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        let previous = entity.aware;
                        entity.aware = *aware;
                        if *duration > 0 && previous != *aware {
                            ctx.scheduler.run_after(
                                now,
                                *duration,
                                TaskWork::RevertAware { entity: target, aware: previous },
                            );
                        }
                    }
                }
            }
            ActionKind::PlaySound { sound, volume, pitch } => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    ctx.world.play_sound(location, sound.clone(), *volume, *pitch);
                }
            }
            ActionKind::Push { velocity, relative_vector, additive } => {
                // The relative vector is anchored on the acting entity, so a
                // boss-to-target vector pushes every target the same way.
                let Some(origin) = ctx.world.entity(data.boss).map(|e| e.location.clone())
                else {
                    warn!(script = %self.script_name, "PUSH with no live actor");
                    return;
                };
                let Some(push) =
                    self.launch_velocity(ctx, data, &origin, velocity, relative_vector)
                else {
                    warn!(script = %self.script_name, "PUSH has neither velocity nor relative vector");
                    return;
                };
                let targets = self.entity_targets(ctx, data);
                if !targets.is_empty() {
                    // Applied next tick so the push wins over same-tick
                    // velocity writes by the host.
                    let velocities = vec![push; targets.len()];
                    ctx.scheduler.run_after(
                        now,
                        1,
                        TaskWork::ApplyPush { targets, velocities, additive: *additive },
                    );
                }
            }
            ActionKind::SummonReinforcement { boss, duration, velocity, relative_vector } => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    let chunk = location.chunk_pos();
                    if !ctx.world.is_chunk_loaded(&location.world, chunk) {
                        ctx.world.queue_pending_spawn(
                            &location.world,
                            chunk,
                            PendingSpawn {
                                boss_name: boss.clone(),
                                location: location.clone(),
                                despawn_after: *duration,
                                velocity: *velocity,
                            },
                        );
                        continue;
                    }
                    let id = ctx.world.spawn(EntityKind::Boss, boss.clone(), location.clone());
                    let mut tracked = TrackedBoss::new(id, boss.clone());
                    tracked.powers = ctx.config.powers_for(boss);
                    ctx.tracker.register_boss(tracked);
                    if let Some(push) =
                        self.launch_velocity(ctx, data, &location, velocity, relative_vector)
                    {
                        if let Some(entity) = ctx.world.entity_mut(id) {
                            entity.velocity = push;
                        }
                    }
                    if *duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            *duration,
                            TaskWork::DespawnReinforcement { entity: id },
                        );
                    }
                }
            }
            ActionKind::RunScript => {}
            ActionKind::SpawnFireworks { effects, flicker, trail, power, velocity } => {
                if effects.is_empty() {
                    warn!(script = %self.script_name, "SPAWN_FIREWORKS without effects");
                    return;
                }
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    ctx.world.spawn_fireworks(FireworkRecord {
                        tick: now,
                        location,
                        effects: effects.clone(),
                        flicker: *flicker,
                        trail: *trail,
                        power: *power,
                        velocity: *velocity,
                    });
                }
            }
            ActionKind::MakeInvulnerable { invulnerable, duration } => {
                for target in self.entity_targets(ctx, data) {
                    let Some(entity) = ctx.world.entity_mut(target) else {
                        continue;
                    };
                    let previous = entity.invulnerable;
                    if previous == *invulnerable {
                        // Nothing changed, so no registry entry: a revert
                        // will never fire for this target.
                        continue;
                    }
                    entity.invulnerable = *invulnerable;
                    if *invulnerable {
                        ctx.invulnerable.add(target);
                    } else {
                        ctx.invulnerable.remove(target);
                    }
                    if *duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            *duration,
                            TaskWork::RevertInvulnerable { entity: target, invulnerable: previous },
                        );
                    }
                }
            }
            ActionKind::Tag { tags, duration } => {
                for target in self.entity_targets(ctx, data) {
                    apply_tags(ctx, target, tags, true);
                    if *duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            *duration,
                            TaskWork::RevertTags {
                                entity: target,
                                tags: tags.clone(),
                                reapply: false,
                            },
                        );
                    }
                }
            }
            ActionKind::Untag { tags, duration } => {
                for target in self.entity_targets(ctx, data) {
                    apply_tags(ctx, target, tags, false);
                    if *duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            *duration,
                            TaskWork::RevertTags {
                                entity: target,
                                tags: tags.clone(),
                                reapply: true,
                            },
                        );
                    }
                }
            }
            ActionKind::SetTime { time } => {
                for world_name in self.target_worlds(ctx, data) {
                    if let Some(state) = ctx.world.world_mut(&world_name) {
                        state.time = *time;
                    }
                }
            }
            ActionKind::SetWeather { weather, duration } => {
                let duration = duration.unwrap_or(ctx.config.default_weather_duration);
                for world_name in self.target_worlds(ctx, data) {
                    if let Some(state) = ctx.world.world_mut(&world_name) {
                        state.weather = *weather;
                        state.weather_duration = duration;
                    }
                    if *weather != Weather::Clear && duration > 0 {
                        ctx.scheduler.run_after(
                            now,
                            duration,
                            TaskWork::RevertWeather { world: world_name },
                        );
                    }
                }
            }
            ActionKind::SpawnFallingBlock { material, velocity, relative_vector, landing_scripts } => {
                for location in self.location_targets(ctx, data, TargetSlot::Primary, true) {
                    let id = ctx.world.spawn(
                        EntityKind::FallingBlock,
                        format!("falling_{material:?}").to_lowercase(),
                        location.clone(),
                    );
                    if let Some(push) =
                        self.launch_velocity(ctx, data, &location, velocity, relative_vector)
                    {
                        if let Some(entity) = ctx.world.entity_mut(id) {
                            entity.velocity = push;
                        }
                    }
                    self.watch_landing(ctx, data, id, landing_scripts);
                }
            }
            ActionKind::ModifyDamage { multiplier } => {
                if !data.event.scale_damage(*multiplier) {
                    warn!(script = %self.script_name,
                          "MODIFY_DAMAGE outside a damage event does nothing");
                }
            }
            ActionKind::SummonEntity { entity_type, velocity, relative_vector, landing_scripts } => {
                let Some(kind) = EntityKind::from_name(entity_type) else {
                    warn!(script = %self.script_name, %entity_type, "Unknown entity type");
                    return;
                };
                let shooter_origin = ctx
                    .world
                    .entity(data.boss)
                    .filter(|e| e.valid)
                    .map(|e| e.location.clone());
                let locations = self.location_targets(ctx, data, TargetSlot::Primary, true);
                if kind.is_projectile() {
                    // Launched from the shooter when one is alive, one
                    // projectile per resolved location. A dead or missing
                    // shooter falls back to plain spawns below.
                    if let Some(origin) = shooter_origin {
                        let Some(push) =
                            self.launch_velocity(ctx, data, &origin, velocity, relative_vector)
                        else {
                            warn!(script = %self.script_name, "Projectile summon needs a velocity");
                            return;
                        };
                        for _ in &locations {
                            if let Some(id) = ctx.world.launch_projectile(data.boss, kind, push) {
                                self.watch_landing(ctx, data, id, landing_scripts);
                            }
                        }
                        return;
                    }
                }
                for location in locations {
                    let id = ctx.world.spawn(kind, entity_type.clone(), location.clone());
                    if let Some(push) =
                        self.launch_velocity(ctx, data, &location, velocity, relative_vector)
                    {
                        if let Some(entity) = ctx.world.entity_mut(id) {
                            entity.velocity = push;
                        }
                    }
                    self.watch_landing(ctx, data, id, landing_scripts);
                }
            }
            ActionKind::Navigate { speed, avoid_obstacles, duration } => {
                let destinations = self.location_targets(ctx, data, TargetSlot::Final, false);
                let Some(destination) = destinations.first().cloned() else {
                    warn!(script = %self.script_name, "NAVIGATE resolved no destination");
                    return;
                };
                for target in self.entity_targets(ctx, data) {
                    if !ctx.tracker.is_tracked_boss(target) {
                        warn!(script = %self.script_name, "NAVIGATE target is not a tracked boss");
                        continue;
                    }
                    ctx.world.navigate(
                        target,
                        *speed,
                        destination.clone(),
                        *avoid_obstacles,
                        *duration,
                    );
                }
            }
            ActionKind::Scale { scale, duration } => {
                for target in self.entity_targets(ctx, data) {
                    if let Some(entity) = ctx.world.entity_mut(target) {
                        entity.scale = *scale;
                        if *duration > 0 {
                            ctx.scheduler.run_after(
                                now,
                                *duration,
                                TaskWork::RevertScale { entity: target },
                            );
                        }
                    }
                }
            }
        }
    }

    /// Distinct worlds holding the resolved targets, for world-level effects.
    /// The default SELF target makes this the acting boss's world.
    fn target_worlds(&self, ctx: &mut ExecCtx, data: &mut ScriptActionData) -> Vec<String> {
        let mut worlds: Vec<String> = Vec::new();
        for location in self.location_targets(ctx, data, TargetSlot::Primary, false) {
            if !worlds.contains(&location.world) {
                worlds.push(location.world.clone());
            }
        }
        if worlds.is_empty() {
            warn!(script = %self.script_name, action = self.blueprint.kind.name(),
                  "World-level action resolved no target world");
        }
        worlds
    }

    fn watch_landing(
        &self,
        ctx: &mut ExecCtx,
        data: &ScriptActionData,
        entity: EntityId,
        landing_scripts: &[String],
    ) {
        if landing_scripts.is_empty() {
            return;
        }
        let now = ctx.world.current_tick;
        ctx.scheduler.run_after(
            now,
            1,
            TaskWork::LandingWatch {
                entity,
                scripts: landing_scripts.to_vec(),
                data: data.clone(),
                deadline: now + u64::from(ctx.config.landing_watch_cap),
            },
        );
    }

    /// Fan out to chained scripts with inherited context.
    fn run_additional_scripts(&self, ctx: &mut ExecCtx, data: &ScriptActionData) {
        let blueprint = &self.blueprint;
        if blueprint.scripts.is_empty() {
            if matches!(blueprint.kind, ActionKind::RunScript) {
                warn!(script = %self.script_name, "RUN_SCRIPT with no scripts listed");
            }
            return;
        }
        if data.chain_depth >= ctx.config.max_chain_depth {
            warn!(script = %self.script_name, depth = data.chain_depth,
                  "Script chain depth limit reached, not chaining further");
            return;
        }
        let zone = self.targets.anchored_zone(ctx.world, ctx.config, data);
        let child = data.for_chain(zone);
        let names: Vec<&String> = if blueprint.only_run_one_script {
            let index = ctx.rng.gen_range(0..blueprint.scripts.len());
            vec![&blueprint.scripts[index]]
        } else {
            blueprint.scripts.iter().collect()
        };
        for name in names {
            let Some(script) = ctx.scripts.get(name) else {
                warn!(script = %self.script_name, chained = %name, "Chained script not found");
                continue;
            };
            script.run_chained(ctx, child.clone());
        }
    }
}

/// Tags go to the tracked boss or player profile when one exists,
/// otherwise onto the raw entity.
pub(crate) fn apply_tags(ctx: &mut ExecCtx, target: EntityId, tags: &[String], add: bool) {
    if let Some(boss) = ctx.tracker.boss_mut(target) {
        if add {
            boss.add_tags(tags);
        } else {
            boss.remove_tags(tags);
        }
        return;
    }
    if let Some(profile) = ctx.tracker.profile_mut(target) {
        if add {
            profile.add_tags(tags);
        } else {
            profile.remove_tags(tags);
        }
        return;
    }
    if let Some(entity) = ctx.world.entity_mut(target) {
        if add {
            for tag in tags {
                if !entity.tags.contains(tag) {
                    entity.tags.push(tag.clone());
                }
            }
        } else {
            entity.tags.retain(|t| !tags.contains(t));
        }
    }
}
