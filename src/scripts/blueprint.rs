//! On-disk script schema
//!
//! Script files are TOML with a `[[scripts]]` array. Each script names the
//! trigger events it handles and carries an ordered action list. Actions are
//! kept as raw TOML values until the bind step so one malformed action is
//! skipped with a warning instead of rejecting the whole file.

use serde::Deserialize;
use tracing::warn;

use crate::core::types::Vec3;
use crate::events::TriggerKind;
use crate::scripts::conditions::ConditionsBlueprint;
use crate::scripts::particles::ParticleBlueprint;
use crate::scripts::targets::TargetSpec;
use crate::scripts::vector::RelativeVectorBlueprint;
use crate::scripts::zone::ZoneBlueprint;
use crate::world::entity::PotionEffectKind;
use crate::world::{Material, Weather};

/// One whole script file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptFileBlueprint {
    #[serde(default)]
    pub scripts: Vec<ScriptBlueprint>,
}

/// One named script: trigger events, an optional zone, an optional gate, and
/// an ordered action list
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptBlueprint {
    pub name: String,
    #[serde(default)]
    pub events: Vec<TriggerKind>,
    #[serde(default)]
    pub zone: Option<ZoneBlueprint>,
    #[serde(default)]
    pub conditions: Option<ConditionsBlueprint>,
    #[serde(default)]
    pub actions: Vec<toml::Value>,
}

impl ScriptBlueprint {
    /// Bind raw action tables into typed blueprints. Malformed entries are
    /// logged and dropped; the rest of the script still loads.
    pub fn bind_actions(&self) -> Vec<ActionBlueprint> {
        self.actions
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| match ActionBlueprint::deserialize(raw.clone()) {
                Ok(action) => Some(action),
                Err(err) => {
                    warn!(script = %self.name, index, %err, "Skipping malformed action");
                    None
                }
            })
            .collect()
    }
}

/// One action: what to do, to whom, and on what schedule
#[derive(Debug, Clone, Deserialize)]
pub struct ActionBlueprint {
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Who or where the effect lands; defaults to the acting boss.
    #[serde(default = "TargetSpec::self_spec")]
    pub target: TargetSpec,
    /// Second target slot for actions that need a destination.
    #[serde(default)]
    pub final_target: Option<TargetSpec>,
    #[serde(default)]
    pub conditions: Option<ConditionsBlueprint>,
    /// Ticks to wait before the first run.
    #[serde(default)]
    pub wait: u32,
    /// When positive, re-run every this many ticks.
    #[serde(default)]
    pub repeat_every: u32,
    /// Run count for repeating actions; zero or negative repeats until the
    /// acting boss is gone.
    #[serde(default)]
    pub times: i64,
    /// Scripts chained after this action's effect.
    #[serde(default)]
    pub scripts: Vec<String>,
    /// Chain exactly one of `scripts`, picked uniformly at random.
    #[serde(default)]
    pub only_run_one_script: bool,
}

/// The closed catalog of script effects
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Move each target to the first resolved destination.
    Teleport,
    Message {
        message: String,
    },
    ActionBarMessage {
        message: String,
    },
    TitleMessage {
        #[serde(default)]
        title: String,
        #[serde(default)]
        subtitle: String,
        #[serde(default = "default_title_fade")]
        fade_in: u32,
        #[serde(default = "default_title_hold")]
        duration: u32,
        #[serde(default = "default_title_fade")]
        fade_out: u32,
    },
    BossBarMessage {
        message: String,
        /// Ticks before the bar is removed; zero keeps it up.
        #[serde(default)]
        duration: u32,
    },
    PotionEffect {
        effect: PotionEffectKind,
        #[serde(default = "default_effect_duration")]
        duration: u32,
        #[serde(default)]
        amplifier: u8,
    },
    Damage {
        amount: f64,
        /// Extra multiplier applied when the victim is a player.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
    SetOnFire {
        duration: u32,
    },
    Freeze {
        /// Freeze ticks added per run.
        amount: u32,
    },
    PlaceBlock {
        material: Material,
        /// Ticks before the original block is restored; zero is permanent.
        #[serde(default)]
        duration: u32,
    },
    StrikeLightning,
    SpawnParticle {
        particles: Vec<ParticleBlueprint>,
    },
    SetMobAi {
        enabled: bool,
        #[serde(default)]
        duration: u32,
    },
    SetMobAware {
        aware: bool,
        #[serde(default)]
        duration: u32,
    },
    PlaySound {
        sound: String,
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default = "default_volume")]
        pitch: f32,
    },
    Push {
        #[serde(default)]
        velocity: Option<Vec3>,
        #[serde(default)]
        relative_vector: Option<RelativeVectorBlueprint>,
        /// Add to the target's current velocity instead of replacing it.
        #[serde(default)]
        additive: bool,
    },
    SummonReinforcement {
        boss: String,
        /// Ticks the reinforcement lives; zero is until killed.
        #[serde(default)]
        duration: u32,
        #[serde(default)]
        velocity: Option<Vec3>,
        #[serde(default)]
        relative_vector: Option<RelativeVectorBlueprint>,
    },
    /// No effect of its own; exists to chain `scripts`.
    RunScript,
    SpawnFireworks {
        /// Pairs of (shape, colors).
        #[serde(default)]
        effects: Vec<(String, Vec<String>)>,
        #[serde(default)]
        flicker: bool,
        #[serde(default)]
        trail: bool,
        #[serde(default = "default_firework_power")]
        power: u32,
        #[serde(default)]
        velocity: Option<Vec3>,
    },
    MakeInvulnerable {
        #[serde(default = "default_true")]
        invulnerable: bool,
        #[serde(default)]
        duration: u32,
    },
    Tag {
        tags: Vec<String>,
        /// Ticks before the tags are removed again; zero is permanent.
        #[serde(default)]
        duration: u32,
    },
    Untag {
        tags: Vec<String>,
        /// Ticks before the tags are re-applied; zero is permanent.
        #[serde(default)]
        duration: u32,
    },
    SetTime {
        time: u64,
    },
    SetWeather {
        weather: Weather,
        #[serde(default)]
        duration: Option<u32>,
    },
    SpawnFallingBlock {
        material: Material,
        #[serde(default)]
        velocity: Option<Vec3>,
        #[serde(default)]
        relative_vector: Option<RelativeVectorBlueprint>,
        /// Scripts run where the block comes to rest.
        #[serde(default)]
        landing_scripts: Vec<String>,
    },
    /// Scale the damage of the triggering damage event.
    ModifyDamage {
        multiplier: f64,
    },
    SummonEntity {
        entity_type: String,
        #[serde(default)]
        velocity: Option<Vec3>,
        #[serde(default)]
        relative_vector: Option<RelativeVectorBlueprint>,
        /// Scripts run where a non-projectile summon lands.
        #[serde(default)]
        landing_scripts: Vec<String>,
    },
    Navigate {
        #[serde(default = "default_multiplier")]
        speed: f64,
        #[serde(default = "default_true")]
        avoid_obstacles: bool,
        #[serde(default = "default_navigate_duration")]
        duration: u32,
    },
    Scale {
        scale: f64,
        /// Ticks before size reverts to normal; zero is permanent.
        #[serde(default)]
        duration: u32,
    },
}

impl ActionKind {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Teleport => "TELEPORT",
            ActionKind::Message { .. } => "MESSAGE",
            ActionKind::ActionBarMessage { .. } => "ACTION_BAR_MESSAGE",
            ActionKind::TitleMessage { .. } => "TITLE_MESSAGE",
            ActionKind::BossBarMessage { .. } => "BOSS_BAR_MESSAGE",
            ActionKind::PotionEffect { .. } => "POTION_EFFECT",
            ActionKind::Damage { .. } => "DAMAGE",
            ActionKind::SetOnFire { .. } => "SET_ON_FIRE",
            ActionKind::Freeze { .. } => "FREEZE",
            ActionKind::PlaceBlock { .. } => "PLACE_BLOCK",
            ActionKind::StrikeLightning => "STRIKE_LIGHTNING",
            ActionKind::SpawnParticle { .. } => "SPAWN_PARTICLE",
            ActionKind::SetMobAi { .. } => "SET_MOB_AI",
            ActionKind::SetMobAware { .. } => "SET_MOB_AWARE",
            ActionKind::PlaySound { .. } => "PLAY_SOUND",
            ActionKind::Push { .. } => "PUSH",
            ActionKind::SummonReinforcement { .. } => "SUMMON_REINFORCEMENT",
            ActionKind::RunScript => "RUN_SCRIPT",
            ActionKind::SpawnFireworks { .. } => "SPAWN_FIREWORKS",
            ActionKind::MakeInvulnerable { .. } => "MAKE_INVULNERABLE",
            ActionKind::Tag { .. } => "TAG",
            ActionKind::Untag { .. } => "UNTAG",
            ActionKind::SetTime { .. } => "SET_TIME",
            ActionKind::SetWeather { .. } => "SET_WEATHER",
            ActionKind::SpawnFallingBlock { .. } => "SPAWN_FALLING_BLOCK",
            ActionKind::ModifyDamage { .. } => "MODIFY_DAMAGE",
            ActionKind::SummonEntity { .. } => "SUMMON_ENTITY",
            ActionKind::Navigate { .. } => "NAVIGATE",
            ActionKind::Scale { .. } => "SCALE",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_title_fade() -> u32 {
    10
}

fn default_title_hold() -> u32 {
    60
}

fn default_effect_duration() -> u32 {
    200
}

fn default_firework_power() -> u32 {
    1
}

fn default_navigate_duration() -> u32 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::targets::TargetKind;

    #[test]
    fn test_parse_script_file_with_damage_action() {
        let file: ScriptFileBlueprint = toml::from_str(
            r#"
            [[scripts]]
            name = "OnHitBurn"
            events = ["damage"]

            [[scripts.actions]]
            action = "DAMAGE"
            amount = 5.0
            multiplier = 2.0
            target = { kind = "DIRECT_TARGET" }
            "#,
        )
        .unwrap();
        assert_eq!(file.scripts.len(), 1);
        let script = &file.scripts[0];
        assert_eq!(script.events, vec![TriggerKind::Damage]);
        let actions = script.bind_actions();
        assert_eq!(actions.len(), 1);
        match &actions[0].kind {
            ActionKind::Damage { amount, multiplier } => {
                assert_eq!(*amount, 5.0);
                assert_eq!(*multiplier, 2.0);
            }
            other => panic!("wrong kind: {}", other.name()),
        }
        assert_eq!(actions[0].target.kind, TargetKind::DirectTarget);
    }

    #[test]
    fn test_defaults_fill_schedule_and_target() {
        let file: ScriptFileBlueprint = toml::from_str(
            r#"
            [[scripts]]
            name = "Roar"

            [[scripts.actions]]
            action = "PLAY_SOUND"
            sound = "entity.ender_dragon.growl"
            "#,
        )
        .unwrap();
        let actions = file.scripts[0].bind_actions();
        let action = &actions[0];
        assert_eq!(action.wait, 0);
        assert_eq!(action.repeat_every, 0);
        assert_eq!(action.times, 0);
        assert_eq!(action.target.kind, TargetKind::Self_);
        match &action.kind {
            ActionKind::PlaySound { volume, pitch, .. } => {
                assert_eq!(*volume, 1.0);
                assert_eq!(*pitch, 1.0);
            }
            other => panic!("wrong kind: {}", other.name()),
        }
    }

    #[test]
    fn test_malformed_action_is_skipped_not_fatal() {
        let file: ScriptFileBlueprint = toml::from_str(
            r#"
            [[scripts]]
            name = "Mixed"

            [[scripts.actions]]
            action = "NO_SUCH_ACTION"

            [[scripts.actions]]
            action = "STRIKE_LIGHTNING"
            "#,
        )
        .unwrap();
        let actions = file.scripts[0].bind_actions();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0].kind, ActionKind::StrikeLightning));
    }

    #[test]
    fn test_repeat_schedule_fields_parse() {
        let file: ScriptFileBlueprint = toml::from_str(
            r#"
            [[scripts]]
            name = "Pulse"

            [[scripts.actions]]
            action = "STRIKE_LIGHTNING"
            wait = 20
            repeat_every = 10
            times = 5
            "#,
        )
        .unwrap();
        let action = &file.scripts[0].bind_actions()[0];
        assert_eq!((action.wait, action.repeat_every, action.times), (20, 10, 5));
    }
}
