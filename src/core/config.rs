//! Engine configuration with documented constants

use ahash::AHashMap;
use serde::Deserialize;

use crate::core::error::{EmberError, Result};
use crate::powers::{MinorPower, PowerBlueprint};

/// Tunable settings for the script engine
///
/// Everything is expressed in ticks (20 per second) or blocks so that script
/// authors and operators share one unit system.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radius in blocks for NEARBY target scans
    ///
    /// Defaults to five chunks (80 blocks), matching the minimum view
    /// distance the server guarantees to players.
    pub nearby_scan_range: f64,

    /// Upper bound in ticks on landing watch tasks
    ///
    /// A summoned projectile or falling block that never touches the ground
    /// still fires its landing scripts after this many ticks (default five
    /// minutes) so the watch task always terminates.
    pub landing_watch_cap: u32,

    /// Weather duration in ticks applied when a SET_WEATHER action does not
    /// specify one
    pub default_weather_duration: u32,

    /// Maximum script chain depth before fan-out stops with a warning
    ///
    /// Script graphs may legitimately contain cycles (authored loops); this
    /// bound turns runaway recursion into a logged defect instead of a stack
    /// overflow.
    pub max_chain_depth: u32,

    /// Largest zone radius in blocks a ZONE_FULL/ZONE_BORDER target will
    /// enumerate; larger radii are clamped with a warning
    pub max_zone_radius: f64,

    /// Seed for the engine RNG (run-one-random chaining, chance conditions)
    ///
    /// `None` seeds from entropy; tests pin it for determinism.
    pub rng_seed: Option<u64>,

    /// Built-in minor powers granted to bosses by name
    ///
    /// Every boss registered under a listed name (directly spawned or
    /// summoned as a reinforcement) carries these powers.
    pub boss_powers: AHashMap<String, Vec<PowerBlueprint>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nearby_scan_range: 80.0,
            landing_watch_cap: 20 * 60 * 5,
            default_weather_duration: 6000,
            max_chain_depth: 64,
            max_zone_radius: 32.0,
            rng_seed: None,
            boss_powers: AHashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh power instances for a boss name, per the `boss_powers` table.
    pub fn powers_for(&self, boss_name: &str) -> Vec<MinorPower> {
        self.boss_powers
            .get(boss_name)
            .map(|grants| {
                grants
                    .iter()
                    .map(|grant| MinorPower::new(grant.kind, grant.cooldown))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.nearby_scan_range <= 0.0 {
            return Err(EmberError::InvalidConfig(format!(
                "nearby_scan_range ({}) must be positive",
                self.nearby_scan_range
            )));
        }
        if self.landing_watch_cap == 0 {
            return Err(EmberError::InvalidConfig(
                "landing_watch_cap must be at least one tick".into(),
            ));
        }
        if self.max_chain_depth == 0 {
            return Err(EmberError::InvalidConfig(
                "max_chain_depth must be at least 1".into(),
            ));
        }
        if self.max_zone_radius <= 0.0 {
            return Err(EmberError::InvalidConfig(format!(
                "max_zone_radius ({}) must be positive",
                self.max_zone_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str("nearby_scan_range = 48.0\n").unwrap();
        assert_eq!(config.nearby_scan_range, 48.0);
        assert_eq!(config.landing_watch_cap, 6000);
        assert_eq!(config.max_chain_depth, 64);
    }

    #[test]
    fn test_boss_powers_parse_and_instantiate() {
        let config = EngineConfig::from_toml_str(
            r#"
            [[boss_powers.ember_knight]]
            kind = "arrow_volley"
            cooldown = 60

            [[boss_powers.ember_knight]]
            kind = "gravity"
            "#,
        )
        .unwrap();
        let powers = config.powers_for("ember_knight");
        assert_eq!(powers.len(), 2);
        assert_eq!(powers[0].cooldown_ticks, 60);
        assert_eq!(powers[1].cooldown_ticks, 100);
        assert!(config.powers_for("unknown").is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_toml_str("max_chain_depth = 0\n").is_err());
        assert!(EngineConfig::from_toml_str("nearby_scan_range = -1.0\n").is_err());
    }
}
