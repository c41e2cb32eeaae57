use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    AMBUSH_LEAD_CELLS, CHASE_TICKS, EATEN_EXIT_DELAY, ENGAGE_RADIUS, GHOST_BASE_SCORE,
    HOUSE_EXIT_DELAYS, PELLET_SCORE, POWER_DURATION_TICKS, POWER_PELLET_SCORE, SCATTER_TICKS,
    STARTING_LIVES,
};
use crate::error::ConfigurationError;

/// Tunable rules. Every field defaults to the canonical constant, so a TOML
/// file only needs to list what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub lives: u32,
    pub pellet_score: u32,
    pub power_pellet_score: u32,
    pub ghost_base_score: u32,
    pub power_duration_ticks: u32,
    pub scatter_ticks: u32,
    pub chase_ticks: u32,
    pub house_exit_delays: [u32; 4],
    pub eaten_exit_delay: u32,
    pub ambush_lead_cells: i32,
    pub engage_radius: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lives: STARTING_LIVES,
            pellet_score: PELLET_SCORE,
            power_pellet_score: POWER_PELLET_SCORE,
            ghost_base_score: GHOST_BASE_SCORE,
            power_duration_ticks: POWER_DURATION_TICKS,
            scatter_ticks: SCATTER_TICKS,
            chase_ticks: CHASE_TICKS,
            house_exit_delays: HOUSE_EXIT_DELAYS,
            eaten_exit_delay: EATEN_EXIT_DELAY,
            ambush_lead_cells: AMBUSH_LEAD_CELLS,
            engage_radius: ENGAGE_RADIUS,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.lives == 0 {
            return Err(ConfigurationError::InvalidValue(
                "lives must be at least 1".to_string(),
            ));
        }
        if self.power_duration_ticks == 0 || self.scatter_ticks == 0 || self.chase_ticks == 0 {
            return Err(ConfigurationError::InvalidValue(
                "phase and power durations must be non-zero".to_string(),
            ));
        }
        if self.ambush_lead_cells < 0 || self.engage_radius < 0 {
            return Err(ConfigurationError::InvalidValue(
                "targeting distances must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml("").expect("empty config is valid");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.house_exit_delays, [0, 30, 60, 90]);
    }

    #[test]
    fn partial_toml_overrides_listed_fields() {
        let config = EngineConfig::from_toml("lives = 5\npower_duration_ticks = 40\n")
            .expect("valid overrides");
        assert_eq!(config.lives, 5);
        assert_eq!(config.power_duration_ticks, 40);
        assert_eq!(config.scatter_ticks, SCATTER_TICKS);
    }

    #[test]
    fn zero_lives_is_rejected() {
        let err = EngineConfig::from_toml("lives = 0").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue(_)));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = EngineConfig::from_toml("speed = 3").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        match err {
            ConfigurationError::Io { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here.toml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
