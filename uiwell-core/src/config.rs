//! Study configuration
//!
//! Every constant of the sampling design lives here. `Default` reproduces the
//! values of the reference study.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "UIWELL_CONFIG";

/// Recall covers the two calendar years before an interview, so lead blocks
/// line up with later waves only at this cadence.
pub const RECALL_CADENCE_YEARS: i32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// First wave year whose monthly recall is usable for the 12-month window.
    pub monthly_recall_start_year: i32,
    /// Years between consecutive waves.
    pub wave_cadence_years: i32,
    /// Waves preceding an eligible wave that must be present.
    pub lead_in_waves: usize,
    pub ui: UiWindowConfig,
    pub alignment: AlignmentConfig,
}

/// UI observation window and disqualification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiWindowConfig {
    pub window_months: u8,
    /// Earliest onset offset whose window the UI recall can cover.
    pub min_onset: i16,
    /// Latest onset offset whose window the UI recall can cover.
    pub max_onset: i16,
    /// Prior unemployment beyond this many months disqualifies receipt.
    pub max_prior_unemployment_months: u16,
    /// Weeks per month used to derive base-period weeks.
    pub weeks_per_month: f64,
}

/// Outcome search depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignmentConfig {
    pub outcome_search_waves: u8,
    pub base_search_waves: u8,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            monthly_recall_start_year: 2001,
            wave_cadence_years: 2,
            lead_in_waves: 2,
            ui: UiWindowConfig {
                window_months: 6,
                min_onset: 7,
                max_onset: 23,
                max_prior_unemployment_months: 7,
                weeks_per_month: 52.0 / 12.0,
            },
            alignment: AlignmentConfig {
                outcome_search_waves: 8,
                base_search_waves: 16,
            },
        }
    }
}

impl StudyConfig {
    /// Load from `UIWELL_CONFIG` if set, otherwise defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_path(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StudyConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates:
    /// - cadence matches the two-year recall and lead-in is positive
    /// - the UI window fits inside the lead blocks
    /// - the base search reaches past the outcome search
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wave_cadence_years != RECALL_CADENCE_YEARS {
            return Err(invalid(
                "wave_cadence_years",
                self.wave_cadence_years,
                "lead blocks are read from two-year recall; only 2 is supported",
            ));
        }
        if self.lead_in_waves == 0 {
            return Err(invalid("lead_in_waves", self.lead_in_waves, "must be greater than 0"));
        }
        if self.ui.window_months == 0 || self.ui.window_months > 12 {
            return Err(invalid(
                "ui.window_months",
                self.ui.window_months,
                "must be between 1 and 12",
            ));
        }
        if self.ui.min_onset < 1 || self.ui.min_onset > self.ui.max_onset {
            return Err(invalid(
                "ui.min_onset",
                self.ui.min_onset,
                "must be at least 1 and not above ui.max_onset",
            ));
        }
        if self.ui.max_onset + self.ui.window_months as i16 > crate::LAST_LEAD_OFFSET {
            return Err(invalid(
                "ui.max_onset",
                self.ui.max_onset,
                "window would extend past the last lead block",
            ));
        }
        if self.ui.weeks_per_month <= 0.0 {
            return Err(invalid(
                "ui.weeks_per_month",
                self.ui.weeks_per_month,
                "must be positive",
            ));
        }
        if self.alignment.outcome_search_waves == 0 {
            return Err(invalid(
                "alignment.outcome_search_waves",
                self.alignment.outcome_search_waves,
                "must be greater than 0",
            ));
        }
        if self.alignment.base_search_waves < self.alignment.outcome_search_waves {
            return Err(invalid(
                "alignment.base_search_waves",
                self.alignment.base_search_waves,
                "must be at least alignment.outcome_search_waves",
            ));
        }
        Ok(())
    }

    /// Year offset of a wave `waves` cadence steps away.
    pub fn years_for_waves(&self, waves: i32) -> i32 {
        waves * self.wave_cadence_years
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
monthly_recall_start_year = 2001
wave_cadence_years = 2
lead_in_waves = 2

[ui]
window_months = 6
min_onset = 7
max_onset = 23
max_prior_unemployment_months = 7
weeks_per_month = 4.333

[alignment]
outcome_search_waves = 8
base_search_waves = 16
"#;

    #[test]
    fn test_default_is_valid() {
        assert!(StudyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = StudyConfig::from_toml_str(FULL_TOML).unwrap();
        assert_eq!(config.ui.min_onset, 7);
        assert_eq!(config.alignment.base_search_waves, 16);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = FULL_TOML.replace("lead_in_waves = 2", "lead_in_waves = 2\nextra = 1");
        assert!(matches!(
            StudyConfig::from_toml_str(&toml),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_window_past_last_block_rejected() {
        let mut config = StudyConfig::default();
        config.ui.max_onset = 45;
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "ui.max_onset"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_annual_and_triennial_cadence_rejected() {
        for cadence in [1, 3] {
            let mut config = StudyConfig::default();
            config.wave_cadence_years = cadence;
            match config.validate() {
                Err(ConfigError::InvalidValue { field, value, .. }) => {
                    assert_eq!(field, "wave_cadence_years");
                    assert_eq!(value, cadence.to_string());
                }
                other => panic!("expected InvalidValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_base_search_shorter_than_outcome_search_rejected() {
        let mut config = StudyConfig::default();
        config.alignment.base_search_waves = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = StudyConfig::from_path(Path::new("/nonexistent/uiwell.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any cadence other than the recall span is rejected on that field.
        #[test]
        fn prop_config_rejects_other_cadences(
            cadence in any::<i32>().prop_filter("recall cadence", |c| *c != RECALL_CADENCE_YEARS)
        ) {
            let mut config = StudyConfig::default();
            config.wave_cadence_years = cadence;
            match config.validate() {
                Err(ConfigError::InvalidValue { field, .. }) => {
                    prop_assert_eq!(field, "wave_cadence_years")
                }
                other => prop_assert!(false, "Expected InvalidValue, got {:?}", other),
            }
        }
    }
}
