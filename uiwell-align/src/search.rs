//! Nearest non-missing outcome lookups by wave offset.
//!
//! Offsets are cadence steps: the wave `k` steps away is the record at
//! `year + k * cadence`. A missing record at that year is skipped like a
//! missing outcome.

use uiwell_core::{PersonHistory, SourcedOutcome, StudyConfig};

/// First offset in `steps` whose wave has an outcome.
pub fn nearest_outcome(
    history: &PersonHistory,
    year: i32,
    steps: impl IntoIterator<Item = i16>,
    config: &StudyConfig,
) -> Option<SourcedOutcome> {
    steps.into_iter().find_map(|k| {
        let wave = history.wave_at_year(year + config.years_for_waves(i32::from(k)))?;
        wave.outcome.map(|value| SourcedOutcome {
            value,
            wave_offset: k,
        })
    })
}

/// Own outcome, else the nearest earlier one within the outcome search.
pub fn outcome_now(history: &PersonHistory, year: i32, config: &StudyConfig) -> Option<SourcedOutcome> {
    let depth = i16::from(config.alignment.outcome_search_waves);
    nearest_outcome(history, year, (0..=depth).map(|k| -k), config)
}

/// Nearest later outcome within the outcome search.
pub fn outcome_next(history: &PersonHistory, year: i32, config: &StudyConfig) -> Option<SourcedOutcome> {
    let depth = i16::from(config.alignment.outcome_search_waves);
    nearest_outcome(history, year, 1..=depth, config)
}

/// Nearest outcome strictly before `now`'s source wave, searched up to the
/// base depth back from the current wave.
pub fn outcome_base_far(
    history: &PersonHistory,
    year: i32,
    now: Option<SourcedOutcome>,
    config: &StudyConfig,
) -> Option<SourcedOutcome> {
    let now = now?;
    let depth = i16::from(config.alignment.base_search_waves);
    let from = 1 - now.wave_offset;
    nearest_outcome(history, year, (from..=depth).map(|k| -k), config)
}

/// Raw outcome of the wave exactly one step back.
pub fn outcome_lag1(history: &PersonHistory, year: i32, config: &StudyConfig) -> Option<f64> {
    history
        .wave_at_year(year - config.years_for_waves(1))
        .and_then(|w| w.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_test_utils::{history, RecordBuilder};

    fn config() -> StudyConfig {
        StudyConfig::default()
    }

    /// Outcomes at 2001 and 2009 only, with waves every two years.
    fn sparse() -> PersonHistory {
        history(
            1,
            vec![
                RecordBuilder::new(1, 2001).outcome(3.0).build(),
                RecordBuilder::new(1, 2003).build(),
                RecordBuilder::new(1, 2005).build(),
                RecordBuilder::new(1, 2007).build(),
                RecordBuilder::new(1, 2009).outcome(6.0).build(),
            ],
        )
    }

    #[test]
    fn test_now_falls_back_to_earlier_wave() {
        let h = sparse();
        let now = outcome_now(&h, 2005, &config()).unwrap();
        assert_eq!(now.value, 3.0);
        assert_eq!(now.wave_offset, -2);
        let own = outcome_now(&h, 2009, &config()).unwrap();
        assert_eq!(own.wave_offset, 0);
    }

    #[test]
    fn test_next_searches_forward() {
        let h = sparse();
        let next = outcome_next(&h, 2003, &config()).unwrap();
        assert_eq!(next.value, 6.0);
        assert_eq!(next.wave_offset, 3);
        assert_eq!(outcome_next(&h, 2009, &config()), None);
    }

    #[test]
    fn test_base_far_strictly_before_now() {
        let h = sparse();
        let now = outcome_now(&h, 2009, &config());
        let base = outcome_base_far(&h, 2009, now, &config()).unwrap();
        assert_eq!(base.value, 3.0);
        assert_eq!(base.wave_offset, -4);

        // `now` already comes from 2001; nothing is earlier.
        let now = outcome_now(&h, 2005, &config());
        assert_eq!(outcome_base_far(&h, 2005, now, &config()), None);
        assert_eq!(outcome_base_far(&h, 2005, None, &config()), None);
    }

    #[test]
    fn test_search_depth_is_bounded() {
        let mut c = config();
        c.alignment.outcome_search_waves = 1;
        let h = sparse();
        assert_eq!(outcome_now(&h, 2005, &c), None);
        assert_eq!(outcome_next(&h, 2005, &c), None);
    }

    #[test]
    fn test_gap_years_are_skipped() {
        let h = history(
            1,
            vec![
                RecordBuilder::new(1, 2001).outcome(1.0).build(),
                RecordBuilder::new(1, 2007).build(),
            ],
        );
        let now = outcome_now(&h, 2007, &config()).unwrap();
        assert_eq!(now.wave_offset, -3);
        assert_eq!(outcome_lag1(&h, 2007, &config()), None);
    }
}
