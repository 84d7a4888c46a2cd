//! uiwell Waves - Wave Eligibility and Inclusion
//!
//! A wave is eligible when the waves immediately before it sit exactly one and
//! two cadence steps earlier. Each person keeps only the longest run of
//! consecutive eligible waves, plus the lead-in waves before it.
//!
//! When two runs have the same length, the earlier run is kept.

use serde::{Deserialize, Serialize};
use uiwell_core::{IntegrityError, PersonHistory, Stage, StudyConfig};

// ============================================================================
// ELIGIBILITY
// ============================================================================

/// Eligibility of each wave in a sorted list of wave years.
pub fn eligibility(years: &[i32], config: &StudyConfig) -> Vec<bool> {
    let lead_in = config.lead_in_waves;
    (0..years.len())
        .map(|i| {
            i >= lead_in
                && (1..=lead_in).all(|k| {
                    years[i - k] == years[i] - config.years_for_waves(k as i32)
                })
        })
        .collect()
}

// ============================================================================
// LONGEST RUN
// ============================================================================

/// A run of consecutive eligible waves, as inclusive wave indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleRun {
    pub start: usize,
    pub end: usize,
}

impl EligibleRun {
    /// Number of eligible waves in the run.
    pub fn length(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Longest run of `true`; the first one wins ties.
pub fn longest_run(eligible: &[bool]) -> Option<EligibleRun> {
    let mut best: Option<EligibleRun> = None;
    let mut current: Option<EligibleRun> = None;
    for (i, flag) in eligible.iter().enumerate() {
        current = match (*flag, current) {
            (true, Some(run)) => Some(EligibleRun { end: i, ..run }),
            (true, None) => Some(EligibleRun { start: i, end: i }),
            (false, _) => None,
        };
        if let Some(run) = current {
            if best.map_or(true, |b| run.length() > b.length()) {
                best = Some(run);
            }
        }
    }
    best
}

/// Calendar years covered by a run and its lead-in waves.
pub fn inclusion_span(years: &[i32], run: EligibleRun, config: &StudyConfig) -> (i32, i32) {
    let lead_in = config.years_for_waves(config.lead_in_waves as i32);
    (years[run.start] - lead_in, years[run.end])
}

// ============================================================================
// SELECTION
// ============================================================================

/// Counts from one selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveStats {
    pub persons: usize,
    pub persons_included: usize,
    pub waves: usize,
    pub eligible_waves: usize,
    pub included_waves: usize,
}

impl WaveStats {
    pub fn merge(&mut self, other: &WaveStats) {
        self.persons += other.persons;
        self.persons_included += other.persons_included;
        self.waves += other.waves;
        self.eligible_waves += other.eligible_waves;
        self.included_waves += other.included_waves;
    }
}

/// Flag eligible and included waves for one person.
pub fn select_waves(
    history: &mut PersonHistory,
    config: &StudyConfig,
) -> Result<WaveStats, IntegrityError> {
    let years = history.years();
    let eligible = eligibility(&years, config);
    let run = longest_run(&eligible);
    let span = run.map(|r| inclusion_span(&years, r, config));
    let run_length = run.map_or(0, |r| r.length() as u16);

    let mut stats = WaveStats {
        persons: 1,
        waves: years.len(),
        eligible_waves: eligible.iter().filter(|e| **e).count(),
        ..WaveStats::default()
    };
    for (record, is_eligible) in history.waves_mut().iter_mut().zip(&eligible) {
        record.wave.eligible = *is_eligible;
        record.wave.longest_run_length = run_length;
        record.wave.included = span.is_some_and(|(from, to)| (from..=to).contains(&record.year));
        if record.wave.included {
            stats.included_waves += 1;
        }
    }

    if let (Some(run), Some((from, _))) = (run, span) {
        let expected = run.length() + config.lead_in_waves;
        if stats.included_waves != expected {
            return Err(IntegrityError::new(
                history.person_id(),
                from,
                Stage::WaveSelection,
                format!(
                    "included {} waves for a run of {} eligible waves",
                    stats.included_waves,
                    run.length()
                ),
            ));
        }
        stats.persons_included = 1;
    } else {
        tracing::debug!(person_id = %history.person_id(), waves = years.len(), "No eligible run");
    }
    Ok(stats)
}

// ============================================================================
// TESTS
// ============================================================================
