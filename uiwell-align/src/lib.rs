//! uiwell Align - Outcome Alignment
//!
//! For every included wave, finds the nearest outcomes around it and picks a
//! before/after pair from the person's employment transition across the
//! previous, current and next wave. Runs once per completed panel.

pub mod search;
pub mod select;

use serde::{Deserialize, Serialize};
use uiwell_core::{AlignedOutcome, PersonHistory, StudyConfig, TransitionPattern};

pub use search::{nearest_outcome, outcome_base_far, outcome_lag1, outcome_next, outcome_now};
pub use select::{lead_and_base, selection, Candidates, LeadBase, Selection};

/// Counts from one alignment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignStats {
    pub records: usize,
    pub stably_employed: usize,
    pub newly_unemployed: usize,
    pub newly_reemployed: usize,
    pub stably_unemployed: usize,
    pub unknown_pattern: usize,
    pub with_lead: usize,
    pub with_base: usize,
    pub rejected_leads: usize,
    pub rejected_bases: usize,
}

impl AlignStats {
    fn observe(&mut self, aligned: &AlignedOutcome, picked: &LeadBase) {
        self.records += 1;
        match aligned.pattern {
            TransitionPattern::StablyEmployed => self.stably_employed += 1,
            TransitionPattern::NewlyUnemployed => self.newly_unemployed += 1,
            TransitionPattern::NewlyReemployed => self.newly_reemployed += 1,
            TransitionPattern::StablyUnemployed => self.stably_unemployed += 1,
            TransitionPattern::Unknown => self.unknown_pattern += 1,
        }
        self.with_lead += usize::from(aligned.lead.is_some());
        self.with_base += usize::from(aligned.base.is_some());
        self.rejected_leads += usize::from(picked.lead_rejected);
        self.rejected_bases += usize::from(picked.base_rejected);
    }

    pub fn merge(&mut self, other: &AlignStats) {
        self.records += other.records;
        self.stably_employed += other.stably_employed;
        self.newly_unemployed += other.newly_unemployed;
        self.newly_reemployed += other.newly_reemployed;
        self.stably_unemployed += other.stably_unemployed;
        self.unknown_pattern += other.unknown_pattern;
        self.with_lead += other.with_lead;
        self.with_base += other.with_base;
        self.rejected_leads += other.rejected_leads;
        self.rejected_bases += other.rejected_bases;
    }
}

fn lead_at(history: &PersonHistory, year: i32) -> Option<bool> {
    history
        .wave_at_year(year)
        .and_then(|w| w.spell.unemployed_in_12mo_lead)
}

/// Alignment for the wave at `year`, with the pair actually picked.
pub fn align_record(
    history: &PersonHistory,
    year: i32,
    config: &StudyConfig,
) -> (AlignedOutcome, LeadBase) {
    let step = config.years_for_waves(1);
    let previous = lead_at(history, year - step);
    let current = lead_at(history, year);
    let following = lead_at(history, year + step);

    let now = outcome_now(history, year, config);
    let candidates = Candidates {
        now,
        next: outcome_next(history, year, config),
        base_far: outcome_base_far(history, year, now, config),
    };
    let picked = lead_and_base(selection(previous, current, following), candidates);

    let aligned = AlignedOutcome {
        now: candidates.now,
        next: candidates.next,
        base_far: candidates.base_far,
        lag1: outcome_lag1(history, year, config),
        pattern: TransitionPattern::from_leads(previous, current),
        lead: picked.lead,
        base: picked.base,
    };
    (aligned, picked)
}

/// Align every included wave of one person; other waves get `None`.
pub fn align_history(history: &mut PersonHistory, config: &StudyConfig) -> AlignStats {
    let mut stats = AlignStats::default();
    let aligned: Vec<Option<AlignedOutcome>> = history
        .waves()
        .iter()
        .map(|wave| {
            wave.wave.included.then(|| {
                let (aligned, picked) = align_record(history, wave.year, config);
                stats.observe(&aligned, &picked);
                aligned
            })
        })
        .collect();
    for (record, alignment) in history.waves_mut().iter_mut().zip(aligned) {
        record.alignment = alignment;
    }
    tracing::trace!(
        person_id = %history.person_id(),
        aligned = stats.records,
        rejected_leads = stats.rejected_leads,
        "Outcomes aligned"
    );
    stats
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use uiwell_test_utils::{arb_lead, arb_outcome, arb_wave_years, history, RecordBuilder};

    fn arb_aligned_history() -> impl Strategy<Value = PersonHistory> {
        arb_wave_years().prop_flat_map(|years| {
            let n = years.len();
            (
                Just(years),
                prop::collection::vec((arb_lead(), arb_outcome()), n),
            )
                .prop_map(|(years, waves)| {
                    let records = years
                        .into_iter()
                        .zip(waves)
                        .map(|(year, (lead, outcome))| {
                            let mut record =
                                RecordBuilder::new(1, year).lead(lead).included(true).build();
                            record.outcome = outcome;
                            record
                        })
                        .collect();
                    history(1, records)
                })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Lead never comes from before the current wave; base is always
        /// strictly before the lead.
        #[test]
        fn prop_lead_and_base_ordered(mut h in arb_aligned_history()) {
            align_history(&mut h, &StudyConfig::default());
            for record in h.waves() {
                let aligned = record.alignment.as_ref().unwrap();
                if let Some(lead) = aligned.lead {
                    prop_assert!(lead.wave_offset >= 0);
                    if let Some(base) = aligned.base {
                        prop_assert!(base.wave_offset < lead.wave_offset);
                    }
                }
                if aligned.now.is_none() {
                    prop_assert!(aligned.base_far.is_none());
                }
            }
        }
    }
}
