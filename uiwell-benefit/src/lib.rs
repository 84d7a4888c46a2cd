//! uiwell Benefit - UI Receipt Window
//!
//! For every record with a confirmed spell onset, reads the receipt months
//! recalled by the waves two and four years later, decides whether the post-onset window
//! is fully observed, and derives receipt, months and amounts. A separate pass
//! fills non-receipt for unobserved windows once state rules are joined.

pub mod amounts;
pub mod coverage;
pub mod zero;

use serde::{Deserialize, Serialize};
use uiwell_core::{
    BenefitSummary, IntegrityError, PersonHistory, PersonYearRecord, Stage, StudyConfig,
    UiReceipt, UiYearReport,
};
use uiwell_spell::{lead_wave, MonthlyTimeline};

pub use amounts::{base_period_weeks, monthly_amount, months_received};
pub use coverage::{is_coverable, receipt_at, receipt_window, UiReports, UiWindow};
pub use zero::{zero_imputation_reason, ZeroImputationReason};

// ============================================================================
// STATS
// ============================================================================

/// Counts from one benefit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BenefitStats {
    pub onsets: usize,
    pub fully_observed: usize,
    pub received: usize,
    pub not_received: usize,
    pub unresolved: usize,
}

impl BenefitStats {
    fn observe(&mut self, benefit: &BenefitSummary) {
        self.onsets += 1;
        if benefit.window_fully_observed {
            self.fully_observed += 1;
        }
        match benefit.received_in_window {
            Some(UiReceipt::Received) => self.received += 1,
            Some(UiReceipt::NotReceived | UiReceipt::ImputedNotReceived) => self.not_received += 1,
            None => self.unresolved += 1,
        }
    }

    pub fn merge(&mut self, other: &BenefitStats) {
        self.onsets += other.onsets;
        self.fully_observed += other.fully_observed;
        self.received += other.received;
        self.not_received += other.not_received;
        self.unresolved += other.unresolved;
    }
}

/// Non-receipt fills by rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZeroImputationStats {
    pub long_prior_unemployment: usize,
    pub base_wage_below_minimum: usize,
    pub base_hours_below_minimum: usize,
    pub base_weeks_below_minimum: usize,
}

impl ZeroImputationStats {
    fn observe(&mut self, reason: ZeroImputationReason) {
        match reason {
            ZeroImputationReason::LongPriorUnemployment => self.long_prior_unemployment += 1,
            ZeroImputationReason::BaseWageBelowMinimum => self.base_wage_below_minimum += 1,
            ZeroImputationReason::BaseHoursBelowMinimum => self.base_hours_below_minimum += 1,
            ZeroImputationReason::BaseWeeksBelowMinimum => self.base_weeks_below_minimum += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.long_prior_unemployment
            + self.base_wage_below_minimum
            + self.base_hours_below_minimum
            + self.base_weeks_below_minimum
    }

    pub fn merge(&mut self, other: &ZeroImputationStats) {
        self.long_prior_unemployment += other.long_prior_unemployment;
        self.base_wage_below_minimum += other.base_wage_below_minimum;
        self.base_hours_below_minimum += other.base_hours_below_minimum;
        self.base_weeks_below_minimum += other.base_weeks_below_minimum;
    }
}

// ============================================================================
// BENEFIT WINDOW
// ============================================================================

/// Benefit summaries for every wave of one person. Spells must already be
/// reconstructed.
pub fn build_benefits(
    history: &mut PersonHistory,
    config: &StudyConfig,
) -> Result<BenefitStats, IntegrityError> {
    // Reports are owned by later waves; collect them before borrowing mutably.
    let report_at = |i: usize, ahead: usize| {
        lead_wave(history.waves(), i, ahead, config).and_then(|w| w.ui_report.clone())
    };
    let reports: Vec<(Option<UiYearReport>, Option<UiYearReport>)> = (0..history.len())
        .map(|i| (report_at(i, 1), report_at(i, 2)))
        .collect();

    let mut stats = BenefitStats::default();
    for (record, (next, after_next)) in history.waves_mut().iter_mut().zip(reports) {
        let reports = UiReports::new(next.as_ref(), after_next.as_ref());
        record.benefit = benefit_for_record(record, reports, config)?;
        if record.spell.first_unemployed_offset.is_some() {
            stats.observe(&record.benefit);
        }
    }
    tracing::trace!(
        person_id = %history.person_id(),
        onsets = stats.onsets,
        fully_observed = stats.fully_observed,
        "Benefit windows built"
    );
    Ok(stats)
}

/// Benefit summary for one record given the reports of the next two waves.
/// Months and amounts come from the next wave's prior-year report.
pub fn benefit_for_record(
    record: &PersonYearRecord,
    reports: UiReports<'_>,
    config: &StudyConfig,
) -> Result<BenefitSummary, IntegrityError> {
    let Some(first) = record.spell.first_unemployed_offset else {
        return Ok(BenefitSummary::default());
    };

    let window = receipt_window(reports, first, &config.ui);
    if window.received == Some(UiReceipt::NotReceived) && !window.fully_observed {
        return Err(IntegrityError::new(
            record.person_id,
            record.year,
            Stage::BenefitWindow,
            format!("observed non-receipt for onset {first} without a fully observed window"),
        ));
    }

    let months = reports.next.and_then(months_received);
    let annual_amount = reports.next.and_then(|r| r.annual_amount);
    let base_weeks = MonthlyTimeline::new(record)
        .and_then(|timeline| base_period_weeks(&timeline, first, &config.ui));

    Ok(BenefitSummary {
        window_receipt: window.flags,
        window_fully_observed: window.fully_observed,
        received_in_window: window.received,
        months_received: months,
        annual_amount,
        monthly_amount: monthly_amount(annual_amount, months),
        base_period_weeks: base_weeks,
    })
}

/// Zero-imputation pass; run after the state context join.
pub fn impute_nonreceipt(history: &mut PersonHistory, config: &StudyConfig) -> ZeroImputationStats {
    let mut stats = ZeroImputationStats::default();
    for record in history.waves_mut() {
        if let Some(reason) = zero::apply(record, &config.ui) {
            tracing::trace!(key = %record.key(), reason = %reason, "Non-receipt imputed");
            stats.observe(reason);
        }
    }
    stats
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use uiwell_test_utils::arb_person_history;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Windows for onsets outside the coverable range are never fully
        /// observed, whatever the recall looks like.
        #[test]
        fn prop_fully_observed_only_inside_range(mut h in arb_person_history()) {
            let config = StudyConfig::default();
            if uiwell_spell::reconstruct_history(&mut h, &config).is_err() {
                return Ok(());
            }
            build_benefits(&mut h, &config).unwrap();
            for record in h.waves() {
                if let Some(first) = record.spell.first_unemployed_offset {
                    if !(7..=23).contains(&first.get()) {
                        prop_assert!(!record.benefit.window_fully_observed);
                    }
                } else {
                    prop_assert_eq!(&record.benefit, &BenefitSummary::default());
                }
            }
        }
    }
}
