//! The 12-month post-interview window: completeness, the lead indicator,
//! the first unemployed month and unemployment at interview.

use uiwell_core::{MonthFlag, MonthOffset, PersonYearRecord, StudyConfig};

use crate::timeline::MonthlyTimeline;

/// Window results for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowScan {
    pub period_incomplete: bool,
    pub unemployed_in_12mo_lead: Option<bool>,
    pub first_unemployed_offset: Option<MonthOffset>,
    pub already_unemployed_at_interview: Option<bool>,
}

/// Why a scan that should have found an onset did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingOnset;

/// Lead indicator from window flags: a known unemployed month wins over
/// incompleteness elsewhere in the window.
pub fn lead_indicator(flags: &[MonthFlag], period_incomplete: bool) -> Option<bool> {
    let unemployed_months = flags.iter().filter(|f| **f == Some(true)).count();
    if unemployed_months > 0 {
        Some(true)
    } else if period_incomplete {
        None
    } else {
        Some(false)
    }
}

/// First unemployed month in window order. An unknown month before any
/// unemployed one means the first cannot be confirmed.
pub fn first_unemployed(
    window: &[(MonthOffset, MonthFlag)],
    lead: Option<bool>,
) -> Result<Option<MonthOffset>, MissingOnset> {
    if lead != Some(true) {
        return Ok(None);
    }
    for (offset, flag) in window {
        match flag {
            Some(true) => return Ok(Some(*offset)),
            None => return Ok(None),
            Some(false) => {}
        }
    }
    Err(MissingOnset)
}

/// Steps B through D for one record whose lead flags are already built.
pub fn scan_window(
    record: &PersonYearRecord,
    config: &StudyConfig,
) -> Result<WindowScan, MissingOnset> {
    let Some(timeline) = MonthlyTimeline::new(record) else {
        return Ok(WindowScan {
            period_incomplete: true,
            ..WindowScan::default()
        });
    };

    let window = timeline.window();
    let flags: Vec<MonthFlag> = window.iter().map(|(_, flag)| *flag).collect();
    let period_incomplete =
        record.year < config.monthly_recall_start_year || flags.iter().any(Option::is_none);
    let lead = lead_indicator(&flags, period_incomplete);
    let first = first_unemployed(&window, lead)?;
    let already = timeline.flag(timeline.calendar().month_before_interview());

    Ok(WindowScan {
        period_incomplete,
        unemployed_in_12mo_lead: lead,
        first_unemployed_offset: first,
        already_unemployed_at_interview: already,
    })
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use uiwell_test_utils::arb_month_flag;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Re-deriving the lead indicator from the same flags and
        /// completeness flag reproduces the scanned value.
        #[test]
        fn prop_lead_indicator_idempotent(
            month in 1u8..=12,
            flags in prop::collection::vec(arb_month_flag(), 12),
        ) {
            let record = uiwell_test_utils::RecordBuilder::new(1, 2005)
                .interview_month(month)
                .window_flags(&flags)
                .build();
            let scan = scan_window(&record, &StudyConfig::default());
            prop_assert!(scan.is_ok());
            let scan = scan.unwrap_or_default();
            let timeline = MonthlyTimeline::new(&record).unwrap();
            let rederived: Vec<MonthFlag> = timeline.window().iter().map(|(_, f)| *f).collect();
            prop_assert_eq!(rederived.as_slice(), flags.as_slice());
            prop_assert_eq!(
                lead_indicator(&rederived, scan.period_incomplete),
                scan.unemployed_in_12mo_lead
            );
        }

        /// A confirmed onset is always inside the window and flagged unemployed.
        #[test]
        fn prop_onset_inside_window(
            month in 1u8..=12,
            flags in prop::collection::vec(arb_month_flag(), 12),
        ) {
            let record = uiwell_test_utils::RecordBuilder::new(1, 2005)
                .interview_month(month)
                .window_flags(&flags)
                .build();
            let scan = scan_window(&record, &StudyConfig::default()).unwrap_or_default();
            if let Some(first) = scan.first_unemployed_offset {
                let timeline = MonthlyTimeline::new(&record).unwrap();
                prop_assert!(timeline.calendar().in_window(first));
                prop_assert_eq!(timeline.flag(first), Some(true));
                prop_assert!((1..=23).contains(&first.get()));
            }
        }
    }
}
