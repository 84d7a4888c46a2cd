//! Which onsets the biennial UI recall can cover, and the receipt window.
//!
//! A record's UI months come from the waves after it. The wave one step ahead
//! recalls offsets 1..=12 (two-years-prior block, when collected) and 13..=24
//! (prior year); the wave two steps ahead does the same for 25..=36 and
//! 37..=48. Nothing else is observed.

use uiwell_core::{MonthFlag, MonthOffset, UiReceipt, UiWindowConfig, UiYearReport};

/// Reports from the waves one and two cadence steps after a record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UiReports<'a> {
    pub next: Option<&'a UiYearReport>,
    pub after_next: Option<&'a UiYearReport>,
}

impl<'a> UiReports<'a> {
    pub fn new(next: Option<&'a UiYearReport>, after_next: Option<&'a UiYearReport>) -> Self {
        Self { next, after_next }
    }

    fn ahead(&self, waves_ahead: u8) -> Option<&'a UiYearReport> {
        match waves_ahead {
            1 => self.next,
            2 => self.after_next,
            _ => None,
        }
    }
}

/// Receipt flag at an offset of the record's frame.
pub fn receipt_at(reports: UiReports<'_>, offset: MonthOffset) -> MonthFlag {
    let (block, month) = offset.lead_slot()?;
    let source = block.source();
    reports
        .ahead(source.waves_ahead)?
        .receipt_for(source.block, month)
}

/// Onsets whose whole window can be observed at all.
pub fn is_coverable(first: MonthOffset, config: &UiWindowConfig) -> bool {
    (config.min_onset..=config.max_onset).contains(&first.get())
}

/// Receipt over the months after onset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiWindow {
    pub flags: Vec<MonthFlag>,
    pub fully_observed: bool,
    pub received: Option<UiReceipt>,
}

/// Window of `config.window_months` months starting the month after onset.
pub fn receipt_window(
    reports: UiReports<'_>,
    first: MonthOffset,
    config: &UiWindowConfig,
) -> UiWindow {
    let flags: Vec<MonthFlag> = (1..=i16::from(config.window_months))
        .map(|k| receipt_at(reports, first.shifted(k)))
        .collect();
    let fully_observed = is_coverable(first, config) && flags.iter().all(Option::is_some);
    let received = if flags.iter().any(|f| *f == Some(true)) {
        Some(UiReceipt::Received)
    } else if !fully_observed {
        None
    } else {
        Some(UiReceipt::NotReceived)
    };
    UiWindow {
        flags,
        fully_observed,
        received,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_core::StudyConfig;

    fn config() -> UiWindowConfig {
        StudyConfig::default().ui
    }

    fn next_only(r: &UiYearReport) -> UiReports<'_> {
        UiReports::new(Some(r), None)
    }

    fn report(prior: [MonthFlag; 12], two_prior: Option<[MonthFlag; 12]>) -> UiYearReport {
        UiYearReport {
            receipt: prior,
            annual_amount: None,
            receipt_two_years_prior: two_prior,
        }
    }

    #[test]
    fn test_receipt_offsets_map_to_blocks() {
        let mut prior = [Some(false); 12];
        prior[1] = Some(true);
        let mut two = [Some(false); 12];
        two[11] = Some(true);
        let r = report(prior, Some(two));
        let reports = next_only(&r);
        assert_eq!(receipt_at(reports, MonthOffset::new(14)), Some(true));
        assert_eq!(receipt_at(reports, MonthOffset::new(12)), Some(true));
        assert_eq!(receipt_at(reports, MonthOffset::new(25)), None);
        assert_eq!(receipt_at(reports, MonthOffset::new(0)), None);
    }

    #[test]
    fn test_later_offsets_read_the_wave_after_next() {
        let mut prior = [Some(false); 12];
        prior[11] = Some(true);
        let mut two = [Some(false); 12];
        two[0] = Some(true);
        let later = report(prior, Some(two));
        let next = report([Some(false); 12], Some([Some(false); 12]));
        let reports = UiReports::new(Some(&next), Some(&later));
        assert_eq!(receipt_at(reports, MonthOffset::new(24)), Some(false));
        assert_eq!(receipt_at(reports, MonthOffset::new(25)), Some(true));
        assert_eq!(receipt_at(reports, MonthOffset::new(48)), Some(true));
        assert_eq!(receipt_at(reports, MonthOffset::new(49)), None);
    }

    #[test]
    fn test_late_onset_window_spans_both_reports() {
        let quiet = report([Some(false); 12], Some([Some(false); 12]));
        for first in [21, 23] {
            let w = receipt_window(
                UiReports::new(Some(&quiet), Some(&quiet)),
                MonthOffset::new(first),
                &config(),
            );
            assert!(w.flags.iter().all(Option::is_some), "onset {first}");
            assert!(w.fully_observed, "onset {first}");
            assert_eq!(w.received, Some(UiReceipt::NotReceived));

            let w = receipt_window(next_only(&quiet), MonthOffset::new(first), &config());
            assert!(!w.fully_observed, "onset {first}");
            assert_eq!(w.received, None);
        }
    }

    #[test]
    fn test_window_inside_range_fully_observed() {
        let mut prior = [Some(false); 12];
        prior[3] = Some(true); // offset 16
        let r = report(prior, Some([Some(false); 12]));
        let w = receipt_window(next_only(&r), MonthOffset::new(10), &config());
        assert_eq!(w.flags.len(), 6);
        assert!(w.fully_observed);
        assert_eq!(w.received, Some(UiReceipt::Received));

        let quiet = report([Some(false); 12], Some([Some(false); 12]));
        let w = receipt_window(next_only(&quiet), MonthOffset::new(10), &config());
        assert_eq!(w.received, Some(UiReceipt::NotReceived));
    }

    #[test]
    fn test_unknown_month_leaves_receipt_open() {
        let mut prior = [Some(false); 12];
        prior[0] = None; // offset 13
        let r = report(prior, Some([Some(false); 12]));
        let w = receipt_window(next_only(&r), MonthOffset::new(8), &config());
        assert!(!w.fully_observed);
        assert_eq!(w.received, None);
    }

    #[test]
    fn test_scenario_onset_25_never_fully_observed() {
        let r = report([Some(false); 12], Some([Some(false); 12]));
        let w = receipt_window(next_only(&r), MonthOffset::new(25), &config());
        assert!(!w.fully_observed);
        assert_eq!(w.received, None);
    }

    #[test]
    fn test_early_onset_not_fully_observed_even_when_known() {
        let r = report([Some(false); 12], Some([Some(false); 12]));
        let w = receipt_window(next_only(&r), MonthOffset::new(3), &config());
        assert!(w.flags.iter().all(Option::is_some));
        assert!(!w.fully_observed);
        assert_eq!(w.received, None);
    }

    #[test]
    fn test_positive_receipt_counts_outside_range() {
        let mut two = [Some(false); 12];
        two[4] = Some(true); // offset 5
        let r = report([Some(false); 12], Some(two));
        let w = receipt_window(next_only(&r), MonthOffset::new(3), &config());
        assert_eq!(w.received, Some(UiReceipt::Received));
    }

    #[test]
    fn test_missing_report_is_unobserved() {
        let w = receipt_window(UiReports::default(), MonthOffset::new(10), &config());
        assert!(w.flags.iter().all(Option::is_none));
        assert!(!w.fully_observed);
        assert_eq!(w.received, None);
    }
}
