//! Merged monthly timeline for one record.
//!
//! Offsets before the interview month read the record's own recall codes;
//! the interview month and later read the lead flags built from later waves.

use uiwell_core::{
    InterviewCalendar, MonthFlag, MonthOffset, PersonYearRecord, LEAD_WINDOW_MONTHS,
};

#[derive(Debug, Clone, Copy)]
pub struct MonthlyTimeline<'a> {
    record: &'a PersonYearRecord,
    calendar: &'static InterviewCalendar,
}

impl<'a> MonthlyTimeline<'a> {
    /// `None` when the interview month is unknown.
    pub fn new(record: &'a PersonYearRecord) -> Option<Self> {
        let calendar = record.interview_month?.calendar();
        Some(Self { record, calendar })
    }

    pub fn calendar(&self) -> &'static InterviewCalendar {
        self.calendar
    }

    pub fn flag(&self, offset: MonthOffset) -> MonthFlag {
        if offset < self.calendar.interview_offset() {
            self.record.employment.unemployed_at(offset)
        } else {
            self.record.lead_flags.at(offset)
        }
    }

    /// The 12-month lead window in scan order.
    pub fn window(&self) -> [(MonthOffset, MonthFlag); LEAD_WINDOW_MONTHS] {
        let window = *self.calendar.lead_window();
        window.map(|offset| (offset, self.flag(offset)))
    }

    /// Own-record flags from the month before interview backward.
    pub fn lookback(&self) -> impl Iterator<Item = MonthFlag> + '_ {
        self.calendar
            .lookback()
            .iter()
            .map(|offset| self.record.employment.unemployed_at(*offset))
    }

    /// Flags from `start` through the end of the lead blocks.
    pub fn forward(&self, start: MonthOffset) -> impl Iterator<Item = MonthFlag> + '_ {
        self.calendar
            .forward_from(start)
            .map(|offset| self.flag(offset))
    }

    /// Flags for `months` consecutive offsets ending just before `end`.
    pub fn preceding(&self, end: MonthOffset, months: i16) -> Vec<MonthFlag> {
        (end.get() - months..end.get())
            .map(|raw| self.flag(MonthOffset::new(raw)))
            .collect()
    }
}
