//! Month-index calendar for the three-wave study frame.
//!
//! Offsets are absolute within the interview year: offset 1 is January of the
//! interview year, 13 is January of the following year, and the lead blocks
//! continue through `t3` (offsets 37..=48). The interviewed record's own recall
//! blocks sit at or below the interview month: December of the prior year is
//! offset 0 and January two years prior is offset -23.
//!
//! ```text
//! recall:  t-2 [-23..-12]  t-1 [-11..0]  t0 [1..M-1]
//! lead:                                  t0 [M..12]  t1 [13..24]  t2 [25..36]  t3 [37..48]
//! window (12-month lead):                   [M .. M+11]
//! ```
//!
//! Every interview month gets its own precomputed [`InterviewCalendar`] holding
//! the window order and the look-back order; these are the only place month
//! arithmetic happens.

use chrono::Month;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidMonth;

/// Months in one calendar block.
pub const MONTHS_PER_BLOCK: i16 = 12;

/// Last offset covered by the `t3` lead block.
pub const LAST_LEAD_OFFSET: i16 = 48;

/// First offset covered by the own record's `t-2` recall block.
pub const FIRST_RECALL_OFFSET: i16 = -23;

/// Length of the post-interview unemployment window.
pub const LEAD_WINDOW_MONTHS: usize = 12;

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Month for a zero-based index, wrapping.
pub fn month_from_index(index: i16) -> Month {
    MONTHS[index.rem_euclid(MONTHS_PER_BLOCK) as usize]
}

/// Zero-based index of a month.
pub fn month_index(month: Month) -> usize {
    month.number_from_month() as usize - 1
}

/// All months in calendar order.
pub fn all_months() -> impl Iterator<Item = Month> {
    MONTHS.into_iter()
}

// ============================================================================
// BLOCKS
// ============================================================================

/// Recall block reported by a record about its own past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecallBlock {
    /// Calendar year two years before the interview year (`t-2`).
    TwoYearsPrior,
    /// Calendar year before the interview year (`t-1`).
    PriorYear,
    /// Interview year up to the interview (`t0`).
    InterviewYear,
}

impl RecallBlock {
    pub const ALL: [RecallBlock; 3] = [
        RecallBlock::TwoYearsPrior,
        RecallBlock::PriorYear,
        RecallBlock::InterviewYear,
    ];

    pub fn index(self) -> usize {
        match self {
            RecallBlock::TwoYearsPrior => 0,
            RecallBlock::PriorYear => 1,
            RecallBlock::InterviewYear => 2,
        }
    }

    /// Calendar years relative to the interview year.
    pub fn year_offset(self) -> i16 {
        match self {
            RecallBlock::TwoYearsPrior => -2,
            RecallBlock::PriorYear => -1,
            RecallBlock::InterviewYear => 0,
        }
    }
}

/// Calendar year after the interview whose months come from a later wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadBlock {
    T0,
    T1,
    T2,
    T3,
}

/// Where a lead block is read from: the wave `waves_ahead` cadence steps later,
/// in that wave's `block` recall codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadSource {
    pub waves_ahead: u8,
    pub block: RecallBlock,
}

impl LeadBlock {
    pub const ALL: [LeadBlock; 4] = [LeadBlock::T0, LeadBlock::T1, LeadBlock::T2, LeadBlock::T3];

    pub fn index(self) -> usize {
        match self {
            LeadBlock::T0 => 0,
            LeadBlock::T1 => 1,
            LeadBlock::T2 => 2,
            LeadBlock::T3 => 3,
        }
    }

    pub fn year_offset(self) -> i16 {
        self.index() as i16
    }

    /// The wave two years ahead recalls `t0` as its two-years-prior block and
    /// `t1` as its prior year; the wave four years ahead does the same for
    /// `t2` and `t3`.
    pub fn source(self) -> LeadSource {
        match self {
            LeadBlock::T0 => LeadSource {
                waves_ahead: 1,
                block: RecallBlock::TwoYearsPrior,
            },
            LeadBlock::T1 => LeadSource {
                waves_ahead: 1,
                block: RecallBlock::PriorYear,
            },
            LeadBlock::T2 => LeadSource {
                waves_ahead: 2,
                block: RecallBlock::TwoYearsPrior,
            },
            LeadBlock::T3 => LeadSource {
                waves_ahead: 2,
                block: RecallBlock::PriorYear,
            },
        }
    }
}

// ============================================================================
// OFFSETS
// ============================================================================

/// Position of a month in the study frame (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthOffset(i16);

impl MonthOffset {
    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i16 {
        self.0
    }

    pub fn of_lead(block: LeadBlock, month: Month) -> Self {
        Self(block.year_offset() * MONTHS_PER_BLOCK + month.number_from_month() as i16)
    }

    pub fn of_recall(block: RecallBlock, month: Month) -> Self {
        Self(block.year_offset() * MONTHS_PER_BLOCK + month.number_from_month() as i16)
    }

    /// Calendar years after the interview year (negative for recall years).
    pub fn year_offset(self) -> i16 {
        (self.0 - 1).div_euclid(MONTHS_PER_BLOCK)
    }

    pub fn month(self) -> Month {
        month_from_index(self.0 - 1)
    }

    /// Inverse of [`MonthOffset::of_lead`]; `None` outside 1..=48.
    pub fn lead_slot(self) -> Option<(LeadBlock, Month)> {
        if !(1..=LAST_LEAD_OFFSET).contains(&self.0) {
            return None;
        }
        let block = LeadBlock::ALL[self.year_offset() as usize];
        Some((block, self.month()))
    }

    /// Inverse of [`MonthOffset::of_recall`]; `None` outside -23..=12.
    pub fn recall_slot(self) -> Option<(RecallBlock, Month)> {
        if !(FIRST_RECALL_OFFSET..=MONTHS_PER_BLOCK).contains(&self.0) {
            return None;
        }
        let block = RecallBlock::ALL[(self.year_offset() + 2) as usize];
        Some((block, self.month()))
    }

    pub fn shifted(self, months: i16) -> Self {
        Self(self.0 + months)
    }

    /// Calendar year and month for an interview year.
    pub fn calendar_month(self, interview_year: i32) -> (i32, Month) {
        (interview_year + self.year_offset() as i32, self.month())
    }
}

impl fmt::Display for MonthOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// INTERVIEW MONTH
// ============================================================================

/// Interview month, 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct InterviewMonth(u8);

impl InterviewMonth {
    pub fn new(month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn month(self) -> Month {
        month_from_index(self.0 as i16 - 1)
    }

    pub fn offset(self) -> MonthOffset {
        MonthOffset(self.0 as i16)
    }

    pub fn calendar(self) -> &'static InterviewCalendar {
        InterviewCalendar::for_month(self)
    }
}

impl TryFrom<u8> for InterviewMonth {
    type Error = InvalidMonth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidMonth(value))
    }
}

impl From<InterviewMonth> for u8 {
    fn from(month: InterviewMonth) -> Self {
        month.0
    }
}

impl From<Month> for InterviewMonth {
    fn from(month: Month) -> Self {
        Self(month.number_from_month() as u8)
    }
}

// ============================================================================
// INTERVIEW CALENDAR
// ============================================================================

/// Offsets in scan order for one interview month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewCalendar {
    month: InterviewMonth,
    window: [MonthOffset; LEAD_WINDOW_MONTHS],
    lookback: Vec<MonthOffset>,
}

static CALENDARS: Lazy<Vec<InterviewCalendar>> = Lazy::new(|| {
    (1..=12)
        .filter_map(InterviewMonth::new)
        .map(InterviewCalendar::build)
        .collect()
});

impl InterviewCalendar {
    fn build(month: InterviewMonth) -> Self {
        let start = month.offset().get();
        let mut window = [MonthOffset(start); LEAD_WINDOW_MONTHS];
        for (i, slot) in window.iter_mut().enumerate() {
            *slot = MonthOffset(start + i as i16);
        }
        let lookback = (FIRST_RECALL_OFFSET..start).rev().map(MonthOffset).collect();
        Self {
            month,
            window,
            lookback,
        }
    }

    pub fn for_month(month: InterviewMonth) -> &'static InterviewCalendar {
        &CALENDARS[month.number() as usize - 1]
    }

    pub fn interview_month(&self) -> InterviewMonth {
        self.month
    }

    pub fn interview_offset(&self) -> MonthOffset {
        self.month.offset()
    }

    /// The 12-month lead window, starting at the interview month.
    pub fn lead_window(&self) -> &[MonthOffset; LEAD_WINDOW_MONTHS] {
        &self.window
    }

    /// 1-based position of an offset inside the lead window.
    pub fn window_position(&self, offset: MonthOffset) -> Option<usize> {
        let delta = offset.get() - self.interview_offset().get();
        (0..LEAD_WINDOW_MONTHS as i16)
            .contains(&delta)
            .then_some(delta as usize + 1)
    }

    pub fn in_window(&self, offset: MonthOffset) -> bool {
        self.window_position(offset).is_some()
    }

    /// Lead block and month name for each window position, in scan order.
    pub fn window_slots(&self) -> [(LeadBlock, Month); LEAD_WINDOW_MONTHS] {
        self.window.map(|offset| {
            // Window offsets stay within 1..=23.
            let block = LeadBlock::ALL[offset.year_offset() as usize];
            (block, offset.month())
        })
    }

    /// The month immediately preceding the interview.
    pub fn month_before_interview(&self) -> MonthOffset {
        self.interview_offset().shifted(-1)
    }

    /// Own-record offsets walking backward from the month before interview.
    pub fn lookback(&self) -> &[MonthOffset] {
        &self.lookback
    }

    /// Saturation value for a fully censored pre-interview walk (24..=35).
    pub fn lookback_ceiling(&self) -> u16 {
        self.lookback.len() as u16
    }

    /// Offsets from `start` through the end of `t3`.
    pub fn forward_from(&self, start: MonthOffset) -> impl Iterator<Item = MonthOffset> {
        (start.get().max(self.interview_offset().get())..=LAST_LEAD_OFFSET).map(MonthOffset)
    }

    /// Saturation value for a fully censored post-interview walk from `start`.
    pub fn forward_ceiling(&self, start: MonthOffset) -> u16 {
        self.forward_from(start).count() as u16
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every window offset lies in 1..=23 and maps back to a lead slot.
        #[test]
        fn prop_window_offsets_in_range(m in 1u8..=12) {
            let cal = InterviewMonth::new(m).unwrap().calendar();
            for (i, offset) in cal.lead_window().iter().enumerate() {
                prop_assert!((1..=23).contains(&offset.get()));
                prop_assert_eq!(cal.window_position(*offset), Some(i + 1));
                prop_assert!(offset.lead_slot().is_some());
            }
        }

        /// Offset arithmetic is total and invertible across the frame.
        #[test]
        fn prop_offset_roundtrip(raw in FIRST_RECALL_OFFSET..=LAST_LEAD_OFFSET) {
            let offset = MonthOffset::new(raw);
            if let Some((block, month)) = offset.lead_slot() {
                prop_assert_eq!(MonthOffset::of_lead(block, month), offset);
            }
            if let Some((block, month)) = offset.recall_slot() {
                prop_assert_eq!(MonthOffset::of_recall(block, month), offset);
            }
        }
    }
}
