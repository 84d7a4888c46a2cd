//! Reference-period resolution.
//!
//! A record is anchored on its spell onset when one is confirmed, otherwise on
//! its interview month. The anchor offset is turned into a calendar month of
//! the interview year frame, then into a half-year for state UI rules and a
//! quarter for macro indicators.

use uiwell_core::{
    Half, HalfYear, Month, MonthOffset, PersonYearRecord, Quarter, ReferenceAnchor, YearQuarter,
};

/// Anchor kind and offset; `None` without an interview month.
pub fn reference_anchor(record: &PersonYearRecord) -> Option<(ReferenceAnchor, MonthOffset)> {
    let interview = record.interview_month?;
    Some(match record.spell.first_unemployed_offset {
        Some(first) => (ReferenceAnchor::SpellOnset, first),
        None => (ReferenceAnchor::InterviewMonth, interview.offset()),
    })
}

pub fn half_of(month: Month) -> Half {
    if month.number_from_month() <= 6 {
        Half::First
    } else {
        Half::Second
    }
}

pub fn quarter_of(month: Month) -> Quarter {
    match (month.number_from_month() + 2) / 3 {
        1 => Quarter::Q1,
        2 => Quarter::Q2,
        3 => Quarter::Q3,
        _ => Quarter::Q4,
    }
}

pub fn half_year_at(offset: MonthOffset, interview_year: i32) -> HalfYear {
    let (year, month) = offset.calendar_month(interview_year);
    HalfYear {
        year,
        half: half_of(month),
    }
}

pub fn year_quarter_at(offset: MonthOffset, interview_year: i32) -> YearQuarter {
    let (year, month) = offset.calendar_month(interview_year);
    YearQuarter {
        year,
        quarter: quarter_of(month),
    }
}

/// Half-year whose state UI rules apply to the record.
pub fn resolve_ui_reference_period(record: &PersonYearRecord) -> Option<HalfYear> {
    let (_, offset) = reference_anchor(record)?;
    Some(half_year_at(offset, record.interview_year))
}

/// Quarter whose state macro indicators apply to the record.
pub fn resolve_macro_reference_period(record: &PersonYearRecord) -> Option<YearQuarter> {
    let (_, offset) = reference_anchor(record)?;
    Some(year_quarter_at(offset, record.interview_year))
}
