//! Months of receipt and amounts from an annual report.

use uiwell_core::{MonthFlag, MonthOffset, UiWindowConfig, UiYearReport};
use uiwell_spell::MonthlyTimeline;

/// Months with receipt in the report's year.
///
/// Exact when all twelve months are known. With a positive amount but gaps,
/// the known receipt months serve as a floor; a zero amount means none.
pub fn months_received(report: &UiYearReport) -> Option<u8> {
    let known = report.receipt.iter().filter(|f| **f == Some(true)).count() as u8;
    if report.receipt.iter().all(Option::is_some) {
        return Some(known);
    }
    match report.annual_amount {
        Some(amount) if amount > 0.0 => Some(known),
        Some(amount) if amount == 0.0 => Some(0),
        _ => None,
    }
}

pub fn monthly_amount(annual_amount: Option<f64>, months: Option<u8>) -> Option<f64> {
    match (annual_amount, months) {
        (Some(amount), Some(m)) if m > 0 => Some(amount / f64::from(m)),
        (Some(amount), _) if amount == 0.0 => Some(0.0),
        _ => None,
    }
}

/// Employed weeks in the twelve months before onset; needs every month known.
pub fn base_period_weeks(
    timeline: &MonthlyTimeline<'_>,
    first: MonthOffset,
    config: &UiWindowConfig,
) -> Option<f64> {
    let flags: Vec<MonthFlag> = timeline.preceding(first, 12);
    if flags.iter().any(Option::is_none) {
        return None;
    }
    let employed = flags.iter().filter(|f| **f == Some(false)).count();
    Some(employed as f64 * config.weeks_per_month)
}
