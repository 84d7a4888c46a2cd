//! Spell duration on either side of the interview and the combined total.
//!
//! Both sides use the same linear walk: unemployed months extend the spell,
//! unknown months extend it too but void the exact count, and the first known
//! employed month ends it. Running out of months saturates at the walk's
//! ceiling and marks the side censored.

use uiwell_core::{CensoringKind, MonthFlag, MonthOffset, SpellDuration, SpellSide};

use crate::timeline::MonthlyTimeline;

/// Walk flags until the first known employed month.
pub fn walk<I>(flags: I, ceiling: u16) -> SpellSide
where
    I: IntoIterator<Item = MonthFlag>,
{
    let mut months: u16 = 0;
    let mut saw_unknown = false;
    for flag in flags {
        match flag {
            Some(false) => {
                return SpellSide {
                    exact: (!saw_unknown).then_some(months),
                    min: months,
                    censored: saw_unknown,
                };
            }
            Some(true) => months += 1,
            None => {
                months += 1;
                saw_unknown = true;
            }
        }
    }
    SpellSide {
        exact: None,
        min: ceiling,
        censored: true,
    }
}

/// Pre-interview side for a spell starting at `first`.
///
/// Only a spell that starts in the interview month reaches back before it;
/// a later onset has nothing on the pre-interview side.
pub fn pre_interview(timeline: &MonthlyTimeline<'_>, first: MonthOffset) -> SpellSide {
    let calendar = timeline.calendar();
    if first != calendar.interview_offset() {
        return SpellSide::EMPTY;
    }
    walk(timeline.lookback(), calendar.lookback_ceiling())
}

/// Post-interview side from `first` through the end of the lead blocks.
pub fn post_interview(timeline: &MonthlyTimeline<'_>, first: MonthOffset) -> SpellSide {
    walk(
        timeline.forward(first),
        timeline.calendar().forward_ceiling(first),
    )
}

/// The pre side ends at the month before interview and the post side starts
/// at onset, so adding the minimums counts no month twice.
pub fn total(pre: SpellSide, post: SpellSide) -> SpellDuration {
    SpellDuration {
        months: pre.min + post.min,
        censoring: CensoringKind::from_sides(pre.censored, post.censored),
    }
}

/// Consistency of one side against its ceiling.
pub fn check_side(side: &SpellSide, ceiling: u16) -> Result<(), String> {
    if side.min > ceiling {
        return Err(format!("minimum {} exceeds ceiling {}", side.min, ceiling));
    }
    match side.exact {
        Some(exact) if exact > side.min => Err(format!(
            "exact {} exceeds minimum {}",
            exact, side.min
        )),
        Some(_) if side.censored => Err("censored side has an exact count".to_string()),
        None if !side.censored => Err("uncensored side has no exact count".to_string()),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use uiwell_test_utils::arb_month_flag;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The minimum never falls below the exact count when both exist.
        #[test]
        fn prop_min_never_below_exact(
            flags in prop::collection::vec(arb_month_flag(), 0..40),
        ) {
            let ceiling = flags.len() as u16;
            let side = walk(flags.iter().copied(), ceiling);
            if let Some(exact) = side.exact {
                prop_assert!(side.min >= exact);
                prop_assert!(!side.censored);
            }
            prop_assert!(side.min <= ceiling);
            prop_assert!(check_side(&side, ceiling).is_ok());
        }
    }
}
