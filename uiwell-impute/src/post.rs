//! Re-derivation of directly computable fields after imputation.

use serde::{Deserialize, Serialize};
use uiwell_core::{CensoringKind, EmploymentStatus, PersonYearRecord, SpellDuration};

/// What re-derivation changed on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rederived {
    pub lead_reset: bool,
    pub monthly_amount: bool,
    pub total_duration: bool,
}

/// Counts across a completed panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RederiveStats {
    pub records: usize,
    pub lead_resets: usize,
    pub monthly_amounts: usize,
    pub total_durations: usize,
}

impl RederiveStats {
    pub fn observe(&mut self, change: Rederived) {
        self.records += 1;
        self.lead_resets += usize::from(change.lead_reset);
        self.monthly_amounts += usize::from(change.monthly_amount);
        self.total_durations += usize::from(change.total_duration);
    }
}

/// Apply the post-imputation rules to one record:
/// - a missing lead indicator with an imputed Unemployed status becomes true,
///   and the record is marked as such
/// - the UI monthly amount follows the imputed annual amount and months
/// - the total spell duration follows the imputed side minimums
pub fn rederive(record: &mut PersonYearRecord) -> Rederived {
    let mut change = Rederived::default();

    if record.spell.unemployed_in_12mo_lead.is_none()
        && record.demographics.employment_status == Some(EmploymentStatus::Unemployed)
    {
        record.spell.unemployed_in_12mo_lead = Some(true);
        record.spell.lead_from_status = true;
        change.lead_reset = true;
    }

    let benefit = &mut record.benefit;
    let monthly = match (benefit.annual_amount, benefit.months_received) {
        (Some(amount), Some(months)) if months > 0 => Some(amount / f64::from(months)),
        (Some(amount), _) if amount == 0.0 => Some(0.0),
        _ => benefit.monthly_amount,
    };
    if monthly != benefit.monthly_amount {
        benefit.monthly_amount = monthly;
        change.monthly_amount = true;
    }

    if let (Some(pre), Some(post)) = (record.spell.pre_interview, record.spell.post_interview) {
        let total = SpellDuration {
            months: pre.min + post.min,
            censoring: CensoringKind::from_sides(pre.censored, post.censored),
        };
        if record.spell.total != Some(total) {
            record.spell.total = Some(total);
            change.total_duration = true;
        }
    }

    change
}
