//! Rule-based non-receipt for unobserved windows.
//!
//! Only fills `None` receipt on records with a true 12-month lead, and only
//! ever with [`UiReceipt::ImputedNotReceived`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uiwell_core::{PersonYearRecord, UiReceipt, UiWindowConfig};

/// Disqualifying circumstance that justified a non-receipt fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZeroImputationReason {
    LongPriorUnemployment,
    BaseWageBelowMinimum,
    BaseHoursBelowMinimum,
    BaseWeeksBelowMinimum,
}

impl fmt::Display for ZeroImputationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZeroImputationReason::LongPriorUnemployment => "long_prior_unemployment",
            ZeroImputationReason::BaseWageBelowMinimum => "base_wage_below_minimum",
            ZeroImputationReason::BaseHoursBelowMinimum => "base_hours_below_minimum",
            ZeroImputationReason::BaseWeeksBelowMinimum => "base_weeks_below_minimum",
        };
        f.write_str(name)
    }
}

fn below(value: Option<f64>, threshold: Option<f64>) -> bool {
    matches!((value, threshold), (Some(v), Some(t)) if v < t)
}

/// First rule that disqualifies the record, checked in rule order.
pub fn zero_imputation_reason(
    record: &PersonYearRecord,
    config: &UiWindowConfig,
) -> Option<ZeroImputationReason> {
    if record.benefit.received_in_window.is_some()
        || record.spell.unemployed_in_12mo_lead != Some(true)
    {
        return None;
    }
    if record
        .spell
        .pre_interview
        .is_some_and(|pre| pre.min > config.max_prior_unemployment_months)
    {
        return Some(ZeroImputationReason::LongPriorUnemployment);
    }
    let rules = record.context.ui_rules.as_ref()?;
    let demographics = &record.demographics;
    if below(demographics.labor_income, rules.min_base_wage) {
        return Some(ZeroImputationReason::BaseWageBelowMinimum);
    }
    if below(demographics.annual_hours, rules.min_base_hours) {
        return Some(ZeroImputationReason::BaseHoursBelowMinimum);
    }
    if below(record.benefit.base_period_weeks, rules.min_base_weeks) {
        return Some(ZeroImputationReason::BaseWeeksBelowMinimum);
    }
    None
}

/// Fill non-receipt when a rule applies. Returns the rule used.
pub fn apply(
    record: &mut PersonYearRecord,
    config: &UiWindowConfig,
) -> Option<ZeroImputationReason> {
    let reason = zero_imputation_reason(record, config)?;
    record.benefit.received_in_window = Some(UiReceipt::ImputedNotReceived);
    Some(reason)
}
