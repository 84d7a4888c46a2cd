//! uiwell Context - External State Context
//!
//! Resolves the reference periods of each record and joins state UI rules and
//! macro indicators for those periods. A state/period missing from a table is
//! a lookup miss: the joined field stays `None` and the miss is counted.

pub mod period;
pub mod tables;

use serde::{Deserialize, Serialize};
use uiwell_core::{ExternalContext, PersonHistory, PersonYearRecord};

pub use period::{
    half_of, half_year_at, quarter_of, reference_anchor, resolve_macro_reference_period,
    resolve_ui_reference_period, year_quarter_at,
};
pub use tables::{InMemoryStateTables, MacroRow, StateMacroSource, StateUiRulesSource, UiRulesRow};

/// Both state tables a join reads from.
#[derive(Clone, Copy)]
pub struct StateLookups<'a> {
    pub ui_rules: &'a dyn StateUiRulesSource,
    pub macros: &'a dyn StateMacroSource,
}

impl<'a> StateLookups<'a> {
    pub fn new(ui_rules: &'a dyn StateUiRulesSource, macros: &'a dyn StateMacroSource) -> Self {
        Self { ui_rules, macros }
    }

    /// Both tables from one value implementing both traits.
    pub fn from_tables<T: StateUiRulesSource + StateMacroSource>(tables: &'a T) -> Self {
        Self {
            ui_rules: tables,
            macros: tables,
        }
    }
}

/// Counts from one join pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextStats {
    pub records: usize,
    pub without_period: usize,
    pub without_state: usize,
    pub ui_rule_misses: usize,
    pub macro_misses: usize,
}

impl ContextStats {
    pub fn merge(&mut self, other: &ContextStats) {
        self.records += other.records;
        self.without_period += other.without_period;
        self.without_state += other.without_state;
        self.ui_rule_misses += other.ui_rule_misses;
        self.macro_misses += other.macro_misses;
    }

    pub fn misses(&self) -> usize {
        self.ui_rule_misses + self.macro_misses
    }
}

/// Reference periods and joined tables for one record.
pub fn context_for_record(
    record: &PersonYearRecord,
    lookups: StateLookups<'_>,
    stats: &mut ContextStats,
) -> ExternalContext {
    stats.records += 1;
    let Some((anchor, _)) = reference_anchor(record) else {
        stats.without_period += 1;
        return ExternalContext::default();
    };
    let mut context = ExternalContext {
        anchor: Some(anchor),
        ui_period: resolve_ui_reference_period(record),
        macro_period: resolve_macro_reference_period(record),
        ..ExternalContext::default()
    };
    let Some(state) = record.state else {
        stats.without_state += 1;
        return context;
    };

    if let Some(period) = context.ui_period {
        context.ui_rules = lookups.ui_rules.get(state, period);
        if context.ui_rules.is_none() {
            stats.ui_rule_misses += 1;
            tracing::debug!(
                key = %record.key(),
                state = %state,
                year = period.year,
                half = period.half.number(),
                "State UI rules missing"
            );
        }
    }
    if let Some(period) = context.macro_period {
        context.macro_indicators = lookups.macros.get(state, period);
        if context.macro_indicators.is_none() {
            stats.macro_misses += 1;
            tracing::debug!(
                key = %record.key(),
                state = %state,
                year = period.year,
                quarter = period.quarter.number(),
                "State macro indicators missing"
            );
        }
    }
    context
}

/// Join state context onto every wave of one person.
pub fn join_context(history: &mut PersonHistory, lookups: StateLookups<'_>) -> ContextStats {
    let mut stats = ContextStats::default();
    for record in history.waves_mut() {
        record.context = context_for_record(record, lookups, &mut stats);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_core::{
        Half, HalfYear, Quarter, ReferenceAnchor, StateFips, StateMacro, StateUiRules, YearQuarter,
    };
    use uiwell_test_utils::{history, RecordBuilder};

    fn tables() -> InMemoryStateTables {
        let mut tables = InMemoryStateTables::new();
        tables.insert_ui_rules(
            StateFips(26),
            HalfYear {
                year: 2005,
                half: Half::Second,
            },
            StateUiRules {
                max_weekly_benefit: Some(362.0),
                max_duration_weeks: Some(26.0),
                min_base_wage: Some(2_997.0),
                ..StateUiRules::default()
            },
        );
        tables.insert_macro(
            StateFips(26),
            YearQuarter {
                year: 2005,
                quarter: Quarter::Q4,
            },
            StateMacro {
                gsp_per_capita: Some(37_500.0),
                unemployment_rate: Some(6.8),
            },
        );
        tables
    }

    #[test]
    fn test_join_on_onset_period() {
        let tables = tables();
        let record = RecordBuilder::new(1, 2005)
            .interview_month(9)
            .state(26)
            .lead(Some(true))
            .first_unemployed(10)
            .build();
        let mut stats = ContextStats::default();
        let context = context_for_record(&record, StateLookups::from_tables(&tables), &mut stats);

        assert_eq!(context.anchor, Some(ReferenceAnchor::SpellOnset));
        assert_eq!(context.state_max_duration(), Some(26.0));
        assert_eq!(context.state_max_benefit(), Some(362.0));
        assert_eq!(context.unemployment_rate(), Some(6.8));
        assert_eq!(context.gsp_per_capita(), Some(37_500.0));
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_lookup_miss_is_none_not_error() {
        let tables = tables();
        // Interview in September: Q3 has no macro row.
        let record = RecordBuilder::new(1, 2005).interview_month(9).state(26).build();
        let mut stats = ContextStats::default();
        let context = context_for_record(&record, StateLookups::from_tables(&tables), &mut stats);

        assert!(context.ui_rules.is_some());
        assert_eq!(context.macro_indicators, None);
        assert_eq!(context.unemployment_rate(), None);
        assert_eq!(stats.macro_misses, 1);
        assert_eq!(stats.ui_rule_misses, 0);
    }

    #[test]
    fn test_join_context_counts_per_history() {
        let tables = tables();
        let mut h = history(
            1,
            vec![
                RecordBuilder::new(1, 2005).interview_month(9).state(26).build(),
                RecordBuilder::new(1, 2007).interview_month(9).build(),
                RecordBuilder::new(1, 2009).state(26).build(),
            ],
        );
        let stats = join_context(&mut h, StateLookups::new(&tables, &tables));

        assert_eq!(stats.records, 3);
        assert_eq!(stats.without_state, 1);
        assert_eq!(stats.without_period, 1);
        assert!(h.waves()[1].context.ui_period.is_some());
        assert!(h.waves()[1].context.ui_rules.is_none());
        assert_eq!(h.waves()[2].context, ExternalContext::default());
    }
}
