//! State-indexed lookup tables.
//!
//! Storage lives with the caller; this crate only asks for a row by state and
//! period. [`InMemoryStateTables`] backs tests and small runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uiwell_core::{HalfYear, StateFips, StateMacro, StateUiRules, YearQuarter};

/// State UI program rules by half-year.
pub trait StateUiRulesSource: Send + Sync {
    fn get(&self, state: StateFips, period: HalfYear) -> Option<StateUiRules>;
}

/// State macro indicators by quarter.
pub trait StateMacroSource: Send + Sync {
    fn get(&self, state: StateFips, period: YearQuarter) -> Option<StateMacro>;
}

/// One row of the UI rules table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiRulesRow {
    pub state: StateFips,
    pub period: HalfYear,
    pub rules: StateUiRules,
}

/// One row of the macro indicator table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRow {
    pub state: StateFips,
    pub period: YearQuarter,
    pub indicators: StateMacro,
}

/// Both tables held in hash maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateTables {
    ui_rules: HashMap<(StateFips, HalfYear), StateUiRules>,
    macros: HashMap<(StateFips, YearQuarter), StateMacro>,
}

impl InMemoryStateTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(
        ui_rules: impl IntoIterator<Item = UiRulesRow>,
        macros: impl IntoIterator<Item = MacroRow>,
    ) -> Self {
        let mut tables = Self::new();
        for row in ui_rules {
            tables.insert_ui_rules(row.state, row.period, row.rules);
        }
        for row in macros {
            tables.insert_macro(row.state, row.period, row.indicators);
        }
        tables
    }

    /// Later rows for the same key replace earlier ones.
    pub fn insert_ui_rules(&mut self, state: StateFips, period: HalfYear, rules: StateUiRules) {
        self.ui_rules.insert((state, period), rules);
    }

    pub fn insert_macro(&mut self, state: StateFips, period: YearQuarter, indicators: StateMacro) {
        self.macros.insert((state, period), indicators);
    }

    pub fn ui_rules_count(&self) -> usize {
        self.ui_rules.len()
    }

    pub fn macro_count(&self) -> usize {
        self.macros.len()
    }
}

impl StateUiRulesSource for InMemoryStateTables {
    fn get(&self, state: StateFips, period: HalfYear) -> Option<StateUiRules> {
        self.ui_rules.get(&(state, period)).cloned()
    }
}

impl StateMacroSource for InMemoryStateTables {
    fn get(&self, state: StateFips, period: YearQuarter) -> Option<StateMacro> {
        self.macros.get(&(state, period)).cloned()
    }
}
