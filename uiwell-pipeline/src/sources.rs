//! Person-year source collaborators
//!
//! Raw extracts are parsed elsewhere; assembly only needs keyed access to
//! each table. The in-memory implementation backs tests and small runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uiwell_core::{Demographics, EmploymentHistory, StateFips, UiYearReport, WaveKey};

/// Interview-level row from the demographic table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemographicRow {
    /// Raw interview month code; anything outside 1..=12 is treated as missing.
    pub interview_month: Option<u8>,
    /// Defaults to the wave year when absent.
    pub interview_year: Option<i32>,
    pub state: Option<StateFips>,
    pub demographics: Demographics,
}

pub trait DemographicSource: Send + Sync {
    fn get(&self, key: WaveKey) -> Option<DemographicRow>;
}

/// The 36 recalled monthly employment codes of one interview.
pub trait EmploymentMonthlySource: Send + Sync {
    fn get(&self, key: WaveKey) -> Option<EmploymentHistory>;
}

/// Monthly receipt codes and the annual amount reported at one interview.
pub trait UiMonthlySource: Send + Sync {
    fn get(&self, key: WaveKey) -> Option<UiYearReport>;
}

pub trait OutcomeSource: Send + Sync {
    fn get(&self, key: WaveKey) -> Option<f64>;
}

/// The four person-year tables in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySources {
    demographics: HashMap<WaveKey, DemographicRow>,
    employment: HashMap<WaveKey, EmploymentHistory>,
    ui: HashMap<WaveKey, UiYearReport>,
    outcomes: HashMap<WaveKey, f64>,
}

impl InMemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_demographics(&mut self, key: WaveKey, row: DemographicRow) {
        self.demographics.insert(key, row);
    }

    pub fn insert_employment(&mut self, key: WaveKey, history: EmploymentHistory) {
        self.employment.insert(key, history);
    }

    pub fn insert_ui(&mut self, key: WaveKey, report: UiYearReport) {
        self.ui.insert(key, report);
    }

    pub fn insert_outcome(&mut self, key: WaveKey, value: f64) {
        self.outcomes.insert(key, value);
    }

    /// Every key present in the demographic table, sorted.
    pub fn keys(&self) -> Vec<WaveKey> {
        let mut keys: Vec<WaveKey> = self.demographics.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl DemographicSource for InMemorySources {
    fn get(&self, key: WaveKey) -> Option<DemographicRow> {
        self.demographics.get(&key).cloned()
    }
}

impl EmploymentMonthlySource for InMemorySources {
    fn get(&self, key: WaveKey) -> Option<EmploymentHistory> {
        self.employment.get(&key).cloned()
    }
}

impl UiMonthlySource for InMemorySources {
    fn get(&self, key: WaveKey) -> Option<UiYearReport> {
        self.ui.get(&key).cloned()
    }
}

impl OutcomeSource for InMemorySources {
    fn get(&self, key: WaveKey) -> Option<f64> {
        self.outcomes.get(&key).copied()
    }
}
