//! Panel assembly from the person-year sources.

use serde::{Deserialize, Serialize};
use uiwell_core::{InterviewMonth, Panel, PanelError, PersonYearRecord, WaveKey};

use crate::sources::{DemographicSource, EmploymentMonthlySource, OutcomeSource, UiMonthlySource};

/// Borrowed handles to every person-year table.
#[derive(Clone, Copy)]
pub struct PanelSources<'a> {
    pub demographics: &'a dyn DemographicSource,
    pub employment: &'a dyn EmploymentMonthlySource,
    pub ui: &'a dyn UiMonthlySource,
    pub outcomes: &'a dyn OutcomeSource,
}

impl<'a> PanelSources<'a> {
    /// All four tables served by one value.
    pub fn from_one<T>(source: &'a T) -> Self
    where
        T: DemographicSource + EmploymentMonthlySource + UiMonthlySource + OutcomeSource,
    {
        Self {
            demographics: source,
            employment: source,
            ui: source,
            outcomes: source,
        }
    }
}

/// Coverage counts from one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub records: usize,
    pub persons: usize,
    pub without_demographics: usize,
    pub invalid_interview_months: usize,
    pub without_employment: usize,
    pub without_ui_report: usize,
    pub without_outcome: usize,
}

/// Build one record from whatever the sources hold for `key`.
pub fn assemble_record(
    key: WaveKey,
    sources: PanelSources<'_>,
    stats: &mut AssemblyStats,
) -> PersonYearRecord {
    let mut record = PersonYearRecord::new(key.person_id, key.year);
    stats.records += 1;

    match sources.demographics.get(key) {
        Some(row) => {
            record.interview_month = row.interview_month.and_then(InterviewMonth::new);
            if row.interview_month.is_some() && record.interview_month.is_none() {
                stats.invalid_interview_months += 1;
            }
            record.interview_year = row.interview_year.unwrap_or(key.year);
            record.state = row.state;
            record.demographics = row.demographics;
        }
        None => stats.without_demographics += 1,
    }
    match sources.employment.get(key) {
        Some(employment) => record.employment = employment,
        None => stats.without_employment += 1,
    }
    record.ui_report = sources.ui.get(key);
    stats.without_ui_report += usize::from(record.ui_report.is_none());
    record.outcome = sources.outcomes.get(key);
    stats.without_outcome += usize::from(record.outcome.is_none());
    record
}

/// Join the sources for `keys` into a person-partitioned panel.
///
/// Returns [`PanelError::DuplicateWave`] when a key repeats.
pub fn assemble_panel(
    keys: &[WaveKey],
    sources: PanelSources<'_>,
) -> Result<(Panel, AssemblyStats), PanelError> {
    let mut stats = AssemblyStats::default();
    let records: Vec<PersonYearRecord> = keys
        .iter()
        .map(|key| assemble_record(*key, sources, &mut stats))
        .collect();
    let panel = Panel::from_records(records)?;
    stats.persons = panel.histories().len();

    tracing::info!(
        records = stats.records,
        persons = stats.persons,
        without_demographics = stats.without_demographics,
        invalid_interview_months = stats.invalid_interview_months,
        "Panel assembled"
    );
    Ok((panel, stats))
}
