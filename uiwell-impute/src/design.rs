//! Design matrix handed to the imputation service.

use serde::{Deserialize, Serialize};
use std::fmt;
use uiwell_core::{
    EmploymentStatus, EmploymentStratum, PersonYearRecord, SpellSide, UiReceipt, WaveKey,
};

// ============================================================================
// COLUMNS
// ============================================================================

/// A typed design-matrix column backed by one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignColumn {
    Age,
    Gender,
    Race,
    Ethnicity,
    Nativity,
    Region,
    MaritalStatus,
    EducationYears,
    Disability,
    FamilyIncome,
    FamilyWealth,
    SelfEmployed,
    EmploymentStatus,
    Occupation,
    LaborIncome,
    AnnualHours,
    UnemployedInLead,
    PreInterviewMin,
    PostInterviewMin,
    UiReceived,
    UiMonthsReceived,
    UiAnnualAmount,
    StateMaxDuration,
    StateMaxBenefit,
    UnemploymentRate,
    GspPerCapita,
    Outcome,
}

impl DesignColumn {
    pub const ALL: [DesignColumn; 27] = [
        DesignColumn::Age,
        DesignColumn::Gender,
        DesignColumn::Race,
        DesignColumn::Ethnicity,
        DesignColumn::Nativity,
        DesignColumn::Region,
        DesignColumn::MaritalStatus,
        DesignColumn::EducationYears,
        DesignColumn::Disability,
        DesignColumn::FamilyIncome,
        DesignColumn::FamilyWealth,
        DesignColumn::SelfEmployed,
        DesignColumn::EmploymentStatus,
        DesignColumn::Occupation,
        DesignColumn::LaborIncome,
        DesignColumn::AnnualHours,
        DesignColumn::UnemployedInLead,
        DesignColumn::PreInterviewMin,
        DesignColumn::PostInterviewMin,
        DesignColumn::UiReceived,
        DesignColumn::UiMonthsReceived,
        DesignColumn::UiAnnualAmount,
        DesignColumn::StateMaxDuration,
        DesignColumn::StateMaxBenefit,
        DesignColumn::UnemploymentRate,
        DesignColumn::GspPerCapita,
        DesignColumn::Outcome,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DesignColumn::Age => "age",
            DesignColumn::Gender => "gender",
            DesignColumn::Race => "race",
            DesignColumn::Ethnicity => "ethnicity",
            DesignColumn::Nativity => "nativity",
            DesignColumn::Region => "region",
            DesignColumn::MaritalStatus => "marital_status",
            DesignColumn::EducationYears => "education_years",
            DesignColumn::Disability => "disability",
            DesignColumn::FamilyIncome => "family_income",
            DesignColumn::FamilyWealth => "family_wealth",
            DesignColumn::SelfEmployed => "self_employed",
            DesignColumn::EmploymentStatus => "employment_status",
            DesignColumn::Occupation => "occupation",
            DesignColumn::LaborIncome => "labor_income",
            DesignColumn::AnnualHours => "annual_hours",
            DesignColumn::UnemployedInLead => "unemployed_in_12mo_lead",
            DesignColumn::PreInterviewMin => "months_unemployed_pre_interview_min",
            DesignColumn::PostInterviewMin => "months_unemployed_post_interview_min",
            DesignColumn::UiReceived => "ui_received_in_window",
            DesignColumn::UiMonthsReceived => "ui_months_received",
            DesignColumn::UiAnnualAmount => "ui_annual_amount",
            DesignColumn::StateMaxDuration => "state_max_duration",
            DesignColumn::StateMaxBenefit => "state_max_benefit",
            DesignColumn::UnemploymentRate => "unemployment_rate",
            DesignColumn::GspPerCapita => "gsp_per_capita",
            DesignColumn::Outcome => "outcome",
        }
    }

    /// Joined state context is looked up, never imputed.
    pub fn is_imputable(self) -> bool {
        !matches!(
            self,
            DesignColumn::StateMaxDuration
                | DesignColumn::StateMaxBenefit
                | DesignColumn::UnemploymentRate
                | DesignColumn::GspPerCapita
        )
    }

    /// Read the column's value from a record.
    pub fn extract(self, record: &PersonYearRecord) -> Option<f64> {
        let d = &record.demographics;
        match self {
            DesignColumn::Age => d.age.map(f64::from),
            DesignColumn::Gender => d.gender.map(f64::from),
            DesignColumn::Race => d.race.map(f64::from),
            DesignColumn::Ethnicity => d.ethnicity.map(f64::from),
            DesignColumn::Nativity => d.nativity.map(f64::from),
            DesignColumn::Region => d.region.map(f64::from),
            DesignColumn::MaritalStatus => d.marital_status.map(f64::from),
            DesignColumn::EducationYears => d.education_years.map(f64::from),
            DesignColumn::Disability => d.disability.map(indicator),
            DesignColumn::FamilyIncome => d.family_income,
            DesignColumn::FamilyWealth => d.family_wealth,
            DesignColumn::SelfEmployed => d.self_employed.map(indicator),
            DesignColumn::EmploymentStatus => d.employment_status.map(|s| f64::from(s.code())),
            DesignColumn::Occupation => d.occupation.map(f64::from),
            DesignColumn::LaborIncome => d.labor_income,
            DesignColumn::AnnualHours => d.annual_hours,
            DesignColumn::UnemployedInLead => record.spell.unemployed_in_12mo_lead.map(indicator),
            DesignColumn::PreInterviewMin => record.spell.pre_interview.map(|s| f64::from(s.min)),
            DesignColumn::PostInterviewMin => {
                record.spell.post_interview.map(|s| f64::from(s.min))
            }
            DesignColumn::UiReceived => record
                .benefit
                .received_in_window
                .map(|r| indicator(r.received())),
            DesignColumn::UiMonthsReceived => record.benefit.months_received.map(f64::from),
            DesignColumn::UiAnnualAmount => record.benefit.annual_amount,
            DesignColumn::StateMaxDuration => record.context.state_max_duration(),
            DesignColumn::StateMaxBenefit => record.context.state_max_benefit(),
            DesignColumn::UnemploymentRate => record.context.unemployment_rate(),
            DesignColumn::GspPerCapita => record.context.gsp_per_capita(),
            DesignColumn::Outcome => record.outcome,
        }
    }

    /// Write an imputed value back. Categorical columns round to the nearest
    /// code; codes outside the field's range leave it missing.
    pub fn apply(self, record: &mut PersonYearRecord, value: f64) {
        let d = &mut record.demographics;
        match self {
            DesignColumn::Age => d.age = small_code(value),
            DesignColumn::Gender => d.gender = small_code(value),
            DesignColumn::Race => d.race = small_code(value),
            DesignColumn::Ethnicity => d.ethnicity = small_code(value),
            DesignColumn::Nativity => d.nativity = small_code(value),
            DesignColumn::Region => d.region = small_code(value),
            DesignColumn::MaritalStatus => d.marital_status = small_code(value),
            DesignColumn::EducationYears => d.education_years = small_code(value),
            DesignColumn::Disability => d.disability = Some(value >= 0.5),
            DesignColumn::FamilyIncome => d.family_income = Some(value),
            DesignColumn::FamilyWealth => d.family_wealth = Some(value),
            DesignColumn::SelfEmployed => d.self_employed = Some(value >= 0.5),
            DesignColumn::EmploymentStatus => {
                d.employment_status = small_code(value).and_then(EmploymentStatus::from_code)
            }
            DesignColumn::Occupation => {
                let rounded = value.round();
                d.occupation = (0.0..=f64::from(u16::MAX))
                    .contains(&rounded)
                    .then_some(rounded as u16);
            }
            DesignColumn::LaborIncome => d.labor_income = Some(value),
            DesignColumn::AnnualHours => d.annual_hours = Some(value),
            DesignColumn::UnemployedInLead => {
                record.spell.unemployed_in_12mo_lead = Some(value >= 0.5)
            }
            DesignColumn::PreInterviewMin => {
                record.spell.pre_interview = Some(imputed_side(value))
            }
            DesignColumn::PostInterviewMin => {
                record.spell.post_interview = Some(imputed_side(value))
            }
            DesignColumn::UiReceived => {
                record.benefit.received_in_window = Some(if value >= 0.5 {
                    UiReceipt::Received
                } else {
                    UiReceipt::ImputedNotReceived
                })
            }
            DesignColumn::UiMonthsReceived => {
                record.benefit.months_received = small_code(value).map(|m| m.min(12))
            }
            DesignColumn::UiAnnualAmount => record.benefit.annual_amount = Some(value.max(0.0)),
            DesignColumn::StateMaxDuration
            | DesignColumn::StateMaxBenefit
            | DesignColumn::UnemploymentRate
            | DesignColumn::GspPerCapita => {}
            DesignColumn::Outcome => record.outcome = Some(value),
        }
    }
}

impl fmt::Display for DesignColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn small_code(value: f64) -> Option<u8> {
    let rounded = value.round();
    (0.0..=f64::from(u8::MAX))
        .contains(&rounded)
        .then_some(rounded as u8)
}

/// An imputed duration has no observed exact count.
fn imputed_side(value: f64) -> SpellSide {
    SpellSide {
        exact: None,
        min: value.round().max(0.0) as u16,
        censored: true,
    }
}

// ============================================================================
// MATRIX
// ============================================================================

/// Row-major matrix of one stratum's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    stratum: EmploymentStratum,
    keys: Vec<WaveKey>,
    columns: Vec<DesignColumn>,
    cells: Vec<Vec<Option<f64>>>,
}

impl DesignMatrix {
    pub fn from_records<'a, I>(stratum: EmploymentStratum, records: I, columns: &[DesignColumn]) -> Self
    where
        I: IntoIterator<Item = &'a PersonYearRecord>,
    {
        let mut keys = Vec::new();
        let mut cells = Vec::new();
        for record in records {
            keys.push(record.key());
            cells.push(columns.iter().map(|c| c.extract(record)).collect());
        }
        Self {
            stratum,
            keys,
            columns: columns.to_vec(),
            cells,
        }
    }

    /// Matrix with the same rows and columns but new cell values.
    pub fn with_cells(&self, cells: Vec<Vec<Option<f64>>>) -> Self {
        Self {
            stratum: self.stratum,
            keys: self.keys.clone(),
            columns: self.columns.clone(),
            cells,
        }
    }

    pub fn stratum(&self) -> EmploymentStratum {
        self.stratum
    }

    pub fn keys(&self) -> &[WaveKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[DesignColumn] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.keys.len()
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Shape as (rows, cols); ragged rows report their widest width.
    pub fn shape(&self) -> (usize, usize) {
        let widest = self.cells.iter().map(Vec::len).max().unwrap_or(self.cols());
        (self.cells.len(), widest.max(self.cols()))
    }

    pub fn is_rectangular(&self) -> bool {
        self.cells.len() == self.keys.len() && self.cells.iter().all(|row| row.len() == self.cols())
    }

    pub fn column_index(&self, column: DesignColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn row(&self, row: usize) -> Option<&[Option<f64>]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    /// Missing cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<usize> {
        (0..self.cols())
            .map(|col| self.cells.iter().filter(|r| r.get(col).copied().flatten().is_none()).count())
            .collect()
    }

    pub fn missing_count(&self) -> usize {
        self.missing_counts().iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_core::{PersonId, SpellSummary};

    fn record() -> PersonYearRecord {
        let mut r = PersonYearRecord::new(PersonId(3001), 2005);
        r.demographics.age = Some(41);
        r.demographics.employment_status = Some(EmploymentStatus::Unemployed);
        r.demographics.disability = Some(false);
        r.spell = SpellSummary {
            unemployed_in_12mo_lead: Some(true),
            ..SpellSummary::default()
        };
        r.outcome = Some(6.5);
        r
    }

    #[test]
    fn test_extract_codes() {
        let r = record();
        assert_eq!(DesignColumn::Age.extract(&r), Some(41.0));
        assert_eq!(DesignColumn::EmploymentStatus.extract(&r), Some(3.0));
        assert_eq!(DesignColumn::Disability.extract(&r), Some(0.0));
        assert_eq!(DesignColumn::UnemployedInLead.extract(&r), Some(1.0));
        assert_eq!(DesignColumn::LaborIncome.extract(&r), None);
        assert_eq!(DesignColumn::UiReceived.extract(&r), None);
    }

    #[test]
    fn test_apply_rounds_categorical_codes() {
        let mut r = record();
        DesignColumn::EmploymentStatus.apply(&mut r, 0.9);
        assert_eq!(r.demographics.employment_status, Some(EmploymentStatus::Employed));
        DesignColumn::EmploymentStatus.apply(&mut r, 42.0);
        assert_eq!(r.demographics.employment_status, None);
        DesignColumn::UiMonthsReceived.apply(&mut r, 14.2);
        assert_eq!(r.benefit.months_received, Some(12));
        DesignColumn::PreInterviewMin.apply(&mut r, 4.4);
        assert_eq!(r.spell.pre_interview.map(|s| s.min), Some(4));
        assert_eq!(r.spell.pre_interview.and_then(|s| s.exact), None);
    }

    #[test]
    fn test_imputed_non_receipt_kept_apart_from_observed() {
        let mut r = record();
        DesignColumn::UiReceived.apply(&mut r, 0.2);
        assert_eq!(r.benefit.received_in_window, Some(UiReceipt::ImputedNotReceived));
        assert!(r.benefit.received_in_window.is_some_and(UiReceipt::is_imputed));
        // Still a zero when fed back as a predictor.
        assert_eq!(DesignColumn::UiReceived.extract(&r), Some(0.0));

        DesignColumn::UiReceived.apply(&mut r, 0.8);
        assert_eq!(r.benefit.received_in_window, Some(UiReceipt::Received));
    }

    #[test]
    fn test_context_columns_are_not_imputable() {
        let lookups: Vec<_> = DesignColumn::ALL
            .iter()
            .filter(|c| !c.is_imputable())
            .collect();
        assert_eq!(lookups.len(), 4);
        let mut r = record();
        DesignColumn::UnemploymentRate.apply(&mut r, 5.0);
        assert_eq!(r.context.unemployment_rate(), None);
    }

    #[test]
    fn test_matrix_from_records() {
        let a = record();
        let mut b = record();
        b.year = 2007;
        b.demographics.age = None;
        let columns = [DesignColumn::Age, DesignColumn::Outcome];
        let m = DesignMatrix::from_records(EmploymentStratum::AtRisk, [&a, &b], &columns);
        assert_eq!(m.shape(), (2, 2));
        assert!(m.is_rectangular());
        assert_eq!(m.get(0, 0), Some(41.0));
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.missing_counts(), vec![1, 0]);
        assert_eq!(m.column_index(DesignColumn::Outcome), Some(1));
        assert_eq!(m.keys()[1], WaveKey::new(PersonId(3001), 2007));
    }

    #[test]
    fn test_column_names_unique() {
        let mut names: Vec<_> = DesignColumn::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DesignColumn::ALL.len());
    }
}
