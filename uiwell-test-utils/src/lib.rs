//! uiwell Test Utilities
//!
//! Centralized test infrastructure for the uiwell workspace:
//! - A fluent builder for person-year records
//! - Proptest generators for raw inputs and whole histories
//! - Fixtures for common panel shapes
//! - Mock imputation services
//! - Assertions for panel invariants

use std::sync::Mutex;

pub use uiwell_core::{
    EmploymentCode, EmploymentStatus, EmploymentStratum, InterviewMonth, LeadBlock, Month,
    MonthFlag, MonthOffset, PersonHistory, PersonId, PersonYearRecord, RecallBlock, SpellSide,
    StateFips, UiYearReport,
};
use uiwell_impute::{DesignMatrix, ImputationService, MethodSpec, PredictorSpec, ServiceFailure};

pub use generators::*;

// ============================================================================
// RECORD BUILDER
// ============================================================================

/// Fluent builder over [`PersonYearRecord`]; everything not set stays unknown.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: PersonYearRecord,
}

impl RecordBuilder {
    pub fn new(person: u64, year: i32) -> Self {
        Self {
            record: PersonYearRecord::new(PersonId(person), year),
        }
    }

    pub fn interview_month(mut self, month: u8) -> Self {
        self.record.interview_month = InterviewMonth::new(month);
        self
    }

    pub fn interview_year(mut self, year: i32) -> Self {
        self.record.interview_year = year;
        self
    }

    pub fn state(mut self, fips: u8) -> Self {
        self.record.state = Some(StateFips(fips));
        self
    }

    pub fn employment(mut self, block: RecallBlock, month: Month, code: EmploymentCode) -> Self {
        self.record.employment.set(block, month, Some(code));
        self
    }

    pub fn employment_unknown(mut self, block: RecallBlock, month: Month) -> Self {
        self.record.employment.set(block, month, None);
        self
    }

    /// Every recall month employed.
    pub fn all_employed(mut self) -> Self {
        for block in RecallBlock::ALL {
            for month in uiwell_core::all_months() {
                self.record
                    .employment
                    .set(block, month, Some(EmploymentCode::Employed));
            }
        }
        self
    }

    pub fn lead_flag(mut self, block: LeadBlock, month: Month, flag: MonthFlag) -> Self {
        self.record.lead_flags.set(block, month, flag);
        self
    }

    /// Lead flag at an offset in 1..=48.
    pub fn lead_at(self, offset: i16, flag: MonthFlag) -> Self {
        let (block, month) = MonthOffset::new(offset)
            .lead_slot()
            .expect("lead offsets run from 1 to 48");
        self.lead_flag(block, month, flag)
    }

    /// Lead flags for the 12-month window in scan order. Needs the interview
    /// month to be set first.
    pub fn window_flags(mut self, flags: &[MonthFlag]) -> Self {
        let calendar = self
            .record
            .interview_month
            .expect("window_flags needs an interview month")
            .calendar();
        for (offset, flag) in calendar.lead_window().iter().zip(flags) {
            if let Some((block, month)) = offset.lead_slot() {
                self.record.lead_flags.set(block, month, *flag);
            }
        }
        self
    }

    /// Set the 12-month lead indicator directly.
    pub fn lead(mut self, lead: Option<bool>) -> Self {
        self.record.spell.unemployed_in_12mo_lead = lead;
        self
    }

    pub fn first_unemployed(mut self, offset: i16) -> Self {
        self.record.spell.first_unemployed_offset = Some(MonthOffset::new(offset));
        self
    }

    pub fn pre_interview(mut self, side: SpellSide) -> Self {
        self.record.spell.pre_interview = Some(side);
        self
    }

    pub fn post_interview(mut self, side: SpellSide) -> Self {
        self.record.spell.post_interview = Some(side);
        self
    }

    pub fn ui_report(mut self, report: UiYearReport) -> Self {
        self.record.ui_report = Some(report);
        self
    }

    pub fn outcome(mut self, value: f64) -> Self {
        self.record.outcome = Some(value);
        self
    }

    pub fn labor_income(mut self, value: f64) -> Self {
        self.record.demographics.labor_income = Some(value);
        self
    }

    pub fn annual_hours(mut self, value: f64) -> Self {
        self.record.demographics.annual_hours = Some(value);
        self
    }

    pub fn employment_status(mut self, status: EmploymentStatus) -> Self {
        self.record.demographics.employment_status = Some(status);
        self
    }

    pub fn included(mut self, included: bool) -> Self {
        self.record.wave.included = included;
        self
    }

    pub fn build(self) -> PersonYearRecord {
        self.record
    }
}

/// History of one person from built records.
pub fn history(person: u64, records: Vec<PersonYearRecord>) -> PersonHistory {
    PersonHistory::new(PersonId(person), records).expect("records form a valid history")
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for raw inputs and whole histories.

    use super::*;
    use proptest::prelude::*;
    use uiwell_core::EmploymentHistory;

    /// Mostly employed, sometimes unemployed or unknown.
    pub fn arb_month_flag() -> impl Strategy<Value = MonthFlag> {
        prop_oneof![
            3 => Just(Some(false)),
            1 => Just(Some(true)),
            1 => Just(None),
        ]
    }

    pub fn arb_lead() -> impl Strategy<Value = Option<bool>> {
        arb_month_flag()
    }

    pub fn arb_employment_code() -> impl Strategy<Value = Option<EmploymentCode>> {
        prop_oneof![
            4 => Just(Some(EmploymentCode::Employed)),
            2 => Just(Some(EmploymentCode::NotEmployed)),
            1 => Just(None),
        ]
    }

    pub fn arb_employment_history() -> impl Strategy<Value = EmploymentHistory> {
        prop::collection::vec(arb_employment_code(), 36).prop_map(|codes| {
            let mut blocks = [[None; 12]; 3];
            for (i, code) in codes.into_iter().enumerate() {
                blocks[i / 12][i % 12] = code;
            }
            EmploymentHistory::from_blocks(blocks)
        })
    }

    pub fn arb_interview_month() -> impl Strategy<Value = Option<InterviewMonth>> {
        prop_oneof![
            9 => (1u8..=12).prop_map(InterviewMonth::new),
            1 => Just(None),
        ]
    }

    pub fn arb_outcome() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            3 => (0.0f64..10.0).prop_map(Some),
            1 => Just(None),
        ]
    }

    pub fn arb_ui_report() -> impl Strategy<Value = UiYearReport> {
        (
            prop::collection::vec(arb_month_flag(), 12),
            prop::option::of(0.0f64..20_000.0),
        )
            .prop_map(|(flags, annual_amount)| {
                let mut receipt = [None; 12];
                receipt.copy_from_slice(&flags);
                UiYearReport {
                    receipt,
                    annual_amount,
                    receipt_two_years_prior: None,
                }
            })
    }

    /// Sorted unique wave years on a mostly biennial cadence with gaps.
    pub fn arb_wave_years() -> impl Strategy<Value = Vec<i32>> {
        (
            1997i32..2012,
            prop::collection::vec(prop_oneof![5 => Just(2i32), 1 => Just(4), 1 => Just(6)], 0..9),
        )
            .prop_map(|(start, gaps)| {
                let mut years = vec![start];
                let mut year = start;
                for gap in gaps {
                    year += gap;
                    years.push(year);
                }
                years
            })
    }

    /// One person's history with random recall, interview months, outcomes
    /// and UI reports.
    pub fn arb_person_history() -> impl Strategy<Value = PersonHistory> {
        arb_wave_years().prop_flat_map(|years| {
            let n = years.len();
            (
                Just(years),
                prop::collection::vec(
                    (
                        arb_interview_month(),
                        arb_employment_history(),
                        arb_outcome(),
                        prop::option::of(arb_ui_report()),
                    ),
                    n,
                ),
            )
                .prop_map(|(years, waves)| {
                    let records = years
                        .into_iter()
                        .zip(waves)
                        .map(|(year, (month, employment, outcome, ui_report))| {
                            let mut record = PersonYearRecord::new(PersonId(1), year);
                            record.interview_month = month;
                            record.employment = employment;
                            record.outcome = outcome;
                            record.ui_report = ui_report;
                            record
                        })
                        .collect();
                    history(1, records)
                })
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Deterministic panels for benches and end-to-end tests.

    use super::*;

    /// Employment code for a churning pattern: every seventh month of the
    /// frame is spent out of work, shifted per wave.
    fn churn_code(wave: usize, block: usize, month: usize) -> EmploymentCode {
        if (wave * 5 + block * 12 + month) % 7 < 2 {
            EmploymentCode::NotEmployed
        } else {
            EmploymentCode::Employed
        }
    }

    /// `waves` biennial waves starting at `start_year` with churning
    /// employment, receipt reports and outcomes.
    pub fn churning_history(person: u64, start_year: i32, waves: usize) -> PersonHistory {
        let records = (0..waves)
            .map(|w| {
                let mut builder = RecordBuilder::new(person, start_year + 2 * w as i32)
                    .interview_month((w % 12) as u8 + 1)
                    .state(26)
                    .labor_income(18_000.0 + 1_000.0 * w as f64)
                    .annual_hours(1_500.0)
                    .outcome(5.0 + (w % 3) as f64);
                for (b, block) in RecallBlock::ALL.into_iter().enumerate() {
                    for (m, month) in uiwell_core::all_months().enumerate() {
                        builder = builder.employment(block, month, churn_code(w, b, m));
                    }
                }
                let mut receipt = [Some(false); 12];
                receipt[w % 12] = Some(true);
                builder
                    .ui_report(UiYearReport {
                        receipt,
                        annual_amount: Some(1_200.0),
                        receipt_two_years_prior: Some([Some(false); 12]),
                    })
                    .build()
            })
            .collect();
        history(person, records)
    }

    /// Bare records at the given years, every recall month employed.
    pub fn history_at_years(person: u64, years: &[i32]) -> PersonHistory {
        let records = years
            .iter()
            .map(|year| {
                RecordBuilder::new(person, *year)
                    .interview_month(4)
                    .all_employed()
                    .build()
            })
            .collect();
        history(person, records)
    }
}

// ============================================================================
// MOCK IMPUTATION SERVICES
// ============================================================================

/// Fills each missing imputed cell with the column's observed mean, shifted
/// by `jitter` per completion. Records every call.
#[derive(Debug, Default)]
pub struct MockImputationService {
    jitter: f64,
    calls: Mutex<Vec<(EmploymentStratum, usize, u64)>>,
}

impl MockImputationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jitter(jitter: f64) -> Self {
        Self {
            jitter,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(stratum, m, seed)` per call, in call order.
    pub fn calls(&self) -> Vec<(EmploymentStratum, usize, u64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn column_mean(matrix: &DesignMatrix, col: usize) -> f64 {
        let observed: Vec<f64> = (0..matrix.rows())
            .filter_map(|row| matrix.get(row, col))
            .collect();
        if observed.is_empty() {
            0.0
        } else {
            observed.iter().sum::<f64>() / observed.len() as f64
        }
    }
}

impl ImputationService for MockImputationService {
    fn run(
        &self,
        matrix: &DesignMatrix,
        methods: &MethodSpec,
        _predictors: &PredictorSpec,
        m: usize,
        seed: u64,
    ) -> Result<Vec<DesignMatrix>, ServiceFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((matrix.stratum(), m, seed));
        }
        let means: Vec<f64> = (0..matrix.cols())
            .map(|col| Self::column_mean(matrix, col))
            .collect();
        Ok((0..m)
            .map(|iteration| {
                let cells = (0..matrix.rows())
                    .map(|row| {
                        (0..matrix.cols())
                            .map(|col| match (matrix.get(row, col), methods.methods.get(col)) {
                                (None, Some(Some(_))) => {
                                    Some(means[col] + self.jitter * iteration as f64)
                                }
                                (value, _) => value,
                            })
                            .collect()
                    })
                    .collect();
                matrix.with_cells(cells)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock-mean"
    }
}

/// Fails for one stratum at a given completion.
#[derive(Debug, Clone)]
pub struct FailingImputationService {
    pub stratum: EmploymentStratum,
    pub iteration: usize,
    pub reason: String,
}

impl ImputationService for FailingImputationService {
    fn run(
        &self,
        matrix: &DesignMatrix,
        methods: &MethodSpec,
        predictors: &PredictorSpec,
        m: usize,
        seed: u64,
    ) -> Result<Vec<DesignMatrix>, ServiceFailure> {
        if matrix.stratum() == self.stratum {
            return Err(ServiceFailure::new(self.iteration, self.reason.clone()));
        }
        MockImputationService::new().run(matrix, methods, predictors, m, seed)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Panel invariant assertions.

    use super::*;

    /// Included waves form one run of consecutive cadence years, or none.
    pub fn assert_contiguous_inclusion(history: &PersonHistory, cadence: i32) {
        let included: Vec<i32> = history
            .waves()
            .iter()
            .filter(|w| w.wave.included)
            .map(|w| w.year)
            .collect();
        for pair in included.windows(2) {
            assert_eq!(
                pair[1] - pair[0],
                cadence,
                "included years {:?} for person {} are not contiguous",
                included,
                history.person_id()
            );
        }
        if let (Some(first), Some(last)) = (included.first(), included.last()) {
            let skipped = history
                .waves()
                .iter()
                .any(|w| w.year > *first && w.year < *last && !w.wave.included);
            assert!(!skipped, "a wave inside the included run is excluded");
        }
    }

    /// Spell sides agree with their exact and minimum counts.
    pub fn assert_spell_consistent(record: &PersonYearRecord) {
        for side in [record.spell.pre_interview, record.spell.post_interview]
            .into_iter()
            .flatten()
        {
            if let Some(exact) = side.exact {
                assert!(side.min >= exact, "min below exact for {}", record.key());
                assert!(!side.censored, "censored side with exact for {}", record.key());
            } else {
                assert!(side.censored, "uncensored side without exact for {}", record.key());
            }
        }
    }
}
