//! Person-year record and its derived field groups.
//!
//! A record is created by the panel join and then enriched in place by each
//! stage. Every derived group starts out empty (`Default`) so stages can be run
//! and tested in isolation.

use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::calendar::{month_index, LeadBlock, MonthOffset, RecallBlock};
use crate::enums::{
    CensoringKind, EmploymentCode, EmploymentStatus, Half, Quarter, ReferenceAnchor,
    TransitionPattern, UiReceipt,
};
use crate::identity::{PersonId, StateFips, WaveKey};
use crate::InterviewMonth;

/// Tri-state monthly flag: `Some(true)` unemployed, `Some(false)` employed,
/// `None` unknown or structurally unavailable.
pub type MonthFlag = Option<bool>;

// ============================================================================
// RAW INPUTS
// ============================================================================

/// Monthly employment codes recalled at interview, one block per calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentHistory {
    blocks: [[Option<EmploymentCode>; 12]; 3],
}

impl Default for EmploymentHistory {
    fn default() -> Self {
        Self::unknown()
    }
}

impl EmploymentHistory {
    pub fn unknown() -> Self {
        Self {
            blocks: [[None; 12]; 3],
        }
    }

    pub fn from_blocks(blocks: [[Option<EmploymentCode>; 12]; 3]) -> Self {
        Self { blocks }
    }

    pub fn block(&self, block: RecallBlock) -> &[Option<EmploymentCode>; 12] {
        &self.blocks[block.index()]
    }

    pub fn code(&self, block: RecallBlock, month: Month) -> Option<EmploymentCode> {
        self.blocks[block.index()][month_index(month)]
    }

    pub fn set(&mut self, block: RecallBlock, month: Month, code: Option<EmploymentCode>) {
        self.blocks[block.index()][month_index(month)] = code;
    }

    /// Inverse-coded unemployment flag for a recall month.
    pub fn unemployed(&self, block: RecallBlock, month: Month) -> MonthFlag {
        self.code(block, month).map(EmploymentCode::is_unemployed)
    }

    /// Unemployment flag at an own-record offset (-23..=12).
    pub fn unemployed_at(&self, offset: MonthOffset) -> MonthFlag {
        let (block, month) = offset.recall_slot()?;
        self.unemployed(block, month)
    }
}

/// Unemployment insurance receipt reported at interview about the prior year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UiYearReport {
    /// Monthly receipt for the calendar year before the interview.
    pub receipt: [MonthFlag; 12],
    /// Annual amount received in the calendar year before the interview.
    pub annual_amount: Option<f64>,
    /// Monthly receipt two calendar years before the interview, when collected.
    pub receipt_two_years_prior: Option<[MonthFlag; 12]>,
}

impl UiYearReport {
    pub fn receipt_for(&self, block: RecallBlock, month: Month) -> MonthFlag {
        match block {
            RecallBlock::PriorYear => self.receipt[month_index(month)],
            RecallBlock::TwoYearsPrior => self
                .receipt_two_years_prior
                .as_ref()
                .and_then(|months| months[month_index(month)]),
            RecallBlock::InterviewYear => None,
        }
    }
}

/// Demographic and economic covariates from the panel join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Demographics {
    pub age: Option<u8>,
    pub gender: Option<u8>,
    pub race: Option<u8>,
    pub ethnicity: Option<u8>,
    pub nativity: Option<u8>,
    pub region: Option<u8>,
    pub marital_status: Option<u8>,
    pub education_years: Option<u8>,
    pub disability: Option<bool>,
    pub family_income: Option<f64>,
    pub family_wealth: Option<f64>,
    pub self_employed: Option<bool>,
    pub employment_status: Option<EmploymentStatus>,
    pub occupation: Option<u16>,
    /// Labor income for the calendar year before the interview.
    pub labor_income: Option<f64>,
    /// Annual hours worked in the calendar year before the interview.
    pub annual_hours: Option<f64>,
}

// ============================================================================
// DERIVED: SPELLS
// ============================================================================

/// Monthly unemployment flags read from later waves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFlags {
    blocks: [[MonthFlag; 12]; 4],
}

impl Default for LeadFlags {
    fn default() -> Self {
        Self {
            blocks: [[None; 12]; 4],
        }
    }
}

impl LeadFlags {
    pub fn get(&self, block: LeadBlock, month: Month) -> MonthFlag {
        self.blocks[block.index()][month_index(month)]
    }

    pub fn set(&mut self, block: LeadBlock, month: Month, flag: MonthFlag) {
        self.blocks[block.index()][month_index(month)] = flag;
    }

    pub fn block(&self, block: LeadBlock) -> &[MonthFlag; 12] {
        &self.blocks[block.index()]
    }

    /// Flag at a lead offset (1..=48).
    pub fn at(&self, offset: MonthOffset) -> MonthFlag {
        let (block, month) = offset.lead_slot()?;
        self.get(block, month)
    }

    pub fn known_count(&self) -> usize {
        self.blocks.iter().flatten().filter(|f| f.is_some()).count()
    }
}

/// One side (before or after the interview) of a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSide {
    /// Consecutive unemployed months, defined only without unknown months.
    pub exact: Option<u16>,
    /// Same walk treating unknown months as unemployed.
    pub min: u16,
    pub censored: bool,
}

impl SpellSide {
    pub const EMPTY: SpellSide = SpellSide {
        exact: Some(0),
        min: 0,
        censored: false,
    };
}

/// Combined spell length with its censoring kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellDuration {
    pub months: u16,
    pub censoring: CensoringKind,
}

/// Spell reconstruction results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpellSummary {
    /// True when the 12-month window has an unknown month or cannot be used.
    pub period_incomplete: bool,
    pub unemployed_in_12mo_lead: Option<bool>,
    pub first_unemployed_offset: Option<MonthOffset>,
    pub already_unemployed_at_interview: Option<bool>,
    pub pre_interview: Option<SpellSide>,
    pub post_interview: Option<SpellSide>,
    pub total: Option<SpellDuration>,
    /// Lead indicator filled from imputed employment status.
    pub lead_from_status: bool,
}

// ============================================================================
// DERIVED: BENEFITS
// ============================================================================

/// UI variables for the spell's post-onset window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BenefitSummary {
    /// Monthly receipt flags for onset+1 ..= onset+window.
    pub window_receipt: Vec<MonthFlag>,
    pub window_fully_observed: bool,
    pub received_in_window: Option<UiReceipt>,
    pub months_received: Option<u8>,
    pub annual_amount: Option<f64>,
    pub monthly_amount: Option<f64>,
    /// Employed weeks in the 12 months before onset.
    pub base_period_weeks: Option<f64>,
}

// ============================================================================
// DERIVED: EXTERNAL CONTEXT
// ============================================================================

/// Year and half-year used to look up state UI rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HalfYear {
    pub year: i32,
    pub half: Half,
}

/// Year and quarter used to look up state macro indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearQuarter {
    pub year: i32,
    pub quarter: Quarter,
}

/// State UI program rules for a half-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateUiRules {
    pub max_weekly_benefit: Option<f64>,
    pub max_duration_weeks: Option<f64>,
    pub min_base_wage: Option<f64>,
    pub min_base_hours: Option<f64>,
    pub min_base_weeks: Option<f64>,
}

/// State macro indicators for a quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateMacro {
    pub gsp_per_capita: Option<f64>,
    pub unemployment_rate: Option<f64>,
}

/// Reference periods and joined state context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExternalContext {
    pub anchor: Option<ReferenceAnchor>,
    pub ui_period: Option<HalfYear>,
    pub macro_period: Option<YearQuarter>,
    pub ui_rules: Option<StateUiRules>,
    pub macro_indicators: Option<StateMacro>,
}

impl ExternalContext {
    pub fn state_max_duration(&self) -> Option<f64> {
        self.ui_rules.as_ref().and_then(|r| r.max_duration_weeks)
    }

    pub fn state_max_benefit(&self) -> Option<f64> {
        self.ui_rules.as_ref().and_then(|r| r.max_weekly_benefit)
    }

    pub fn unemployment_rate(&self) -> Option<f64> {
        self.macro_indicators
            .as_ref()
            .and_then(|m| m.unemployment_rate)
    }

    pub fn gsp_per_capita(&self) -> Option<f64> {
        self.macro_indicators.as_ref().and_then(|m| m.gsp_per_capita)
    }
}

// ============================================================================
// DERIVED: WAVES AND OUTCOMES
// ============================================================================

/// Panel-eligibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WaveTracking {
    pub eligible: bool,
    pub included: bool,
    /// Length of the person's longest eligible run (same on every wave).
    pub longest_run_length: u16,
}

/// An outcome value with the wave offset it came from (negative = earlier).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcedOutcome {
    pub value: f64,
    pub wave_offset: i16,
}

/// Before/after outcome alignment for one wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlignedOutcome {
    pub now: Option<SourcedOutcome>,
    pub next: Option<SourcedOutcome>,
    pub base_far: Option<SourcedOutcome>,
    pub lag1: Option<f64>,
    pub pattern: TransitionPattern,
    pub lead: Option<SourcedOutcome>,
    pub base: Option<SourcedOutcome>,
}

// ============================================================================
// RECORD
// ============================================================================

/// One row per (person, wave year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonYearRecord {
    pub person_id: PersonId,
    /// Wave year; lead relationships are exact offsets in this year.
    pub year: i32,
    /// Calendar year of the interview; anchors reference periods.
    pub interview_year: i32,
    pub interview_month: Option<InterviewMonth>,
    pub state: Option<StateFips>,
    pub demographics: Demographics,
    pub employment: EmploymentHistory,
    pub ui_report: Option<UiYearReport>,
    pub outcome: Option<f64>,

    pub lead_flags: LeadFlags,
    pub spell: SpellSummary,
    pub benefit: BenefitSummary,
    pub context: ExternalContext,
    pub wave: WaveTracking,
    pub alignment: Option<AlignedOutcome>,
}

impl PersonYearRecord {
    /// New record with raw inputs unknown and no derived fields.
    pub fn new(person_id: PersonId, year: i32) -> Self {
        Self {
            person_id,
            year,
            interview_year: year,
            interview_month: None,
            state: None,
            demographics: Demographics::default(),
            employment: EmploymentHistory::unknown(),
            ui_report: None,
            outcome: None,
            lead_flags: LeadFlags::default(),
            spell: SpellSummary::default(),
            benefit: BenefitSummary::default(),
            context: ExternalContext::default(),
            wave: WaveTracking::default(),
            alignment: None,
        }
    }

    pub fn key(&self) -> WaveKey {
        WaveKey::new(self.person_id, self.year)
    }
}
