//! Enum types for person-year records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// EMPLOYMENT
// ============================================================================

/// Raw monthly employment code as recalled by the respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentCode {
    Employed,
    NotEmployed,
}

impl EmploymentCode {
    /// Inverse coding used by the unemployment flags.
    pub fn is_unemployed(self) -> bool {
        matches!(self, EmploymentCode::NotEmployed)
    }
}

/// Employment status reported at interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Employed,
    TemporarilyLaidOff,
    Unemployed,
    Retired,
    Disabled,
    Homemaker,
    Student,
    Other,
}

impl EmploymentStatus {
    /// Numeric code used in design matrices.
    pub fn code(self) -> u8 {
        match self {
            EmploymentStatus::Employed => 1,
            EmploymentStatus::TemporarilyLaidOff => 2,
            EmploymentStatus::Unemployed => 3,
            EmploymentStatus::Retired => 4,
            EmploymentStatus::Disabled => 5,
            EmploymentStatus::Homemaker => 6,
            EmploymentStatus::Student => 7,
            EmploymentStatus::Other => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EmploymentStatus::Employed),
            2 => Some(EmploymentStatus::TemporarilyLaidOff),
            3 => Some(EmploymentStatus::Unemployed),
            4 => Some(EmploymentStatus::Retired),
            5 => Some(EmploymentStatus::Disabled),
            6 => Some(EmploymentStatus::Homemaker),
            7 => Some(EmploymentStatus::Student),
            8 => Some(EmploymentStatus::Other),
            _ => None,
        }
    }
}

/// Imputation stratum, split on the 12-month lead indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmploymentStratum {
    /// Lead indicator known to be false.
    Employed,
    /// Lead indicator true or unknown.
    AtRisk,
}

impl EmploymentStratum {
    pub const ALL: [EmploymentStratum; 2] = [EmploymentStratum::Employed, EmploymentStratum::AtRisk];

    pub fn of_lead(unemployed_in_12mo_lead: Option<bool>) -> Self {
        match unemployed_in_12mo_lead {
            Some(false) => EmploymentStratum::Employed,
            Some(true) | None => EmploymentStratum::AtRisk,
        }
    }
}

impl fmt::Display for EmploymentStratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmploymentStratum::Employed => write!(f, "employed"),
            EmploymentStratum::AtRisk => write!(f, "at_risk"),
        }
    }
}

// ============================================================================
// SPELLS
// ============================================================================

/// Censoring of a combined unemployment spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CensoringKind {
    #[serde(rename = "actual")]
    Actual,
    #[serde(rename = "cens_left")]
    LeftCensored,
    #[serde(rename = "cens_right")]
    RightCensored,
    #[serde(rename = "cens_both")]
    BothCensored,
}

impl CensoringKind {
    pub fn from_sides(left: bool, right: bool) -> Self {
        match (left, right) {
            (false, false) => CensoringKind::Actual,
            (true, false) => CensoringKind::LeftCensored,
            (false, true) => CensoringKind::RightCensored,
            (true, true) => CensoringKind::BothCensored,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CensoringKind::Actual => "actual",
            CensoringKind::LeftCensored => "cens_left",
            CensoringKind::RightCensored => "cens_right",
            CensoringKind::BothCensored => "cens_both",
        }
    }
}

impl fmt::Display for CensoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid censoring label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensoringKindParseError(pub String);

impl fmt::Display for CensoringKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid censoring kind: {}", self.0)
    }
}

impl std::error::Error for CensoringKindParseError {}

impl FromStr for CensoringKind {
    type Err = CensoringKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "actual" => Ok(CensoringKind::Actual),
            "cens_left" => Ok(CensoringKind::LeftCensored),
            "cens_right" => Ok(CensoringKind::RightCensored),
            "cens_both" => Ok(CensoringKind::BothCensored),
            _ => Err(CensoringKindParseError(s.to_string())),
        }
    }
}

// ============================================================================
// BENEFITS
// ============================================================================

/// Receipt of unemployment insurance inside the post-onset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiReceipt {
    Received,
    NotReceived,
    /// Filled by the disqualification rule or by multiple imputation rather
    /// than observed.
    ImputedNotReceived,
}

impl UiReceipt {
    pub fn received(self) -> bool {
        matches!(self, UiReceipt::Received)
    }

    pub fn is_imputed(self) -> bool {
        matches!(self, UiReceipt::ImputedNotReceived)
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Employment transition across the previous and current wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransitionPattern {
    StablyEmployed,
    NewlyUnemployed,
    NewlyReemployed,
    StablyUnemployed,
    #[default]
    Unknown,
}

impl TransitionPattern {
    pub fn from_leads(previous: Option<bool>, current: Option<bool>) -> Self {
        match (previous, current) {
            (Some(false), Some(false)) => TransitionPattern::StablyEmployed,
            (Some(false), Some(true)) => TransitionPattern::NewlyUnemployed,
            (Some(true), Some(false)) => TransitionPattern::NewlyReemployed,
            (Some(true), Some(true)) => TransitionPattern::StablyUnemployed,
            _ => TransitionPattern::Unknown,
        }
    }
}

// ============================================================================
// REFERENCE PERIODS
// ============================================================================

/// Half of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Half {
    First,
    Second,
}

impl Half {
    pub fn number(self) -> u8 {
        match self {
            Half::First => 1,
            Half::Second => 2,
        }
    }
}

/// Quarter of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn number(self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

/// What a reference period was anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceAnchor {
    /// First unemployed month of the spell.
    SpellOnset,
    /// Interview month, when no onset is confirmed.
    InterviewMonth,
}
