//! uiwell Core - Panel Types
//!
//! Person-year records, the month-index calendar shared by every stage,
//! person-partitioned panels, errors and study configuration. All other crates
//! depend on this one; it holds no reconstruction logic of its own.

mod calendar;
mod config;
mod enums;
mod error;
mod identity;
mod panel;
mod record;

pub use calendar::{
    all_months, month_from_index, month_index, InterviewCalendar, InterviewMonth, LeadBlock,
    LeadSource, MonthOffset, RecallBlock, FIRST_RECALL_OFFSET, LAST_LEAD_OFFSET,
    LEAD_WINDOW_MONTHS, MONTHS_PER_BLOCK,
};
pub use config::{
    AlignmentConfig, StudyConfig, UiWindowConfig, CONFIG_ENV_VAR, RECALL_CADENCE_YEARS,
};
pub use enums::{
    CensoringKind, CensoringKindParseError, EmploymentCode, EmploymentStatus, EmploymentStratum,
    Half, Quarter, ReferenceAnchor, TransitionPattern, UiReceipt,
};
pub use error::{
    ConfigError, ImputationError, IntegrityError, InvalidMonth, PanelError, Stage, UiwellError,
    UiwellResult,
};
pub use identity::{PersonId, StateFips, WaveKey};
pub use panel::{Panel, PersonHistory};
pub use record::{
    AlignedOutcome, BenefitSummary, Demographics, EmploymentHistory, ExternalContext, HalfYear,
    LeadFlags, MonthFlag, PersonYearRecord, SourcedOutcome, SpellDuration, SpellSide,
    SpellSummary, StateMacro, StateUiRules, UiYearReport, WaveTracking, YearQuarter,
};

// Month names come from chrono throughout the workspace.
pub use chrono::Month;
