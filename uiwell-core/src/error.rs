//! Error types for uiwell operations

use crate::enums::EmploymentStratum;
use crate::identity::{PersonId, WaveKey};
use std::fmt;
use thiserror::Error;

/// Interview month outside 1..=12.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Invalid interview month: {0}")]
pub struct InvalidMonth(pub u8);

/// Pipeline stage that raised an integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LeadConstruction,
    SpellReconstruction,
    BenefitWindow,
    ContextJoin,
    WaveSelection,
    OutcomeAlignment,
    PostImputation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LeadConstruction => "lead_construction",
            Stage::SpellReconstruction => "spell_reconstruction",
            Stage::BenefitWindow => "benefit_window",
            Stage::ContextJoin => "context_join",
            Stage::WaveSelection => "wave_selection",
            Stage::OutcomeAlignment => "outcome_alignment",
            Stage::PostImputation => "post_imputation",
        };
        f.write_str(name)
    }
}

/// Panel assembly errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("Duplicate wave for person {person_id} in year {year}")]
    DuplicateWave { person_id: PersonId, year: i32 },

    #[error("Record for person {found} placed in history of person {expected}")]
    MixedPerson { expected: PersonId, found: PersonId },
}

/// A record fell into no anticipated branch of a case analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Integrity failure in {stage} for person {person_id} year {year}: {reason}")]
pub struct IntegrityError {
    pub person_id: PersonId,
    pub year: i32,
    pub stage: Stage,
    pub reason: String,
}

impl IntegrityError {
    pub fn new(person_id: PersonId, year: i32, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            person_id,
            year,
            stage,
            reason: reason.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Imputation-service and merge errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImputationError {
    #[error("Imputation failed for stratum {stratum} (seed {seed}, iteration {iteration}): {reason}")]
    ServiceFailed {
        stratum: EmploymentStratum,
        seed: u64,
        iteration: usize,
        reason: String,
    },

    #[error("Expected {expected} completed datasets for stratum {stratum}, got {got}")]
    CompletionCount {
        stratum: EmploymentStratum,
        expected: usize,
        got: usize,
    },

    #[error("Completed dataset {iteration} for stratum {stratum} has shape {got_rows}x{got_cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        stratum: EmploymentStratum,
        iteration: usize,
        expected_rows: usize,
        expected_cols: usize,
        got_rows: usize,
        got_cols: usize,
    },

    #[error("Completed dataset {iteration} for stratum {stratum} reorders rows at {row}: expected {expected}, got {got}")]
    RowKeyMismatch {
        stratum: EmploymentStratum,
        iteration: usize,
        row: usize,
        expected: WaveKey,
        got: WaveKey,
    },

    #[error("Completed dataset {iteration} for stratum {stratum} left {column} missing for {key}")]
    UnfilledCell {
        stratum: EmploymentStratum,
        iteration: usize,
        key: WaveKey,
        column: String,
    },

    #[error("Invalid imputation spec for stratum {stratum}: {reason}")]
    InvalidSpec {
        stratum: EmploymentStratum,
        reason: String,
    },
}

/// Master error type for all uiwell errors.
#[derive(Debug, Clone, Error)]
pub enum UiwellError {
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Imputation error: {0}")]
    Imputation(#[from] ImputationError),
}

/// Result type alias for uiwell operations.
pub type UiwellResult<T> = Result<T, UiwellError>;

// =============================================================================
// TESTS
// =============================================================================
