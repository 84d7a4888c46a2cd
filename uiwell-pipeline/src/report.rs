//! Run reports
//!
//! Every stage returns its own counts; the pipeline folds them into one
//! serializable report per run and logs it as JSON.

use serde::{Deserialize, Serialize};
use uiwell_align::AlignStats;
use uiwell_benefit::{BenefitStats, ZeroImputationStats};
use uiwell_context::ContextStats;
use uiwell_core::{IntegrityError, PersonId};
use uiwell_impute::ImputationStats;
use uiwell_spell::SpellStats;
use uiwell_waves::WaveStats;

/// An integrity failure that removed one person from the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFailure {
    pub person_id: PersonId,
    pub year: i32,
    pub stage: String,
    pub reason: String,
}

impl From<&IntegrityError> for IntegrityFailure {
    fn from(err: &IntegrityError) -> Self {
        Self {
            person_id: err.person_id,
            year: err.year,
            stage: err.stage.to_string(),
            reason: err.reason.clone(),
        }
    }
}

/// Counts from one person's pass through the reconstruction stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonReport {
    pub spell: SpellStats,
    pub benefit: BenefitStats,
    pub context: ContextStats,
    pub zero_imputation: ZeroImputationStats,
    pub waves: WaveStats,
}

/// Reconstruction counts for a whole panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub persons: usize,
    pub records: usize,
    pub spell: SpellStats,
    pub benefit: BenefitStats,
    pub context: ContextStats,
    pub zero_imputation: ZeroImputationStats,
    pub waves: WaveStats,
    pub integrity_failures: Vec<IntegrityFailure>,
}

impl RunReport {
    pub fn add_person(&mut self, person: &PersonReport) {
        self.spell.merge(&person.spell);
        self.benefit.merge(&person.benefit);
        self.context.merge(&person.context);
        self.zero_imputation.merge(&person.zero_imputation);
        self.waves.merge(&person.waves);
    }

    pub fn add_failure(&mut self, err: &IntegrityError) {
        self.integrity_failures.push(IntegrityFailure::from(err));
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Emit the report, plus warnings for aggregated misses and failures.
    pub fn log(&self) {
        match self.to_json() {
            Ok(json) => tracing::info!(report = %json, "Reconstruction complete"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize run report"),
        }
        if self.context.misses() > 0 {
            tracing::warn!(
                ui_rule_misses = self.context.ui_rule_misses,
                macro_misses = self.context.macro_misses,
                without_state = self.context.without_state,
                "State table lookups missed"
            );
        }
        if !self.integrity_failures.is_empty() {
            tracing::warn!(
                persons = self.integrity_failures.len(),
                "Persons dropped after integrity failures"
            );
        }
    }
}

/// Imputation counts plus per-completion alignment counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub imputation: ImputationStats,
    pub alignment: Vec<AlignStats>,
}

impl CompletionReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn log(&self) {
        match self.to_json() {
            Ok(json) => tracing::info!(report = %json, "Completions aligned"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize completion report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_core::Stage;

    #[test]
    fn test_add_person_merges_every_stage() {
        let person = PersonReport {
            spell: SpellStats {
                records: 3,
                ..SpellStats::default()
            },
            waves: WaveStats {
                persons: 1,
                included_waves: 3,
                ..WaveStats::default()
            },
            ..PersonReport::default()
        };
        let mut report = RunReport::default();
        report.add_person(&person);
        report.add_person(&person);
        assert_eq!(report.spell.records, 6);
        assert_eq!(report.waves.persons, 2);
        assert_eq!(report.waves.included_waves, 6);
    }

    #[test]
    fn test_failures_serialize_with_stage_name() {
        let mut report = RunReport::default();
        report.add_failure(&IntegrityError::new(
            PersonId(4003),
            2005,
            Stage::BenefitWindow,
            "receipt denied on a partially observed window",
        ));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["integrity_failures"][0]["person_id"], 4003);
        assert_eq!(json["integrity_failures"][0]["stage"], "benefit_window");
    }
}
