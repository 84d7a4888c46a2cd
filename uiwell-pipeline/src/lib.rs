//! uiwell Pipeline - Staged Reconstruction
//!
//! Assembles the person-year panel from its sources, runs the per-person
//! stages in parallel, hands included records to the imputation service and
//! aligns outcomes in every completed panel.
//!
//! Per person the order is fixed: spells, benefit window, state context,
//! zero-imputation of receipt, then wave selection.

pub mod assemble;
pub mod report;
pub mod sources;
pub mod telemetry;

use rayon::prelude::*;
use uiwell_align::{align_history, AlignStats};
use uiwell_benefit::{build_benefits, impute_nonreceipt};
use uiwell_context::{join_context, StateLookups};
use uiwell_core::{IntegrityError, Panel, PersonHistory, StudyConfig, UiwellResult};
use uiwell_impute::{impute_panel, Completed, ImputationPlan, ImputationService};
use uiwell_spell::reconstruct_history;
use uiwell_waves::select_waves;

pub use assemble::{assemble_panel, assemble_record, AssemblyStats, PanelSources};
pub use report::{CompletionReport, IntegrityFailure, PersonReport, RunReport};
pub use sources::{
    DemographicRow, DemographicSource, EmploymentMonthlySource, InMemorySources, OutcomeSource,
    UiMonthlySource,
};
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};

/// Panel after the per-person stages.
#[derive(Debug, Clone)]
pub struct Reconstructed {
    pub panel: Panel,
    pub report: RunReport,
}

/// Aligned completions from one imputation run.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub panels: Vec<Panel>,
    pub report: CompletionReport,
}

/// Study configuration plus the state tables joined in by context.
pub struct Pipeline<'a> {
    config: StudyConfig,
    lookups: StateLookups<'a>,
    strict: bool,
}

impl<'a> Pipeline<'a> {
    /// Strict by default: the first integrity failure aborts the run.
    pub fn new(config: StudyConfig, lookups: StateLookups<'a>) -> Self {
        Self {
            config,
            lookups,
            strict: true,
        }
    }

    /// When not strict, a failing person is excluded and recorded in the
    /// report instead.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// All per-person stages for one history.
    pub fn reconstruct_person(
        &self,
        history: &mut PersonHistory,
    ) -> Result<PersonReport, IntegrityError> {
        let spell = reconstruct_history(history, &self.config)?;
        let benefit = build_benefits(history, &self.config)?;
        let context = join_context(history, self.lookups);
        let zero_imputation = impute_nonreceipt(history, &self.config);
        let waves = select_waves(history, &self.config)?;
        Ok(PersonReport {
            spell,
            benefit,
            context,
            zero_imputation,
            waves,
        })
    }

    /// Run the per-person stages over every history in parallel.
    pub fn reconstruct(&self, mut panel: Panel) -> UiwellResult<Reconstructed> {
        let span = tracing::info_span!("reconstruct", persons = panel.histories().len());
        let _guard = span.enter();

        let outcomes: Vec<Result<PersonReport, IntegrityError>> = panel
            .histories_mut()
            .par_iter_mut()
            .map(|history| self.reconstruct_person(history))
            .collect();

        let report = self.fold_outcomes(panel.histories_mut(), outcomes)?;
        report.log();
        Ok(Reconstructed { panel, report })
    }

    /// Merge per-person results in person order, applying the strictness rule.
    fn fold_outcomes(
        &self,
        histories: &mut [PersonHistory],
        outcomes: Vec<Result<PersonReport, IntegrityError>>,
    ) -> UiwellResult<RunReport> {
        let mut report = RunReport::default();
        for (history, outcome) in histories.iter_mut().zip(outcomes) {
            report.persons += 1;
            report.records += history.len();
            match outcome {
                Ok(person) => report.add_person(&person),
                Err(err) if self.strict => return Err(err.into()),
                Err(err) => {
                    tracing::debug!(
                        person_id = %err.person_id,
                        year = err.year,
                        stage = %err.stage,
                        reason = %err.reason,
                        "Person excluded after integrity failure"
                    );
                    for record in history.waves_mut() {
                        record.wave.eligible = false;
                        record.wave.included = false;
                    }
                    report.add_failure(&err);
                }
            }
        }
        Ok(report)
    }

    /// Impute the included records, then align outcomes in each completion.
    pub fn complete(
        &self,
        panel: &Panel,
        plan: &ImputationPlan,
        service: &dyn ImputationService,
    ) -> UiwellResult<CompletedRun> {
        let Completed { mut panels, stats } = impute_panel(panel, plan, service)?;

        let alignment: Vec<AlignStats> = panels
            .par_iter_mut()
            .map(|completed| {
                let mut stats = AlignStats::default();
                for history in completed.histories_mut() {
                    stats.merge(&align_history(history, &self.config));
                }
                stats
            })
            .collect();

        let report = CompletionReport {
            imputation: stats,
            alignment,
        };
        report.log();
        Ok(CompletedRun { panels, report })
    }

    /// Reconstruction followed by imputation and alignment.
    pub fn run(
        &self,
        panel: Panel,
        plan: &ImputationPlan,
        service: &dyn ImputationService,
    ) -> UiwellResult<(Reconstructed, CompletedRun)> {
        let reconstructed = self.reconstruct(panel)?;
        let completed = self.complete(&reconstructed.panel, plan, service)?;
        Ok((reconstructed, completed))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uiwell_context::InMemoryStateTables;
    use uiwell_core::{PersonId, Stage, UiwellError};
    use uiwell_test_utils::fixtures::{churning_history, history_at_years};
    use uiwell_test_utils::{MockImputationService, RecordBuilder};

    #[test]
    fn test_reconstruct_counts_every_person() {
        let tables = InMemoryStateTables::new();
        let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables));
        let panel = Panel::from_histories(vec![
            churning_history(1, 2001, 6),
            history_at_years(2, &[2001, 2003]),
        ]);

        let out = pipeline.reconstruct(panel).unwrap();
        assert_eq!(out.report.persons, 2);
        assert_eq!(out.report.records, 8);
        assert_eq!(out.report.waves.persons, 2);
        assert_eq!(out.report.spell.records, 8);
        assert!(out.report.integrity_failures.is_empty());
        // Person 2 has too few waves to be included.
        assert!(out.panel.histories()[1]
            .waves()
            .iter()
            .all(|w| !w.wave.included));
    }

    #[test]
    fn test_complete_aligns_each_completion() {
        let tables = InMemoryStateTables::new();
        let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables));
        let panel = Panel::from_histories(vec![churning_history(1, 2001, 6)]);
        let reconstructed = pipeline.reconstruct(panel).unwrap();

        let run = pipeline
            .complete(
                &reconstructed.panel,
                &ImputationPlan::study(2, 11),
                &MockImputationService::new(),
            )
            .unwrap();
        assert_eq!(run.panels.len(), 2);
        assert_eq!(run.report.alignment.len(), 2);
        let included = reconstructed.report.waves.included_waves;
        for stats in &run.report.alignment {
            assert_eq!(stats.records, included);
        }
    }

    #[test]
    fn test_reconstruct_person_leaves_unknown_history_unincluded() {
        let tables = InMemoryStateTables::new();
        let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables));
        let mut h = uiwell_test_utils::history(1, vec![RecordBuilder::new(1, 2005).build()]);
        let person = pipeline.reconstruct_person(&mut h).unwrap();
        assert_eq!(person.spell.records, 1);
        assert_eq!(person.spell.lead_unknown, 1);
        assert_eq!(person.waves.persons_included, 0);
    }

    fn failing(person: u64) -> Result<PersonReport, IntegrityError> {
        Err(IntegrityError::new(
            PersonId(person),
            2005,
            Stage::SpellReconstruction,
            "first unemployed month 30 outside window",
        ))
    }

    #[test]
    fn test_strict_run_stops_at_first_failure() {
        let tables = InMemoryStateTables::new();
        let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables));
        let mut histories = vec![history_at_years(1, &[2001, 2003, 2005])];
        let err = pipeline
            .fold_outcomes(&mut histories, vec![failing(1)])
            .unwrap_err();
        assert!(matches!(err, UiwellError::Integrity(_)));
    }

    #[test]
    fn test_lenient_run_excludes_failing_person() {
        let tables = InMemoryStateTables::new();
        let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables))
            .with_strict(false);
        let mut histories = vec![
            history_at_years(1, &[2001, 2003, 2005]),
            history_at_years(2, &[2001, 2003, 2005]),
        ];
        for record in histories[0].waves_mut() {
            record.wave.included = true;
        }
        let ok = PersonReport {
            waves: uiwell_waves::WaveStats {
                persons: 1,
                ..uiwell_waves::WaveStats::default()
            },
            ..PersonReport::default()
        };

        let report = pipeline
            .fold_outcomes(&mut histories, vec![failing(1), Ok(ok)])
            .unwrap();
        assert_eq!(report.persons, 2);
        assert_eq!(report.records, 6);
        assert_eq!(report.waves.persons, 1);
        assert_eq!(report.integrity_failures.len(), 1);
        assert_eq!(report.integrity_failures[0].stage, "spell_reconstruction");
        assert!(histories[0].waves().iter().all(|w| !w.wave.included));
    }
}
