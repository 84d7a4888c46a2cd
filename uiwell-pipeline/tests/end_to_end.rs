//! Full run over in-memory sources: assembly, reconstruction, imputation and
//! alignment.

use uiwell_context::{InMemoryStateTables, StateLookups};
use uiwell_core::{
    Half, HalfYear, Panel, PersonHistory, Quarter, StateFips, StateMacro, StateUiRules,
    StudyConfig, YearQuarter,
};
use uiwell_impute::ImputationPlan;
use uiwell_pipeline::{
    assemble_panel, init_tracing, DemographicRow, InMemorySources, PanelSources, Pipeline,
    TelemetryConfig,
};
use uiwell_test_utils::assertions::{assert_contiguous_inclusion, assert_spell_consistent};
use uiwell_test_utils::fixtures::{churning_history, history_at_years};
use uiwell_test_utils::MockImputationService;

fn fixtures() -> Vec<PersonHistory> {
    vec![
        churning_history(1001, 2001, 7),
        churning_history(2002, 2003, 5),
        history_at_years(3003, &[2001, 2003, 2007, 2009, 2011, 2013]),
        history_at_years(4004, &[2005]),
    ]
}

fn sources(histories: &[PersonHistory]) -> InMemorySources {
    let mut sources = InMemorySources::new();
    for record in histories.iter().flat_map(PersonHistory::waves) {
        let key = record.key();
        sources.insert_demographics(
            key,
            DemographicRow {
                interview_month: record.interview_month.map(u8::from),
                interview_year: Some(record.interview_year),
                state: record.state,
                demographics: record.demographics.clone(),
            },
        );
        sources.insert_employment(key, record.employment.clone());
        if let Some(report) = &record.ui_report {
            sources.insert_ui(key, report.clone());
        }
        if let Some(outcome) = record.outcome {
            sources.insert_outcome(key, outcome);
        }
    }
    sources
}

/// Michigan rules and indicators for every period the fixtures can reach.
fn state_tables() -> InMemoryStateTables {
    let mut tables = InMemoryStateTables::new();
    let state = StateFips(26);
    for year in 1995..=2020 {
        for half in [Half::First, Half::Second] {
            tables.insert_ui_rules(
                state,
                HalfYear { year, half },
                StateUiRules {
                    max_weekly_benefit: Some(362.0),
                    max_duration_weeks: Some(26.0),
                    min_base_wage: Some(2_500.0),
                    min_base_hours: None,
                    min_base_weeks: Some(20.0),
                },
            );
        }
        for quarter in [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4] {
            tables.insert_macro(
                state,
                YearQuarter { year, quarter },
                StateMacro {
                    gsp_per_capita: Some(41_000.0),
                    unemployment_rate: Some(7.2),
                },
            );
        }
    }
    tables
}

#[test]
fn test_assembly_reproduces_raw_records() {
    let histories = fixtures();
    let sources = sources(&histories);
    let (panel, stats) =
        assemble_panel(&sources.keys(), PanelSources::from_one(&sources)).unwrap();

    assert_eq!(panel, Panel::from_histories(histories));
    assert_eq!(stats.persons, 4);
    assert_eq!(stats.records, 19);
    assert_eq!(stats.without_demographics, 0);
}

#[test]
fn test_full_run_upholds_panel_invariants() {
    let _ = init_tracing(&TelemetryConfig {
        default_filter: "uiwell=warn".to_string(),
        json: true,
    });

    let histories = fixtures();
    let sources = sources(&histories);
    let tables = state_tables();
    let config = StudyConfig::default();
    let pipeline = Pipeline::new(config.clone(), StateLookups::from_tables(&tables));

    let (panel, _) = assemble_panel(&sources.keys(), PanelSources::from_one(&sources)).unwrap();
    let (reconstructed, completed) = pipeline
        .run(
            panel,
            &ImputationPlan::study(3, 2024),
            &MockImputationService::with_jitter(0.25),
        )
        .unwrap();

    let report = &reconstructed.report;
    assert_eq!(report.persons, 4);
    assert_eq!(report.records, 19);
    assert!(report.integrity_failures.is_empty());
    assert_eq!(report.context.misses(), 0);
    // The single-wave person can never be included.
    assert!(report.waves.persons_included <= 3);

    for history in reconstructed.panel.histories() {
        assert_contiguous_inclusion(history, config.wave_cadence_years);
        for record in history.waves() {
            assert_spell_consistent(record);
            if record.interview_month.is_some() && record.state.is_some() {
                assert!(record.context.ui_rules.is_some(), "{}", record.key());
                assert!(record.context.macro_indicators.is_some(), "{}", record.key());
            }
        }
    }

    assert_eq!(completed.panels.len(), 3);
    assert_eq!(completed.report.alignment.len(), 3);
    assert_eq!(completed.report.imputation.completions, 3);
    for panel in &completed.panels {
        for record in panel.histories().iter().flat_map(PersonHistory::waves) {
            match &record.alignment {
                Some(aligned) => {
                    assert!(record.wave.included);
                    if let Some(lead) = aligned.lead {
                        assert!(lead.wave_offset >= 0);
                        if let Some(base) = aligned.base {
                            assert!(base.wave_offset < lead.wave_offset);
                        }
                    }
                }
                None => assert!(!record.wave.included),
            }
        }
    }
}

#[test]
fn test_run_report_is_json() {
    let histories = fixtures();
    let tables = InMemoryStateTables::new();
    let pipeline = Pipeline::new(StudyConfig::default(), StateLookups::from_tables(&tables));
    let reconstructed = pipeline
        .reconstruct(Panel::from_histories(histories))
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&reconstructed.report.to_json().unwrap()).unwrap();
    assert_eq!(json["persons"], 4);
    assert!(json["integrity_failures"].as_array().unwrap().is_empty());
    // No tables at all: every record with a reference period misses both.
    assert!(reconstructed.report.context.misses() > 0);
}
