//! Running the service per stratum and merging completions into panels.

use serde::{Deserialize, Serialize};
use uiwell_core::{EmploymentStratum, ImputationError, Panel, PersonYearRecord};

use crate::design::DesignMatrix;
use crate::post::{rederive, RederiveStats};
use crate::service::ImputationService;
use crate::spec::StratumSpec;

/// How many completions to draw and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationPlan {
    pub specs: Vec<StratumSpec>,
    pub m: usize,
    pub seed: u64,
}

impl ImputationPlan {
    /// Study strata with their default specs.
    pub fn study(m: usize, seed: u64) -> Self {
        Self {
            specs: EmploymentStratum::ALL
                .into_iter()
                .map(StratumSpec::for_stratum)
                .collect(),
            m,
            seed,
        }
    }

    pub fn validate(&self) -> Result<(), ImputationError> {
        for spec in &self.specs {
            spec.validate()?;
        }
        if self.m == 0 {
            if let Some(spec) = self.specs.first() {
                return Err(ImputationError::InvalidSpec {
                    stratum: spec.stratum,
                    reason: "at least one completion is required".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Per-stratum counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratumStats {
    pub stratum: EmploymentStratum,
    pub rows: usize,
    pub missing_cells: usize,
    pub imputed_cells: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImputationStats {
    pub strata: Vec<StratumStats>,
    pub completions: usize,
    pub rederived: RederiveStats,
}

/// `m` completed panels plus counts.
#[derive(Debug, Clone)]
pub struct Completed {
    pub panels: Vec<Panel>,
    pub stats: ImputationStats,
}

/// A stratum's matrix and its validated completions.
struct StratumRun<'a> {
    spec: &'a StratumSpec,
    matrix: DesignMatrix,
    completions: Vec<DesignMatrix>,
}

impl StratumRun<'_> {
    /// Cells the service is expected to fill.
    fn targets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let columns = self.matrix.columns();
        (0..self.matrix.rows()).flat_map(move |row| {
            columns.iter().enumerate().filter_map(move |(col, column)| {
                (self.spec.method_for(*column).is_some() && self.matrix.get(row, col).is_none())
                    .then_some((row, col))
            })
        })
    }
}

fn in_stratum(record: &PersonYearRecord, stratum: EmploymentStratum) -> bool {
    record.wave.included && EmploymentStratum::of_lead(record.spell.unemployed_in_12mo_lead) == stratum
}

/// Impute the included records of every stratum and merge the results into
/// `plan.m` independent copies of `panel`, then re-derive computed fields.
pub fn impute_panel(
    panel: &Panel,
    plan: &ImputationPlan,
    service: &dyn ImputationService,
) -> Result<Completed, ImputationError> {
    plan.validate()?;
    let mut runs = Vec::with_capacity(plan.specs.len());
    let mut stats = ImputationStats {
        completions: plan.m,
        ..ImputationStats::default()
    };

    for spec in &plan.specs {
        let matrix = DesignMatrix::from_records(
            spec.stratum,
            panel.records().filter(|r| in_stratum(r, spec.stratum)),
            &spec.columns,
        );
        if matrix.rows() == 0 {
            tracing::debug!(stratum = %spec.stratum, "Stratum has no included records");
            continue;
        }
        let methods = spec.methods(&matrix);
        let predictors = spec.predictors(&matrix);
        tracing::info!(
            stratum = %spec.stratum,
            rows = matrix.rows(),
            missing = matrix.missing_count(),
            m = plan.m,
            seed = plan.seed,
            service = service.name(),
            "Imputing stratum"
        );
        let completions = service
            .run(&matrix, &methods, &predictors, plan.m, plan.seed)
            .map_err(|failure| failure.into_error(spec.stratum, plan.seed))?;
        let run = StratumRun {
            spec,
            matrix,
            completions,
        };
        check_completions(&run, plan.m)?;
        stats.strata.push(StratumStats {
            stratum: spec.stratum,
            rows: run.matrix.rows(),
            missing_cells: run.matrix.missing_count(),
            imputed_cells: run.targets().count(),
        });
        runs.push(run);
    }

    let mut panels = Vec::with_capacity(plan.m);
    for iteration in 0..plan.m {
        let mut completed = panel.clone();
        for run in &runs {
            merge_completion(&mut completed, run, iteration);
        }
        for record in completed.records_mut().filter(|r| r.wave.included) {
            stats.rederived.observe(rederive(record));
        }
        panels.push(completed);
    }

    tracing::info!(
        completions = panels.len(),
        lead_resets = stats.rederived.lead_resets,
        "Imputation merged"
    );
    Ok(Completed { panels, stats })
}

fn check_completions(run: &StratumRun<'_>, m: usize) -> Result<(), ImputationError> {
    let stratum = run.spec.stratum;
    if run.completions.len() != m {
        return Err(ImputationError::CompletionCount {
            stratum,
            expected: m,
            got: run.completions.len(),
        });
    }
    for (iteration, completion) in run.completions.iter().enumerate() {
        let (got_rows, got_cols) = completion.shape();
        if !completion.is_rectangular()
            || got_rows != run.matrix.rows()
            || got_cols != run.matrix.cols()
            || completion.columns() != run.matrix.columns()
        {
            return Err(ImputationError::ShapeMismatch {
                stratum,
                iteration,
                expected_rows: run.matrix.rows(),
                expected_cols: run.matrix.cols(),
                got_rows,
                got_cols,
            });
        }
        if let Some((row, (expected, got))) = run
            .matrix
            .keys()
            .iter()
            .zip(completion.keys())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(ImputationError::RowKeyMismatch {
                stratum,
                iteration,
                row,
                expected: *expected,
                got: *got,
            });
        }
        if let Some((row, col)) = run
            .targets()
            .find(|(row, col)| completion.get(*row, *col).is_none())
        {
            return Err(ImputationError::UnfilledCell {
                stratum,
                iteration,
                key: run.matrix.keys()[row],
                column: run.matrix.columns()[col].name().to_string(),
            });
        }
    }
    Ok(())
}

fn merge_completion(panel: &mut Panel, run: &StratumRun<'_>, iteration: usize) {
    let completion = &run.completions[iteration];
    let columns = run.matrix.columns();
    for (row, col) in run.targets() {
        let Some(value) = completion.get(row, col) else {
            continue;
        };
        if let Some(record) = panel.find_mut(run.matrix.keys()[row]) {
            columns[col].apply(record, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceFailure;
    use crate::spec::{MethodSpec, PredictorSpec};
    use uiwell_core::{EmploymentStatus, PersonId};

    /// Fills every missing cell with a per-iteration constant.
    struct ConstantService;

    impl ImputationService for ConstantService {
        fn run(
            &self,
            matrix: &DesignMatrix,
            methods: &MethodSpec,
            _predictors: &PredictorSpec,
            m: usize,
            _seed: u64,
        ) -> Result<Vec<DesignMatrix>, ServiceFailure> {
            Ok((0..m)
                .map(|i| {
                    let cells = (0..matrix.rows())
                        .map(|row| {
                            (0..matrix.cols())
                                .map(|col| match (matrix.get(row, col), methods.methods[col]) {
                                    (None, Some(_)) => Some(i as f64 + 3.0),
                                    (value, _) => value,
                                })
                                .collect()
                        })
                        .collect();
                    matrix.with_cells(cells)
                })
                .collect())
        }
    }

    struct DroppingService;

    impl ImputationService for DroppingService {
        fn run(
            &self,
            matrix: &DesignMatrix,
            _methods: &MethodSpec,
            _predictors: &PredictorSpec,
            _m: usize,
            _seed: u64,
        ) -> Result<Vec<DesignMatrix>, ServiceFailure> {
            Ok(vec![matrix.clone()])
        }
    }

    fn panel() -> Panel {
        let mut a = PersonYearRecord::new(PersonId(1), 2005);
        a.wave.included = true;
        a.spell.unemployed_in_12mo_lead = Some(false);
        let mut b = PersonYearRecord::new(PersonId(2), 2005);
        b.wave.included = true;
        let c = PersonYearRecord::new(PersonId(3), 2005);
        Panel::from_records(vec![a, b, c]).unwrap()
    }

    #[test]
    fn test_completions_are_independent_copies() {
        let source = panel();
        let plan = ImputationPlan::study(2, 11);
        let completed = impute_panel(&source, &plan, &ConstantService).unwrap();
        assert_eq!(completed.panels.len(), 2);

        let first = &completed.panels[0];
        let second = &completed.panels[1];
        let key = uiwell_core::WaveKey::new(PersonId(2), 2005);
        // Status code 3 is Unemployed in the first completion only.
        assert_eq!(
            first.find(key).and_then(|r| r.demographics.employment_status),
            Some(EmploymentStatus::Unemployed)
        );
        assert_eq!(
            second.find(key).and_then(|r| r.demographics.employment_status),
            Some(EmploymentStatus::Retired)
        );
        // Only the Unemployed completion resets the missing lead indicator.
        assert_eq!(
            first.find(key).map(|r| (r.spell.unemployed_in_12mo_lead, r.spell.lead_from_status)),
            Some((Some(true), true))
        );
        assert_eq!(
            second.find(key).and_then(|r| r.spell.unemployed_in_12mo_lead),
            None
        );
        assert_eq!(completed.stats.rederived.lead_resets, 1);
        // The source panel is untouched and excluded records are never imputed.
        assert_eq!(source.find(key).and_then(|r| r.outcome), None);
        let excluded = uiwell_core::WaveKey::new(PersonId(3), 2005);
        assert_eq!(first.find(excluded).and_then(|r| r.outcome), None);
        assert_eq!(completed.stats.strata.len(), 2);
    }

    #[test]
    fn test_completion_count_checked() {
        let plan = ImputationPlan::study(3, 1);
        let err = impute_panel(&panel(), &plan, &DroppingService).unwrap_err();
        assert!(matches!(
            err,
            ImputationError::CompletionCount {
                expected: 3,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unfilled_cells_rejected() {
        let plan = ImputationPlan::study(1, 1);
        let err = impute_panel(&panel(), &plan, &DroppingService).unwrap_err();
        assert!(matches!(err, ImputationError::UnfilledCell { .. }));
    }

    #[test]
    fn test_zero_completions_rejected() {
        let plan = ImputationPlan::study(0, 1);
        assert!(matches!(
            plan.validate(),
            Err(ImputationError::InvalidSpec { .. })
        ));
    }
}
