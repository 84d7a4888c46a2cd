//! Declarative per-stratum imputation specs.
//!
//! A [`StratumSpec`] names the columns to impute with their method and the
//! columns that may not act as predictors. The positional method vector and
//! predictor matrix the service consumes are derived from it for a concrete
//! [`DesignMatrix`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uiwell_core::{EmploymentStratum, ImputationError};

use crate::design::{DesignColumn, DesignMatrix};
use DesignColumn as C;
use ImputationMethod as M;

/// Univariate imputation method for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImputationMethod {
    /// Predictive mean matching, for continuous and count columns.
    #[serde(rename = "pmm")]
    PredictiveMeanMatching,
    /// Logistic regression, for binary columns.
    #[serde(rename = "logreg")]
    LogisticRegression,
    /// Polytomous regression, for unordered categorical columns.
    #[serde(rename = "polyreg")]
    PolytomousRegression,
}

impl ImputationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputationMethod::PredictiveMeanMatching => "pmm",
            ImputationMethod::LogisticRegression => "logreg",
            ImputationMethod::PolytomousRegression => "polyreg",
        }
    }
}

/// Columns imputed and predictors excluded for one stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumSpec {
    pub stratum: EmploymentStratum,
    /// Columns making up the stratum's design matrix, in order.
    pub columns: Vec<DesignColumn>,
    pub imputed: Vec<(DesignColumn, ImputationMethod)>,
    pub excluded_predictors: Vec<DesignColumn>,
}

/// Method per design-matrix column; `None` leaves the column as observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub methods: Vec<Option<ImputationMethod>>,
}

/// Square predictor matrix: `rows[target][predictor]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorSpec {
    pub rows: Vec<Vec<bool>>,
}

impl PredictorSpec {
    pub fn predicts(&self, target: usize, predictor: usize) -> bool {
        self.rows
            .get(target)
            .and_then(|r| r.get(predictor))
            .copied()
            .unwrap_or(false)
    }

    pub fn predictor_count(&self, target: usize) -> usize {
        self.rows
            .get(target)
            .map(|r| r.iter().filter(|p| **p).count())
            .unwrap_or(0)
    }
}

const COVARIATES: [DesignColumn; 16] = [
    C::Age,
    C::Gender,
    C::Race,
    C::Ethnicity,
    C::Nativity,
    C::Region,
    C::MaritalStatus,
    C::EducationYears,
    C::Disability,
    C::FamilyIncome,
    C::FamilyWealth,
    C::SelfEmployed,
    C::EmploymentStatus,
    C::Occupation,
    C::LaborIncome,
    C::AnnualHours,
];

const SPELL_AND_UI: [DesignColumn; 6] = [
    C::UnemployedInLead,
    C::PreInterviewMin,
    C::PostInterviewMin,
    C::UiReceived,
    C::UiMonthsReceived,
    C::UiAnnualAmount,
];

const STATE_CONTEXT: [DesignColumn; 4] = [
    C::StateMaxDuration,
    C::StateMaxBenefit,
    C::UnemploymentRate,
    C::GspPerCapita,
];

const COVARIATE_METHODS: [(DesignColumn, ImputationMethod); 9] = [
    (C::EducationYears, M::PredictiveMeanMatching),
    (C::MaritalStatus, M::PolytomousRegression),
    (C::Disability, M::LogisticRegression),
    (C::FamilyIncome, M::PredictiveMeanMatching),
    (C::FamilyWealth, M::PredictiveMeanMatching),
    (C::EmploymentStatus, M::PolytomousRegression),
    (C::LaborIncome, M::PredictiveMeanMatching),
    (C::AnnualHours, M::PredictiveMeanMatching),
    (C::Outcome, M::PredictiveMeanMatching),
];

impl StratumSpec {
    /// Study specs: the employed stratum carries no spell or UI columns; the
    /// at-risk stratum also imputes them, except the lead indicator, which
    /// only predicts and is re-derived from employment status afterwards.
    /// Occupation codes never predict.
    pub fn for_stratum(stratum: EmploymentStratum) -> Self {
        let mut columns: Vec<DesignColumn> = COVARIATES.to_vec();
        let mut imputed = COVARIATE_METHODS.to_vec();
        match stratum {
            EmploymentStratum::Employed => {}
            EmploymentStratum::AtRisk => {
                columns.extend(SPELL_AND_UI);
                imputed.extend([
                    (C::PreInterviewMin, M::PredictiveMeanMatching),
                    (C::PostInterviewMin, M::PredictiveMeanMatching),
                    (C::UiReceived, M::LogisticRegression),
                    (C::UiMonthsReceived, M::PredictiveMeanMatching),
                    (C::UiAnnualAmount, M::PredictiveMeanMatching),
                ]);
            }
        }
        columns.extend(STATE_CONTEXT);
        columns.push(C::Outcome);
        Self {
            stratum,
            columns,
            imputed,
            excluded_predictors: vec![C::Occupation],
        }
    }

    pub fn method_for(&self, column: DesignColumn) -> Option<ImputationMethod> {
        self.imputed
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, m)| *m)
    }

    /// Validates:
    /// - no column appears twice in the matrix or the imputed list
    /// - imputed columns are in the matrix and imputable
    /// - every imputed column keeps at least one predictor
    pub fn validate(&self) -> Result<(), ImputationError> {
        let invalid = |reason: String| ImputationError::InvalidSpec {
            stratum: self.stratum,
            reason,
        };
        let unique: BTreeSet<_> = self.columns.iter().collect();
        if unique.len() != self.columns.len() {
            return Err(invalid("duplicate design column".to_string()));
        }
        let mut seen = BTreeSet::new();
        for (column, _) in &self.imputed {
            if !seen.insert(*column) {
                return Err(invalid(format!("{column} imputed twice")));
            }
            if !self.columns.contains(column) {
                return Err(invalid(format!("{column} imputed but not in the design")));
            }
            if !column.is_imputable() {
                return Err(invalid(format!("{column} is a lookup column")));
            }
            let predictors = self
                .columns
                .iter()
                .filter(|p| *p != column && !self.excluded_predictors.contains(p))
                .count();
            if predictors == 0 {
                return Err(invalid(format!("{column} has no predictors")));
            }
        }
        Ok(())
    }

    pub fn methods(&self, matrix: &DesignMatrix) -> MethodSpec {
        MethodSpec {
            methods: matrix
                .columns()
                .iter()
                .map(|c| self.method_for(*c))
                .collect(),
        }
    }

    /// Imputed targets use every other non-excluded column; observed-only
    /// columns get an empty row.
    pub fn predictors(&self, matrix: &DesignMatrix) -> PredictorSpec {
        let columns = matrix.columns();
        let rows = columns
            .iter()
            .enumerate()
            .map(|(t, target)| {
                let imputed = self.method_for(*target).is_some();
                columns
                    .iter()
                    .enumerate()
                    .map(|(p, predictor)| {
                        imputed && t != p && !self.excluded_predictors.contains(predictor)
                    })
                    .collect()
            })
            .collect();
        PredictorSpec { rows }
    }
}
