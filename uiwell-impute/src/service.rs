//! Imputation service seam.

use thiserror::Error;
use uiwell_core::{EmploymentStratum, ImputationError};

use crate::design::DesignMatrix;
use crate::spec::{MethodSpec, PredictorSpec};

/// Failure reported by an imputation backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("iteration {iteration}: {reason}")]
pub struct ServiceFailure {
    pub iteration: usize,
    pub reason: String,
}

impl ServiceFailure {
    pub fn new(iteration: usize, reason: impl Into<String>) -> Self {
        Self {
            iteration,
            reason: reason.into(),
        }
    }

    pub fn into_error(self, stratum: EmploymentStratum, seed: u64) -> ImputationError {
        ImputationError::ServiceFailed {
            stratum,
            seed,
            iteration: self.iteration,
            reason: self.reason,
        }
    }
}

/// A multiple-imputation backend.
///
/// `run` is one synchronous batch for one stratum and returns `m` completed
/// copies of `matrix` with the same rows and columns. Only cells that were
/// missing in `matrix` and have a method are read back.
pub trait ImputationService: Send + Sync {
    fn run(
        &self,
        matrix: &DesignMatrix,
        methods: &MethodSpec,
        predictors: &PredictorSpec,
        m: usize,
        seed: u64,
    ) -> Result<Vec<DesignMatrix>, ServiceFailure>;

    fn name(&self) -> &str {
        "imputation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_stratum_and_seed() {
        let err = ServiceFailure::new(2, "did not converge").into_error(EmploymentStratum::Employed, 7);
        assert_eq!(
            err,
            ImputationError::ServiceFailed {
                stratum: EmploymentStratum::Employed,
                seed: 7,
                iteration: 2,
                reason: "did not converge".to_string(),
            }
        );
    }
}
