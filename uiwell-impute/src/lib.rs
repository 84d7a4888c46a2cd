//! uiwell Impute - Multiple Imputation Interface
//!
//! The imputation procedure itself is an external service. This crate builds
//! its inputs (per-stratum design matrices, method vectors and predictor
//! matrices from declarative specs), validates what comes back, merges each
//! completion into its own panel copy, and re-derives the fields that follow
//! directly from imputed values.

pub mod design;
pub mod merge;
pub mod post;
pub mod service;
pub mod spec;

pub use design::{DesignColumn, DesignMatrix};
pub use merge::{impute_panel, Completed, ImputationPlan, ImputationStats, StratumStats};
pub use post::{rederive, RederiveStats, Rederived};
pub use service::{ImputationService, ServiceFailure};
pub use spec::{ImputationMethod, MethodSpec, PredictorSpec, StratumSpec};
