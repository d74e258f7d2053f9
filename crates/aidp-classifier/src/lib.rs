//! Binary probabilistic classification: train, evaluate, predict, persist.
//!
//! Provides standardized L2-regularised logistic regression fitted by
//! deterministic full-batch gradient descent, stratified holdout
//! evaluation, the binary performance metrics used in training reports,
//! and versioned model serialization.

mod config;
mod error;
mod eval;
mod metrics;
mod model;
mod scaler;
mod serialize;

pub use config::LogisticConfig;
pub use error::ClassifierError;
pub use eval::{HoldoutEvaluation, HoldoutResult, HoldoutSplit};
pub use metrics::{BinaryMetrics, ConfusionMatrix, roc_auc};
pub use model::{DECISION_THRESHOLD, LogisticModel};
pub use scaler::Standardizer;
