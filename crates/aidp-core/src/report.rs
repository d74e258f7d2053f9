//! Per-track training performance reports.

use aidp_classifier::BinaryMetrics;

use crate::domain::ModelKey;
use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::grouping::Grouping;

/// Metric names in report column order, without the partition suffix.
pub const METRIC_NAMES: [&str; 11] = [
    "recall",
    "precision",
    "auc",
    "specificity",
    "npv",
    "accuracy",
    "weighted_sensitivity",
    "weighted_ppv",
    "weighted_specificity",
    "weighted_npv",
    "weighted_accuracy",
];

/// Header of a performance report: `Group`, the training metrics (`_t`),
/// then the validation metrics (`_v`).
#[must_use]
pub fn report_header() -> Vec<String> {
    let mut header = vec!["Group".to_string()];
    for suffix in ["t", "v"] {
        header.extend(METRIC_NAMES.iter().map(|m| format!("{m}_{suffix}")));
    }
    header
}

fn metric_values(m: &BinaryMetrics) -> [f64; 11] {
    [
        m.recall,
        m.precision,
        m.auc,
        m.specificity,
        m.npv,
        m.accuracy,
        m.weighted_sensitivity,
        m.weighted_ppv,
        m.weighted_specificity,
        m.weighted_npv,
        m.weighted_accuracy,
    ]
}

/// Training and validation performance for one grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    /// The grouping this row describes.
    pub grouping: Grouping,
    /// Metrics on the training partition.
    pub training: BinaryMetrics,
    /// Metrics on the validation partition.
    pub validation: BinaryMetrics,
    /// Training partition size.
    pub n_train: usize,
    /// Validation partition size.
    pub n_validation: usize,
}

impl PerformanceRecord {
    /// The 22 numeric fields in [`report_header`] order (after `Group`).
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        let mut values = metric_values(&self.training).to_vec();
        values.extend(metric_values(&self.validation));
        values
    }
}

/// All grouping records for one track and model collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    /// Track the records belong to.
    pub experiment: Experiment,
    /// Model collection the models were trained into.
    pub model_key: ModelKey,
    /// One record per grouping, in grouping order.
    pub records: Vec<PerformanceRecord>,
}

/// Destination for performance reports, supplied to the training engine.
pub trait ReportSink {
    /// Write one track's report.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the destination cannot be written.
    fn write_report(&mut self, report: &PerformanceReport) -> Result<(), CoreError>;
}

impl ReportSink for Vec<PerformanceReport> {
    fn write_report(&mut self, report: &PerformanceReport) -> Result<(), CoreError> {
        self.push(report.clone());
        Ok(())
    }
}
