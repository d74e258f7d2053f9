//! Parkinsonism classification pipeline.
//!
//! Three feature tracks (`both`, `dmri`, `clinical`) are each evaluated
//! against six pairwise diagnostic groupings. The resulting 18 probability
//! columns are merged per subject and reduced to a single diagnosis by an
//! ordered rule cascade.

mod diagnosis;
mod domain;
mod error;
mod experiment;
mod grouping;
mod pipeline;
mod report;
mod results;
mod schema;
mod store;
mod table;

pub use diagnosis::{DIAGNOSIS_COLUMN, Diagnosis, DiagnosisEngine, DiagnosisEvidence, THRESHOLD};
pub use domain::{DiagnosticClass, ModelKey, SubjectId};
pub use error::CoreError;
pub use experiment::{Experiment, TrackPredictions, TrainedTrack};
pub use grouping::{GroupedData, Grouping};
pub use pipeline::{PipelineConfig, PredictionEngine, PredictionOutcome, TrainingEngine};
pub use report::{METRIC_NAMES, PerformanceRecord, PerformanceReport, ReportSink, report_header};
pub use results::{ProbabilityColumn, ResultTable, probability_column_name};
pub use schema::{
    CLINICAL_COLUMNS, CLINICAL_SCORE_COLUMN, ColumnSchema, LABEL_COLUMN, SUBJECT_COLUMN,
};
pub use store::{InMemoryModelStore, ModelStore};
pub use table::{FeatureMatrix, SubjectTable};
