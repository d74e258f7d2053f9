//! Error types for aidp-core.

use std::path::PathBuf;

use aidp_classifier::ClassifierError;

/// Errors from filtering, grouping, orchestration, and diagnosis.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Returned when a required column is absent from a table.
    #[error("missing column \"{column}\"")]
    MissingColumn {
        /// Exact name of the missing column.
        column: String,
    },

    /// Returned when a table needs diagnostic labels but has none.
    #[error("table has no \"{column}\" labels")]
    MissingLabels {
        /// Name of the label column.
        column: String,
    },

    /// Returned when no persisted artifact exists for the key triple.
    #[error("no model for experiment \"{experiment}\", grouping \"{grouping}\" in collection \"{model_key}\"")]
    ModelNotFound {
        /// Experiment key.
        experiment: String,
        /// Grouping key.
        grouping: String,
        /// Model collection key.
        model_key: String,
    },

    /// Returned when saving would overwrite an existing artifact.
    #[error("model for experiment \"{experiment}\", grouping \"{grouping}\" already exists in collection \"{model_key}\"")]
    ArtifactExists {
        /// Experiment key.
        experiment: String,
        /// Grouping key.
        grouping: String,
        /// Model collection key.
        model_key: String,
    },

    /// Returned when a grouping's training subset lacks one of its classes.
    #[error("grouping \"{grouping}\" matched {positives} positive and {negatives} negative rows")]
    LabelMismatch {
        /// Grouping key.
        grouping: String,
        /// Rows labelled with the positive class.
        positives: usize,
        /// Rows labelled with the negative class.
        negatives: usize,
    },

    /// Returned when a `GroupID` value is not a known diagnostic class.
    #[error("subject \"{subject}\" has unknown diagnostic class code {code}")]
    UnknownClassCode {
        /// Subject identifier.
        subject: String,
        /// The unrecognised code.
        code: i64,
    },

    /// Returned when the same subject identifier appears twice in a batch.
    #[error("duplicate subject \"{subject}\"")]
    DuplicateSubject {
        /// The duplicated identifier.
        subject: String,
    },

    /// Returned when a row or column length disagrees with the table shape.
    #[error("{what} has length {got}, expected {expected}")]
    ShapeMismatch {
        /// What was being checked.
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when merged result tables list subjects in different orders.
    #[error("subject order differs at row {row}: expected \"{expected}\", found \"{found}\"")]
    SubjectOrderMismatch {
        /// Zero-based row index.
        row: usize,
        /// Identifier in the first table.
        expected: String,
        /// Identifier in the table being merged.
        found: String,
    },

    /// Returned when a result column name is written twice.
    #[error("duplicate result column \"{column}\"")]
    DuplicateColumn {
        /// Column name.
        column: String,
    },

    /// Returned when a pipeline is configured with an empty or repeated track or grouping.
    #[error("invalid pipeline configuration: {reason}")]
    InvalidPipeline {
        /// What is wrong.
        reason: String,
    },

    /// Returned when a model collection key is not `[a-zA-Z0-9_-]+`.
    #[error("invalid model key \"{key}\": must match [a-zA-Z0-9_-]+")]
    InvalidModelKey {
        /// The rejected key.
        key: String,
    },

    /// Returned when training or prediction fails for one experiment/grouping pair.
    #[error("classifier failed for experiment \"{experiment}\", grouping \"{grouping}\"")]
    Classifier {
        /// Experiment key.
        experiment: String,
        /// Grouping key.
        grouping: String,
        /// The underlying classifier error.
        source: ClassifierError,
    },

    /// Returned when a model store or report destination cannot be written or read.
    #[error("storage failure at {path}")]
    Storage {
        /// Path involved in the failure.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
