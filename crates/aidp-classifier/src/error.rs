//! Error types for aidp-classifier.

use std::path::PathBuf;

/// Errors from classifier training, evaluation, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Returned when epochs is zero.
    #[error("epochs must be at least 1, got {epochs}")]
    InvalidEpochs {
        /// The invalid epoch count provided.
        epochs: usize,
    },

    /// Returned when the learning rate is not a positive finite number.
    #[error("learning_rate must be positive and finite, got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate provided.
        learning_rate: f64,
    },

    /// Returned when the L2 penalty is negative or non-finite.
    #[error("l2 penalty must be non-negative and finite, got {l2}")]
    InvalidPenalty {
        /// The invalid penalty provided.
        l2: f64,
    },

    /// Returned when the validation fraction is not in (0.0, 1.0).
    #[error("validation_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidValidationFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the number of labels differs from the number of samples.
    #[error("got {labels} labels for {samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        samples: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when a label is not 0 or 1.
    #[error("sample {sample_index} has label {label}, expected 0 or 1")]
    InvalidLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The label found.
        label: usize,
    },

    /// Returned when only one class is present in the training labels.
    #[error("training labels contain a single class: {positives} positive, {negatives} negative")]
    SingleClass {
        /// Number of positive samples.
        positives: usize,
        /// Number of negative samples.
        negatives: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when the feature names at prediction time differ from training.
    #[error("feature {index} is \"{got}\" but the model was trained on \"{expected}\"")]
    FeatureNameMismatch {
        /// Zero-based feature column index.
        index: usize,
        /// The name recorded in the model.
        expected: String,
        /// The name supplied at prediction time.
        got: String,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a class has too few samples to appear in both partitions.
    #[error("class {class} has only {count} samples, need at least 2 for a holdout split")]
    TooFewSamplesForSplit {
        /// The class label with insufficient samples.
        class: usize,
        /// The number of samples belonging to that class.
        count: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a model file already exists at the target path.
    #[error("model file already exists: {path}")]
    ModelExists {
        /// Path that would have been overwritten.
        path: PathBuf,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
