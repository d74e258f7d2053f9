//! Configuration builder for logistic model training.

use crate::error::ClassifierError;
use crate::model::LogisticModel;

/// Configuration for L2-regularised logistic regression.
///
/// Construct via [`LogisticConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `epochs`        | 500     |
/// | `learning_rate` | 0.1     |
/// | `l2`            | 1e-3    |
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticConfig {
    pub(crate) epochs: usize,
    pub(crate) learning_rate: f64,
    pub(crate) l2: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.1,
            l2: 1e-3,
        }
    }
}

impl LogisticConfig {
    /// Create a new config with the given number of full-batch epochs.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidEpochs`] if `epochs` is zero.
    pub fn new(epochs: usize) -> Result<Self, ClassifierError> {
        if epochs == 0 {
            return Err(ClassifierError::InvalidEpochs { epochs });
        }
        Ok(Self {
            epochs,
            ..Self::default()
        })
    }

    /// Set the gradient descent step size.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the L2 penalty applied to the weights (not the bias).
    #[must_use]
    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    /// Return the number of epochs.
    #[must_use]
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Return the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Return the L2 penalty.
    #[must_use]
    pub fn l2(&self) -> f64 {
        self.l2
    }

    /// Train a logistic model on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]`: row-major layout.
    /// `labels[sample_idx]`: 1 for the positive class, 0 otherwise.
    /// `feature_names`: names for each feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                   |
    /// |------------------------------------------|----------------------------------------|
    /// | [`ClassifierError::InvalidLearningRate`] | learning rate not positive and finite  |
    /// | [`ClassifierError::InvalidPenalty`]      | l2 negative or non-finite              |
    /// | [`ClassifierError::EmptyDataset`]        | `features` is empty                    |
    /// | [`ClassifierError::ZeroFeatures`]        | rows have zero feature columns         |
    /// | [`ClassifierError::LabelCountMismatch`]  | `labels.len() != features.len()`       |
    /// | [`ClassifierError::FeatureCountMismatch`]| rows have inconsistent lengths         |
    /// | [`ClassifierError::NonFiniteValue`]      | any value is NaN or infinite           |
    /// | [`ClassifierError::InvalidLabel`]        | a label is neither 0 nor 1             |
    /// | [`ClassifierError::SingleClass`]         | only one class present                 |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<LogisticModel, ClassifierError> {
        crate::model::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_table() {
        let config = LogisticConfig::default();
        assert_eq!(config.epochs(), 500);
        assert!((config.learning_rate() - 0.1).abs() < 1e-12);
        assert!((config.l2() - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn zero_epochs_rejected() {
        assert!(matches!(
            LogisticConfig::new(0),
            Err(ClassifierError::InvalidEpochs { epochs: 0 })
        ));
    }

    #[test]
    fn setters_chain() {
        let config = LogisticConfig::new(10)
            .unwrap()
            .with_learning_rate(0.5)
            .with_l2(0.0);
        assert_eq!(config.epochs(), 10);
        assert!((config.learning_rate() - 0.5).abs() < f64::EPSILON);
        assert!(config.l2().abs() < f64::EPSILON);
    }
}
