//! Logistic model training and probability prediction.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::config::LogisticConfig;
use crate::error::ClassifierError;
use crate::scaler::Standardizer;

/// Probability at or above which a sample is assigned the positive class.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A fitted binary logistic model over standardized features.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogisticModel {
    pub(crate) weights: Vec<f64>,
    pub(crate) bias: f64,
    pub(crate) scaler: Standardizer,
    pub(crate) feature_names: Vec<String>,
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(value: f64) -> f64 {
    if value >= 0.0 {
        1.0 / (1.0 + (-value).exp())
    } else {
        let z = value.exp();
        z / (1.0 + z)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Validate a row-major feature matrix and its binary labels.
pub(crate) fn validate(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, ClassifierError> {
    if features.is_empty() {
        return Err(ClassifierError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(ClassifierError::LabelCountMismatch {
            samples: features.len(),
            labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ClassifierError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ClassifierError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    for (sample_index, &label) in labels.iter().enumerate() {
        if label > 1 {
            return Err(ClassifierError::InvalidLabel {
                sample_index,
                label,
            });
        }
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(ClassifierError::SingleClass {
            positives,
            negatives,
        });
    }
    Ok(n_features)
}

/// Fit by full-batch gradient descent on the mean log-loss.
#[instrument(skip_all, fields(epochs = config.epochs, n_samples = features.len()))]
pub(crate) fn train(
    config: &LogisticConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<LogisticModel, ClassifierError> {
    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(ClassifierError::InvalidLearningRate {
            learning_rate: config.learning_rate,
        });
    }
    if !config.l2.is_finite() || config.l2 < 0.0 {
        return Err(ClassifierError::InvalidPenalty { l2: config.l2 });
    }
    let n_features = validate(features, labels)?;

    let scaler = Standardizer::fit(features);
    let scaled: Vec<Vec<f64>> = features.iter().map(|row| scaler.transform(row)).collect();
    let targets: Vec<f64> = labels.iter().map(|&l| l as f64).collect();

    let m = scaled.len() as f64;
    let mut weights = vec![0.0; n_features];
    let mut bias = 0.0;

    for _ in 0..config.epochs {
        let mut grad_w = vec![0.0; n_features];
        let mut grad_b = 0.0;
        for (row, &y) in scaled.iter().zip(&targets) {
            let error = sigmoid(dot(&weights, row) + bias) - y;
            for (g, &x) in grad_w.iter_mut().zip(row) {
                *g += error * x;
            }
            grad_b += error;
        }
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= config.learning_rate * (g / m + config.l2 * *w);
        }
        bias -= config.learning_rate * grad_b / m;
    }

    debug!(n_features, bias, "logistic model fitted");

    Ok(LogisticModel {
        weights,
        bias,
        scaler,
        feature_names: feature_names.to_vec(),
    })
}

impl LogisticModel {
    /// Return the positive-class probability for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<f64, ClassifierError> {
        if sample.len() != self.weights.len() {
            return Err(ClassifierError::PredictionFeatureMismatch {
                expected: self.weights.len(),
                got: sample.len(),
            });
        }
        let z = self.scaler.transform(sample);
        Ok(sigmoid(dot(&self.weights, &z) + self.bias))
    }

    /// Predict the class label (1 when the probability reaches the threshold).
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ClassifierError> {
        Ok(usize::from(self.predict_proba(sample)? >= DECISION_THRESHOLD))
    }

    /// Return positive-class probabilities for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::PredictionFeatureMismatch`] if any sample has
    /// the wrong feature count.
    pub fn predict_proba_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ClassifierError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::PredictionFeatureMismatch`] if any sample has
    /// the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, ClassifierError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Check that prediction columns are exactly the training columns, in order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::PredictionFeatureMismatch`] | different column count |
    /// | [`ClassifierError::FeatureNameMismatch`] | a column name differs |
    pub fn check_feature_names(&self, names: &[String]) -> Result<(), ClassifierError> {
        if names.len() != self.feature_names.len() {
            return Err(ClassifierError::PredictionFeatureMismatch {
                expected: self.feature_names.len(),
                got: names.len(),
            });
        }
        for (index, (expected, got)) in self.feature_names.iter().zip(names).enumerate() {
            if expected != got {
                return Err(ClassifierError::FeatureNameMismatch {
                    index,
                    expected: expected.clone(),
                    got: got.clone(),
                });
            }
        }
        Ok(())
    }

    /// Return the number of features this model was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the fitted weights (in standardized feature space).
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Return the fitted intercept.
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Return the fitted standardizer.
    #[must_use]
    pub fn scaler(&self) -> &Standardizer {
        &self.scaler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            features.push(vec![i as f64 * 0.1, 0.5]);
            labels.push(0);
        }
        for i in 0..20 {
            features.push(vec![5.0 + i as f64 * 0.1, 0.5]);
            labels.push(1);
        }
        let names = vec!["x".to_string(), "y".to_string()];
        (features, labels, names)
    }

    #[test]
    fn separable_data_is_classified() {
        let (features, labels, names) = make_separable_data();
        let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        let predictions = model.predict_batch(&features).unwrap();
        assert_eq!(predictions, labels);
        assert!(model.predict_proba(&[0.0, 0.5]).unwrap() < 0.1);
        assert!(model.predict_proba(&[7.0, 0.5]).unwrap() > 0.9);
    }

    #[test]
    fn probabilities_are_in_unit_interval() {
        let (features, labels, names) = make_separable_data();
        let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        for p in model.predict_proba_batch(&[vec![-1e6, 0.0], vec![1e6, 9.0]]).unwrap() {
            assert!((0.0..=1.0).contains(&p), "p = {p}");
        }
    }

    #[test]
    fn training_is_deterministic() {
        let (features, labels, names) = make_separable_data();
        let a = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        let b = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_matches_individual() {
        let (features, labels, names) = make_separable_data();
        let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        let batch = model.predict_proba_batch(&features).unwrap();
        for (sample, p) in features.iter().zip(&batch) {
            assert_eq!(model.predict_proba(sample).unwrap(), *p);
        }
    }

    #[test]
    fn single_class_rejected() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = LogisticConfig::default()
            .fit(&features, &[1, 1], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::SingleClass {
                positives: 2,
                negatives: 0
            }
        ));
    }

    #[test]
    fn non_finite_value_rejected() {
        let features = vec![vec![1.0], vec![f64::NAN]];
        let err = LogisticConfig::default()
            .fit(&features, &[0, 1], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::NonFiniteValue {
                sample_index: 1,
                feature_index: 0
            }
        ));
    }

    #[test]
    fn empty_dataset_rejected() {
        let err = LogisticConfig::default().fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyDataset));
    }

    #[test]
    fn invalid_learning_rate_rejected() {
        let (features, labels, names) = make_separable_data();
        let err = LogisticConfig::default()
            .with_learning_rate(0.0)
            .fit(&features, &labels, &names)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidLearningRate { .. }));
    }

    #[test]
    fn prediction_feature_mismatch() {
        let (features, labels, names) = make_separable_data();
        let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        let err = model.predict_proba(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::PredictionFeatureMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn feature_name_check() {
        let (features, labels, names) = make_separable_data();
        let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();
        assert!(model.check_feature_names(&names).is_ok());
        let swapped = vec!["y".to_string(), "x".to_string()];
        assert!(matches!(
            model.check_feature_names(&swapped),
            Err(ClassifierError::FeatureNameMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }
}
