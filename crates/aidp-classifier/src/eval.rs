//! Stratified train/validation holdout evaluation.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::config::LogisticConfig;
use crate::error::ClassifierError;
use crate::metrics::{BinaryMetrics, ConfusionMatrix};
use crate::model::LogisticModel;

/// Holdout evaluation configuration.
///
/// Construct via [`HoldoutEvaluation::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutEvaluation {
    validation_fraction: f64,
    seed: u64,
}

/// Result of fitting on the training partition and scoring both partitions.
#[derive(Debug)]
pub struct HoldoutResult {
    /// Model fitted on the training partition.
    pub model: LogisticModel,
    /// Metrics on the training partition.
    pub training: BinaryMetrics,
    /// Metrics on the validation partition.
    pub validation: BinaryMetrics,
    /// Confusion matrix on the training partition.
    pub training_confusion: ConfusionMatrix,
    /// Confusion matrix on the validation partition.
    pub validation_confusion: ConfusionMatrix,
    /// Number of training samples.
    pub n_train: usize,
    /// Number of validation samples.
    pub n_validation: usize,
}

/// Sample indices assigned to each partition, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutSplit {
    /// Indices of training samples.
    pub train: Vec<usize>,
    /// Indices of validation samples.
    pub validation: Vec<usize>,
}

impl Default for HoldoutEvaluation {
    /// 20% validation, seed 42.
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

impl HoldoutEvaluation {
    /// Create a new holdout config holding out `validation_fraction` of each class.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidValidationFraction`] unless the
    /// fraction is in (0.0, 1.0).
    pub fn new(validation_fraction: f64) -> Result<Self, ClassifierError> {
        if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
            return Err(ClassifierError::InvalidValidationFraction {
                fraction: validation_fraction,
            });
        }
        Ok(Self {
            validation_fraction,
            seed: 42,
        })
    }

    /// Set the random seed for partition shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the validation fraction.
    #[must_use]
    pub fn validation_fraction(&self) -> f64 {
        self.validation_fraction
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Split binary labels into stratified train/validation index sets.
    ///
    /// Each class is shuffled independently and `round(n * fraction)` of it,
    /// clamped to `[1, n - 1]`, goes to validation, so both partitions see
    /// both classes.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::TooFewSamplesForSplit`] if a class has
    /// fewer than two samples.
    pub fn split(&self, labels: &[usize]) -> Result<HoldoutSplit, ClassifierError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut class_indices: Vec<Vec<usize>> = vec![vec![]; 2];
        for (i, &label) in labels.iter().enumerate() {
            let class = usize::from(label == 1);
            class_indices[class].push(i);
        }

        let mut train = Vec::new();
        let mut validation = Vec::new();
        for (class, indices) in class_indices.iter_mut().enumerate() {
            if indices.len() < 2 {
                return Err(ClassifierError::TooFewSamplesForSplit {
                    class,
                    count: indices.len(),
                });
            }
            indices.shuffle(&mut rng);
            let n_val = ((indices.len() as f64 * self.validation_fraction).round() as usize)
                .clamp(1, indices.len() - 1);
            validation.extend_from_slice(&indices[..n_val]);
            train.extend_from_slice(&indices[n_val..]);
        }
        train.sort_unstable();
        validation.sort_unstable();

        Ok(HoldoutSplit { train, validation })
    }

    /// Fit on the training partition and score both partitions.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::EmptyDataset`] | Zero samples |
    /// | [`ClassifierError::TooFewSamplesForSplit`] | A class has fewer than two samples |
    /// | Other classifier errors | From underlying training |
    #[instrument(skip_all, fields(fraction = self.validation_fraction, n_samples = features.len()))]
    pub fn evaluate(
        &self,
        config: &LogisticConfig,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<HoldoutResult, ClassifierError> {
        crate::model::validate(features, labels)?;

        let split = self.split(labels)?;
        let gather = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            (
                idx.iter().map(|&i| features[i].clone()).collect(),
                idx.iter().map(|&i| labels[i]).collect(),
            )
        };
        let (train_x, train_y) = gather(&split.train);
        let (val_x, val_y) = gather(&split.validation);

        let model = config.fit(&train_x, &train_y, feature_names)?;

        let score = |x: &[Vec<f64>], y: &[usize]| -> Result<(ConfusionMatrix, BinaryMetrics), ClassifierError> {
            let proba = model.predict_proba_batch(x)?;
            let predicted = model.predict_batch(x)?;
            let cm = ConfusionMatrix::from_labels(y, &predicted)?;
            let metrics = cm.metrics(y, &proba);
            Ok((cm, metrics))
        };
        let (training_confusion, training) = score(&train_x, &train_y)?;
        let (validation_confusion, validation) = score(&val_x, &val_y)?;

        info!(
            n_train = train_y.len(),
            n_validation = val_y.len(),
            train_accuracy = training.accuracy,
            validation_accuracy = validation.accuracy,
            validation_auc = validation.auc,
            "holdout evaluation complete"
        );

        Ok(HoldoutResult {
            model,
            training,
            validation,
            training_confusion,
            validation_confusion,
            n_train: train_y.len(),
            n_validation: val_y.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            features.push(vec![i as f64 * 0.1]);
            labels.push(0);
        }
        for i in 0..20 {
            features.push(vec![10.0 + i as f64 * 0.1]);
            labels.push(1);
        }
        (features, labels, vec!["x".to_string()])
    }

    #[test]
    fn split_is_stratified_and_disjoint() {
        let (_, labels, _) = make_data();
        let split = HoldoutEvaluation::new(0.2).unwrap().split(&labels).unwrap();
        assert_eq!(split.validation.len(), 6 + 4);
        assert_eq!(split.train.len(), 40);
        let val_pos = split.validation.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(val_pos, 4);
        assert!(split.train.iter().all(|i| !split.validation.contains(i)));
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let (_, labels, _) = make_data();
        let a = HoldoutEvaluation::new(0.3).unwrap().with_seed(7).split(&labels).unwrap();
        let b = HoldoutEvaluation::new(0.3).unwrap().with_seed(7).split(&labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_class_keeps_one_sample_on_each_side() {
        let labels = vec![0, 0, 0, 0, 0, 1, 1];
        let split = HoldoutEvaluation::new(0.1).unwrap().split(&labels).unwrap();
        let val_pos = split.validation.iter().filter(|&&i| labels[i] == 1).count();
        let train_pos = split.train.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!((val_pos, train_pos), (1, 1));
    }

    #[test]
    fn evaluate_separable_data() {
        let (features, labels, names) = make_data();
        let result = HoldoutEvaluation::new(0.2)
            .unwrap()
            .evaluate(&LogisticConfig::default(), &features, &labels, &names)
            .unwrap();
        assert!((result.training.accuracy - 1.0).abs() < 1e-12);
        assert!((result.validation.accuracy - 1.0).abs() < 1e-12);
        assert!((result.validation.auc - 1.0).abs() < 1e-12);
        assert_eq!(result.n_train + result.n_validation, 50);
        assert_eq!(result.validation_confusion.total(), result.n_validation);
    }

    #[test]
    fn invalid_fraction() {
        assert!(HoldoutEvaluation::new(0.0).is_err());
        assert!(HoldoutEvaluation::new(1.0).is_err());
        assert!(HoldoutEvaluation::new(f64::NAN).is_err());
    }

    #[test]
    fn too_few_samples_for_split() {
        let features = vec![vec![1.0], vec![2.0], vec![10.0]];
        let err = HoldoutEvaluation::new(0.5)
            .unwrap()
            .evaluate(&LogisticConfig::default(), &features, &[0, 0, 1], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::TooFewSamplesForSplit { class: 1, count: 1 }
        ));
    }
}
