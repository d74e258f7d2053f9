//! Binary confusion matrix and the performance metrics reported per grouping.

use std::fmt;

use crate::error::ClassifierError;

/// A 2×2 confusion matrix with class 1 as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Positives predicted positive.
    pub tp: usize,
    /// Negatives predicted positive.
    pub fp: usize,
    /// Negatives predicted negative.
    pub tn: usize,
    /// Positives predicted negative.
    pub fn_: usize,
}

/// The eleven performance figures reported for one data partition.
///
/// Weighted variants average the one-vs-rest metric of each class weighted
/// by class support. `weighted_accuracy` is balanced accuracy, since a
/// support-weighted accuracy is identical to plain accuracy for two classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryMetrics {
    /// TP / (TP + FN).
    pub recall: f64,
    /// TP / (TP + FP).
    pub precision: f64,
    /// Area under the ROC curve.
    pub auc: f64,
    /// TN / (TN + FP).
    pub specificity: f64,
    /// TN / (TN + FN).
    pub npv: f64,
    /// (TP + TN) / N.
    pub accuracy: f64,
    /// Support-weighted mean of per-class recall.
    pub weighted_sensitivity: f64,
    /// Support-weighted mean of per-class precision.
    pub weighted_ppv: f64,
    /// Support-weighted mean of per-class specificity.
    pub weighted_specificity: f64,
    /// Support-weighted mean of per-class negative predictive value.
    pub weighted_npv: f64,
    /// Mean of sensitivity and specificity.
    pub weighted_accuracy: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted binary labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::EmptyDataset`] | Zero labels provided |
    /// | [`ClassifierError::LabelCountMismatch`] | Slices differ in length |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize]) -> Result<Self, ClassifierError> {
        if true_labels.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(ClassifierError::LabelCountMismatch {
                samples: true_labels.len(),
                labels: predicted.len(),
            });
        }
        let mut cm = Self {
            tp: 0,
            fp: 0,
            tn: 0,
            fn_: 0,
        };
        for (&t, &p) in true_labels.iter().zip(predicted) {
            match (t == 1, p == 1) {
                (true, true) => cm.tp += 1,
                (false, true) => cm.fp += 1,
                (false, false) => cm.tn += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        Ok(cm)
    }

    /// Total number of samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Number of true positives plus false negatives.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.tp + self.fn_
    }

    /// Number of true negatives plus false positives.
    #[must_use]
    pub fn negatives(&self) -> usize {
        self.tn + self.fp
    }

    /// Sensitivity: TP / (TP + FN).
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Positive predictive value: TP / (TP + FP).
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TN / (TN + FP).
    #[must_use]
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// Negative predictive value: TN / (TN + FN).
    #[must_use]
    pub fn npv(&self) -> f64 {
        ratio(self.tn, self.tn + self.fn_)
    }

    /// Overall accuracy.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Compute all reported metrics, using `scores` for the AUC.
    #[must_use]
    pub fn metrics(&self, true_labels: &[usize], scores: &[f64]) -> BinaryMetrics {
        let n = self.total() as f64;
        let w_pos = self.positives() as f64 / n;
        let w_neg = self.negatives() as f64 / n;

        let (sens, spec) = (self.recall(), self.specificity());
        let (ppv, npv) = (self.precision(), self.npv());

        // Viewed from the negative class, recall is specificity and precision
        // is NPV, and vice versa.
        BinaryMetrics {
            recall: sens,
            precision: ppv,
            auc: roc_auc(true_labels, scores),
            specificity: spec,
            npv,
            accuracy: self.accuracy(),
            weighted_sensitivity: w_pos * sens + w_neg * spec,
            weighted_ppv: w_pos * ppv + w_neg * npv,
            weighted_specificity: w_pos * spec + w_neg * sens,
            weighted_npv: w_pos * npv + w_neg * ppv,
            weighted_accuracy: (sens + spec) / 2.0,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>7} {:>7}", "", "pred_0", "pred_1")?;
        writeln!(f, "{:>8} {:>7} {:>7}", "true_0", self.tn, self.fp)?;
        writeln!(f, "{:>8} {:>7} {:>7}", "true_1", self.fn_, self.tp)
    }
}

/// ROC AUC via the Mann–Whitney U statistic.
///
/// Ties between a positive and a negative score count one half. Returns
/// 0.0 when either class is absent.
#[must_use]
pub fn roc_auc(true_labels: &[usize], scores: &[f64]) -> f64 {
    let mut ranked: Vec<(f64, bool)> = scores
        .iter()
        .zip(true_labels)
        .map(|(&s, &l)| (s, l == 1))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n_pos = ranked.iter().filter(|(_, p)| *p).count();
    let n_neg = ranked.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.0;
    }

    // Sum of (1-based, tie-averaged) ranks of the positive samples.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < ranked.len() {
        let mut j = i;
        while j + 1 < ranked.len() && ranked[j + 1].0 == ranked[i].0 {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        let pos_in_group = ranked[i..=j].iter().filter(|(_, p)| *p).count();
        rank_sum += avg_rank * pos_in_group as f64;
        i = j + 1;
    }

    let n_pos_f = n_pos as f64;
    let u = rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    u / (n_pos_f * n_neg as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_cell() {
        let t = [1, 1, 1, 0, 0, 0, 0];
        let p = [1, 1, 0, 0, 0, 0, 1];
        let cm = ConfusionMatrix::from_labels(&t, &p).unwrap();
        assert_eq!((cm.tp, cm.fn_, cm.tn, cm.fp), (2, 1, 3, 1));
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.specificity() - 0.75).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.npv() - 0.75).abs() < 1e-12);
        assert!((cm.accuracy() - 5.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_metrics() {
        let t = [1, 1, 1, 0, 0, 0, 0];
        let p = [1, 1, 0, 0, 0, 0, 1];
        let cm = ConfusionMatrix::from_labels(&t, &p).unwrap();
        let scores: Vec<f64> = p.iter().map(|&x| x as f64).collect();
        let m = cm.metrics(&t, &scores);
        let (w_pos, w_neg) = (3.0 / 7.0, 4.0 / 7.0);
        assert!((m.weighted_sensitivity - (w_pos * 2.0 / 3.0 + w_neg * 0.75)).abs() < 1e-12);
        assert!((m.weighted_specificity - (w_pos * 0.75 + w_neg * 2.0 / 3.0)).abs() < 1e-12);
        assert!((m.weighted_accuracy - (2.0 / 3.0 + 0.75) / 2.0).abs() < 1e-12);
        // Support-weighted recall equals plain accuracy for two classes.
        assert!((m.weighted_sensitivity - m.accuracy).abs() < 1e-12);
    }

    #[test]
    fn zero_denominators_yield_zero() {
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 0]).unwrap();
        assert!(cm.recall().abs() < f64::EPSILON);
        assert!(cm.precision().abs() < f64::EPSILON);
        assert!((cm.specificity() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn auc_perfect_and_inverted() {
        let t = [0, 0, 1, 1];
        assert!((roc_auc(&t, &[0.1, 0.2, 0.8, 0.9]) - 1.0).abs() < 1e-12);
        assert!(roc_auc(&t, &[0.9, 0.8, 0.2, 0.1]).abs() < 1e-12);
    }

    #[test]
    fn auc_ties_count_half() {
        let t = [0, 1];
        assert!((roc_auc(&t, &[0.5, 0.5]) - 0.5).abs() < 1e-12);
        // One of the four positive/negative pairs is tied.
        let t = [0, 0, 1, 1];
        let auc = roc_auc(&t, &[0.1, 0.6, 0.6, 0.9]);
        assert!((auc - 0.875).abs() < 1e-12, "auc = {auc}");
    }

    #[test]
    fn auc_single_class_is_zero() {
        assert!(roc_auc(&[1, 1], &[0.2, 0.9]).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_labels_error() {
        let err = ConfusionMatrix::from_labels(&[], &[]).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyDataset));
    }

    #[test]
    fn display_formatting() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1]).unwrap();
        let output = format!("{cm}");
        assert!(output.contains("pred_1"));
        assert!(output.contains("true_0"));
    }
}
