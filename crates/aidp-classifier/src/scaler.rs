//! Per-column z-score standardization fitted on training rows.

/// Column means and scales learned from a training matrix.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    /// Fit column means and population standard deviations.
    ///
    /// Columns with zero variance get a scale of 1.0 so they map to 0.0
    /// instead of dividing by zero. Callers validate that `rows` is
    /// non-empty and rectangular.
    pub(crate) fn fit(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;

        let mut means = vec![0.0; n_features];
        for row in rows {
            for (m, &v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; n_features];
        for row in rows {
            for ((s, &v), &m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std > f64::EPSILON { std } else { 1.0 };
        }

        Self { means, scales }
    }

    /// Standardize a single sample.
    #[must_use]
    pub fn transform(&self, sample: &[f64]) -> Vec<f64> {
        sample
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect()
    }

    /// Return the fitted column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the fitted column scales.
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_computes_mean_and_population_std() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let s = Standardizer::fit(&rows);
        assert_eq!(s.means(), &[2.0, 10.0]);
        assert!((s.scales()[0] - 1.0).abs() < 1e-12);
        // Constant column falls back to unit scale.
        assert!((s.scales()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn transform_centers_and_scales() {
        let rows = vec![vec![0.0], vec![4.0]];
        let s = Standardizer::fit(&rows);
        let t = s.transform(&[4.0]);
        assert!((t[0] - 1.0).abs() < 1e-12);
        let t = s.transform(&[2.0]);
        assert!(t[0].abs() < 1e-12);
    }
}
