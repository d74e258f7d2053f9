//! In-memory subject tables and column-restricted feature views.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{DiagnosticClass, SubjectId};
use crate::error::CoreError;
use crate::schema::LABEL_COLUMN;

/// A batch of subject rows with named numeric columns.
///
/// Rows and identifiers are kept in input order. Identifiers are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTable {
    subject_ids: Vec<SubjectId>,
    labels: Option<Vec<DiagnosticClass>>,
    column_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// A column-restricted view of a [`SubjectTable`], ready for a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    subject_ids: Vec<SubjectId>,
    labels: Option<Vec<DiagnosticClass>>,
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

fn check_shape(
    subject_ids: &[SubjectId],
    labels: Option<&[DiagnosticClass]>,
    n_columns: usize,
    rows: &[Vec<f64>],
) -> Result<(), CoreError> {
    if rows.len() != subject_ids.len() {
        return Err(CoreError::ShapeMismatch {
            what: "row count".to_string(),
            expected: subject_ids.len(),
            got: rows.len(),
        });
    }
    if let Some(labels) = labels {
        if labels.len() != subject_ids.len() {
            return Err(CoreError::ShapeMismatch {
                what: "label count".to_string(),
                expected: subject_ids.len(),
                got: labels.len(),
            });
        }
    }
    for (id, row) in subject_ids.iter().zip(rows) {
        if row.len() != n_columns {
            return Err(CoreError::ShapeMismatch {
                what: format!("row for subject \"{id}\""),
                expected: n_columns,
                got: row.len(),
            });
        }
    }
    Ok(())
}

impl SubjectTable {
    /// Build a table from parallel identifier, label, and row vectors.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::DuplicateSubject`] | An identifier repeats |
    /// | [`CoreError::DuplicateColumn`] | A column name repeats |
    /// | [`CoreError::ShapeMismatch`] | Row, label, or column counts disagree |
    pub fn new(
        subject_ids: Vec<SubjectId>,
        labels: Option<Vec<DiagnosticClass>>,
        column_names: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(subject_ids.len());
        for id in &subject_ids {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateSubject {
                    subject: id.to_string(),
                });
            }
        }
        let mut seen_cols = HashSet::with_capacity(column_names.len());
        for name in &column_names {
            if !seen_cols.insert(name) {
                return Err(CoreError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }
        check_shape(&subject_ids, labels.as_deref(), column_names.len(), &rows)?;

        Ok(Self {
            subject_ids,
            labels,
            column_names,
            rows,
        })
    }

    /// Number of subjects.
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.subject_ids.len()
    }

    /// Subject identifiers in row order.
    #[must_use]
    pub fn subject_ids(&self) -> &[SubjectId] {
        &self.subject_ids
    }

    /// Diagnostic labels, if the input carried a label column.
    #[must_use]
    pub fn labels(&self) -> Option<&[DiagnosticClass]> {
        self.labels.as_deref()
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Restrict the table to `names`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] naming the first absent column.
    pub fn select(&self, names: &[String]) -> Result<FeatureMatrix, CoreError> {
        let indices = resolve(&self.column_names, names)?;
        debug!(n_columns = indices.len(), "columns resolved");
        Ok(FeatureMatrix {
            subject_ids: self.subject_ids.clone(),
            labels: self.labels.clone(),
            feature_names: names.to_vec(),
            rows: project(&self.rows, &indices),
        })
    }
}

fn resolve(available: &[String], names: &[String]) -> Result<Vec<usize>, CoreError> {
    names
        .iter()
        .map(|name| {
            available
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| CoreError::MissingColumn {
                    column: name.clone(),
                })
        })
        .collect()
}

fn project(rows: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| indices.iter().map(|&i| row[i]).collect())
        .collect()
}

impl FeatureMatrix {
    /// Number of subjects.
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.subject_ids.len()
    }

    /// Subject identifiers in row order.
    #[must_use]
    pub fn subject_ids(&self) -> &[SubjectId] {
        &self.subject_ids
    }

    /// Diagnostic labels, if present.
    #[must_use]
    pub fn labels(&self) -> Option<&[DiagnosticClass]> {
        self.labels.as_deref()
    }

    /// Diagnostic labels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingLabels`] if the source table had none.
    pub fn require_labels(&self) -> Result<&[DiagnosticClass], CoreError> {
        self.labels().ok_or_else(|| CoreError::MissingLabels {
            column: LABEL_COLUMN.to_string(),
        })
    }

    /// Feature names in column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature rows in subject order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Keep only `names`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] naming the first absent column.
    pub fn select(&self, names: &[String]) -> Result<Self, CoreError> {
        let indices = resolve(&self.feature_names, names)?;
        Ok(Self {
            subject_ids: self.subject_ids.clone(),
            labels: self.labels.clone(),
            feature_names: names.to_vec(),
            rows: project(&self.rows, &indices),
        })
    }

    /// Remove the column `name`, keeping the rest in order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] if `name` is absent.
    pub fn drop_column(&self, name: &str) -> Result<Self, CoreError> {
        if !self.feature_names.iter().any(|n| n == name) {
            return Err(CoreError::MissingColumn {
                column: name.to_string(),
            });
        }
        let kept: Vec<String> = self
            .feature_names
            .iter()
            .filter(|n| *n != name)
            .cloned()
            .collect();
        self.select(&kept)
    }
}
