//! Named probability columns keyed by subject, and their aggregation.

use crate::domain::SubjectId;
use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::grouping::Grouping;

/// Name of the probability column for one experiment/grouping pair.
#[must_use]
pub fn probability_column_name(experiment: Experiment, grouping: Grouping) -> String {
    format!(
        "{}_{} ({} Probability)",
        experiment.key(),
        grouping.key(),
        grouping.positive_label()
    )
}

/// One probability per subject, in the owning table's subject order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityColumn {
    /// Column name.
    pub name: String,
    /// Positive-class probabilities.
    pub values: Vec<f64>,
}

/// Subject identifier mapped to named probability columns.
///
/// Columns are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    subject_ids: Vec<SubjectId>,
    columns: Vec<ProbabilityColumn>,
}

impl ResultTable {
    /// Create an empty table over `subject_ids`.
    #[must_use]
    pub fn new(subject_ids: Vec<SubjectId>) -> Self {
        Self {
            subject_ids,
            columns: Vec::new(),
        }
    }

    /// Append a column.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::DuplicateColumn`] | A column with this name exists |
    /// | [`CoreError::ShapeMismatch`] | `values` length differs from the subject count |
    pub fn push_column(&mut self, name: String, values: Vec<f64>) -> Result<(), CoreError> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(CoreError::DuplicateColumn { column: name });
        }
        if values.len() != self.subject_ids.len() {
            return Err(CoreError::ShapeMismatch {
                what: format!("column \"{name}\""),
                expected: self.subject_ids.len(),
                got: values.len(),
            });
        }
        self.columns.push(ProbabilityColumn { name, values });
        Ok(())
    }

    /// Subject identifiers in row order.
    #[must_use]
    pub fn subject_ids(&self) -> &[SubjectId] {
        &self.subject_ids
    }

    /// Number of subjects.
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.subject_ids.len()
    }

    /// Columns in insertion order.
    #[must_use]
    pub fn columns(&self) -> &[ProbabilityColumn] {
        &self.columns
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Look up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] if absent.
    pub fn require_column(&self, name: &str) -> Result<&[f64], CoreError> {
        self.column(name).ok_or_else(|| CoreError::MissingColumn {
            column: name.to_string(),
        })
    }

    /// Concatenate `other`'s columns onto this table.
    ///
    /// All checks run before any column moves, so on error `self` is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::ShapeMismatch`] | Subject counts differ |
    /// | [`CoreError::SubjectOrderMismatch`] | Subjects differ at some row |
    /// | [`CoreError::DuplicateColumn`] | A column name exists in both |
    pub fn merge(&mut self, other: Self) -> Result<(), CoreError> {
        if other.subject_ids.len() != self.subject_ids.len() {
            return Err(CoreError::ShapeMismatch {
                what: "merged subject count".to_string(),
                expected: self.subject_ids.len(),
                got: other.subject_ids.len(),
            });
        }
        if let Some((row, (expected, found))) = self
            .subject_ids
            .iter()
            .zip(&other.subject_ids)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(CoreError::SubjectOrderMismatch {
                row,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        if let Some(column) = other.columns.iter().find(|c| self.column(&c.name).is_some()) {
            return Err(CoreError::DuplicateColumn {
                column: column.name.clone(),
            });
        }
        self.columns.extend(other.columns);
        Ok(())
    }

    /// Merge several track tables into one wide table.
    ///
    /// Returns `None` for an empty input.
    ///
    /// # Errors
    ///
    /// Same as [`ResultTable::merge`].
    pub fn aggregate(tables: impl IntoIterator<Item = Self>) -> Result<Option<Self>, CoreError> {
        let mut tables = tables.into_iter();
        let Some(mut merged) = tables.next() else {
            return Ok(None);
        };
        for table in tables {
            merged.merge(table)?;
        }
        Ok(Some(merged))
    }
}
