//! Reference column list for the standardized feature set.

use tracing::debug;

use crate::error::CoreError;

/// Name of the subject identifier column.
pub const SUBJECT_COLUMN: &str = "Subject";

/// Name of the diagnostic label column.
pub const LABEL_COLUMN: &str = "GroupID";

/// Clinical columns, in standardized order.
pub const CLINICAL_COLUMNS: [&str; 3] = ["Age", "Sex", "UPDRS"];

/// The clinical rating score excluded from the imaging-only track.
pub const CLINICAL_SCORE_COLUMN: &str = "UPDRS";

const IMAGING_REGIONS: [&str; 12] = [
    "aSN",
    "pSN",
    "Caudate",
    "Putamen",
    "GP",
    "STN",
    "RN",
    "Thalamus",
    "Cerebellar_SCP",
    "Cerebellar_MCP",
    "Dentate",
    "Vermis",
];

const IMAGING_METRICS: [&str; 2] = ["FA", "FW"];

/// Ordered list of the standardized feature columns.
///
/// Identifier and label columns are not part of the schema; they are
/// handled by [`SubjectTable`](crate::SubjectTable) directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// The built-in reference list: clinical columns followed by
    /// `{region}_{FA|FW}` for every imaging region.
    #[must_use]
    pub fn standard() -> Self {
        let mut names: Vec<String> = CLINICAL_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        for region in IMAGING_REGIONS {
            for metric in IMAGING_METRICS {
                names.push(format!("{region}_{metric}"));
            }
        }
        Self { names }
    }

    /// Parse a one-name-per-line reference list.
    ///
    /// Blank lines and lines starting with `#` are skipped, as are the
    /// identifier and label columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::DuplicateColumn`] | A name is listed twice |
    /// | [`CoreError::ShapeMismatch`] | No feature names remain |
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut names: Vec<String> = Vec::new();
        for line in text.lines() {
            let name = line.trim();
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            if name == SUBJECT_COLUMN || name == LABEL_COLUMN {
                continue;
            }
            if names.iter().any(|n| n == name) {
                return Err(CoreError::DuplicateColumn {
                    column: name.to_string(),
                });
            }
            names.push(name.to_string());
        }
        if names.is_empty() {
            return Err(CoreError::ShapeMismatch {
                what: "column schema".to_string(),
                expected: 1,
                got: 0,
            });
        }
        debug!(n_columns = names.len(), "column schema parsed");
        Ok(Self { names })
    }

    /// Return the column names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether `name` is part of the standardized set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty. Never true for a constructed schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::standard()
    }
}
