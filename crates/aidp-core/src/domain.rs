//! Identifier and label types shared across the pipeline.

use std::fmt;

use crate::error::CoreError;

/// A subject (patient visit) identifier, unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap a subject identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ground-truth diagnostic class, encoded in the `GroupID` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticClass {
    /// Healthy control (code 0).
    Control,
    /// Parkinson's disease (code 1).
    Pd,
    /// Multiple system atrophy (code 2).
    Msa,
    /// Progressive supranuclear palsy (code 3).
    Psp,
}

impl DiagnosticClass {
    /// Decode a `GroupID` value.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Control),
            1 => Some(Self::Pd),
            2 => Some(Self::Msa),
            3 => Some(Self::Psp),
            _ => None,
        }
    }

    /// Return the `GroupID` code.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Control => 0,
            Self::Pd => 1,
            Self::Msa => 2,
            Self::Psp => 3,
        }
    }
}

/// A validated model collection key.
///
/// Must match `[a-zA-Z0-9_-]+`, so it is safe as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey(String);

impl ModelKey {
    /// Parse and validate a model collection key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidModelKey`] if the key is empty or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CoreError::InvalidModelKey { key });
        }
        Ok(Self(key))
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_round_trip() {
        for code in 0..4 {
            let class = DiagnosticClass::from_code(code).unwrap();
            assert_eq!(class.code(), code);
        }
        assert_eq!(DiagnosticClass::from_code(4), None);
        assert_eq!(DiagnosticClass::from_code(-1), None);
    }

    #[test]
    fn model_key_accepts_timestamps_and_names() {
        assert!(ModelKey::new("default").is_ok());
        assert!(ModelKey::new("2024-01-31-093015123456").is_ok());
        assert_eq!(ModelKey::new("v2_final").unwrap().as_str(), "v2_final");
    }

    #[test]
    fn model_key_rejects_paths() {
        for bad in ["", "../etc", "a b", "models/x"] {
            assert!(
                matches!(ModelKey::new(bad), Err(CoreError::InvalidModelKey { .. })),
                "accepted {bad:?}"
            );
        }
    }
}
