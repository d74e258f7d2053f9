//! The six pairwise diagnostic comparisons.

use std::fmt;

use tracing::debug;

use crate::domain::{DiagnosticClass, SubjectId};
use crate::error::CoreError;
use crate::table::FeatureMatrix;

/// A pairwise diagnostic comparison with a designated positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grouping {
    /// Any parkinsonism against healthy controls.
    ParkVControl,
    /// Atypical parkinsonism against PD.
    MsaPspVPd,
    /// MSA against PD and PSP.
    MsaVPdPsp,
    /// PSP against PD and MSA.
    PspVPdMsa,
    /// PSP against MSA.
    PspVMsa,
    /// PD against MSA.
    PdVMsa,
}

/// A labelled, binary-encoded subset of a [`FeatureMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedData {
    /// Subjects kept by the grouping, in input order.
    pub subject_ids: Vec<SubjectId>,
    /// Feature names in column order.
    pub feature_names: Vec<String>,
    /// Feature rows of the kept subjects.
    pub features: Vec<Vec<f64>>,
    /// Binary target: 1 for the positive class, 0 otherwise.
    pub labels: Vec<usize>,
}

impl Grouping {
    /// All groupings, in report and column order.
    pub const ALL: [Self; 6] = [
        Self::ParkVControl,
        Self::MsaPspVPd,
        Self::MsaVPdPsp,
        Self::PspVPdMsa,
        Self::PspVMsa,
        Self::PdVMsa,
    ];

    /// Stable string identifier.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ParkVControl => "park_v_control",
            Self::MsaPspVPd => "msa_psp_v_pd",
            Self::MsaVPdPsp => "msa_v_pd_psp",
            Self::PspVPdMsa => "psp_v_pd_msa",
            Self::PspVMsa => "psp_v_msa",
            Self::PdVMsa => "pd_v_msa",
        }
    }

    /// Name of the class whose probability this grouping reports.
    #[must_use]
    pub fn positive_label(self) -> &'static str {
        match self {
            Self::ParkVControl => "PD/MSA/PSP",
            Self::MsaPspVPd => "MSA/PSP",
            Self::MsaVPdPsp => "MSA",
            Self::PspVPdMsa | Self::PspVMsa => "PSP",
            Self::PdVMsa => "PD",
        }
    }

    /// Look up a grouping by its key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key() == key)
    }

    /// Whether a subject of `class` takes part in this comparison.
    #[must_use]
    pub fn includes(self, class: DiagnosticClass) -> bool {
        use DiagnosticClass::{Msa, Pd, Psp};
        match self {
            Self::ParkVControl => true,
            Self::MsaPspVPd | Self::MsaVPdPsp | Self::PspVPdMsa => {
                matches!(class, Pd | Msa | Psp)
            }
            Self::PspVMsa => matches!(class, Msa | Psp),
            Self::PdVMsa => matches!(class, Pd | Msa),
        }
    }

    /// Whether `class` is on the positive side of this comparison.
    #[must_use]
    pub fn is_positive(self, class: DiagnosticClass) -> bool {
        use DiagnosticClass::{Msa, Pd, Psp};
        match self {
            Self::ParkVControl => matches!(class, Pd | Msa | Psp),
            Self::MsaPspVPd => matches!(class, Msa | Psp),
            Self::MsaVPdPsp => class == Msa,
            Self::PspVPdMsa | Self::PspVMsa => class == Psp,
            Self::PdVMsa => class == Pd,
        }
    }

    /// Restrict `matrix` to the rows in this comparison and encode the
    /// binary target.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::MissingLabels`] | The matrix carries no labels |
    /// | [`CoreError::LabelMismatch`] | The subset lacks positive or negative rows |
    pub fn group(self, matrix: &FeatureMatrix) -> Result<GroupedData, CoreError> {
        let classes = matrix.require_labels()?;

        let mut data = GroupedData {
            subject_ids: Vec::new(),
            feature_names: matrix.feature_names().to_vec(),
            features: Vec::new(),
            labels: Vec::new(),
        };
        for (i, &class) in classes.iter().enumerate() {
            if !self.includes(class) {
                continue;
            }
            data.subject_ids.push(matrix.subject_ids()[i].clone());
            data.features.push(matrix.rows()[i].clone());
            data.labels.push(usize::from(self.is_positive(class)));
        }

        let positives = data.labels.iter().filter(|&&l| l == 1).count();
        let negatives = data.labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(CoreError::LabelMismatch {
                grouping: self.key().to_string(),
                positives,
                negatives,
            });
        }

        debug!(grouping = self.key(), positives, negatives, "rows grouped");
        Ok(data)
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
