//! Rule-based diagnosis over four probability columns.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::grouping::Grouping;
use crate::results::{ResultTable, probability_column_name};

/// Name of the appended diagnosis column.
pub const DIAGNOSIS_COLUMN: &str = "Predicted_diagnosis";

/// Probability threshold shared by every rule.
pub const THRESHOLD: f64 = 0.5;

/// Final per-subject label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diagnosis {
    /// Parkinsonism probability below threshold.
    NotParkinsonism,
    /// Parkinson's disease.
    Pd,
    /// Multiple system atrophy.
    Msa,
    /// Progressive supranuclear palsy.
    Psp,
    /// No rule matched. Only reachable with non-finite probabilities.
    Unknown,
}

impl Diagnosis {
    /// All labels, in report order.
    pub const ALL: [Self; 5] = [
        Self::NotParkinsonism,
        Self::Pd,
        Self::Msa,
        Self::Psp,
        Self::Unknown,
    ];

    /// Display label written to the output table.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotParkinsonism => "Not Parkinsonism",
            Self::Pd => "PD",
            Self::Msa => "MSA",
            Self::Psp => "PSP",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four probabilities the cascade reads for one subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosisEvidence {
    /// `both_park_v_control`: any parkinsonism vs control.
    pub park_v_control: f64,
    /// `dmri_msa_psp_v_pd`: atypical vs PD.
    pub msa_psp_v_pd: f64,
    /// `dmri_psp_v_pd_msa`: PSP vs PD and MSA.
    pub psp_v_pd_msa: f64,
    /// `dmri_psp_v_msa`: PSP vs MSA.
    pub psp_v_msa: f64,
}

impl DiagnosisEvidence {
    /// Apply the ordered cascade. The first matching rule wins.
    ///
    /// Comparisons are written as `>=` and `<` so that a NaN input fails
    /// every predicate it takes part in.
    #[must_use]
    #[allow(clippy::if_same_then_else)]
    pub fn diagnose(&self) -> Diagnosis {
        let pvc = self.park_v_control;
        let mpp = self.msa_psp_v_pd;
        let ppm = self.psp_v_pd_msa;
        let pm = self.psp_v_msa;

        if pvc < THRESHOLD {
            Diagnosis::NotParkinsonism
        } else if pvc >= THRESHOLD && mpp < THRESHOLD && pm < THRESHOLD {
            Diagnosis::Pd
        } else if pvc >= THRESHOLD && mpp >= THRESHOLD && pm < THRESHOLD {
            Diagnosis::Msa
        } else if pvc >= THRESHOLD && mpp >= THRESHOLD && pm >= THRESHOLD {
            Diagnosis::Psp
        } else if (pvc >= THRESHOLD && mpp < THRESHOLD && ppm >= THRESHOLD) || pm >= THRESHOLD {
            Diagnosis::Psp
        } else {
            Diagnosis::Unknown
        }
    }
}

/// Resolves the four evidence columns in a result table and diagnoses
/// every subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisEngine {
    park_v_control: String,
    msa_psp_v_pd: String,
    psp_v_pd_msa: String,
    psp_v_msa: String,
}

impl Default for DiagnosisEngine {
    fn default() -> Self {
        Self {
            park_v_control: probability_column_name(Experiment::Both, Grouping::ParkVControl),
            msa_psp_v_pd: probability_column_name(Experiment::Dmri, Grouping::MsaPspVPd),
            psp_v_pd_msa: probability_column_name(Experiment::Dmri, Grouping::PspVPdMsa),
            psp_v_msa: probability_column_name(Experiment::Dmri, Grouping::PspVMsa),
        }
    }
}

impl DiagnosisEngine {
    /// Names of the evidence columns, in [`DiagnosisEvidence`] field order.
    #[must_use]
    pub fn evidence_columns(&self) -> [&str; 4] {
        [
            self.park_v_control.as_str(),
            self.msa_psp_v_pd.as_str(),
            self.psp_v_pd_msa.as_str(),
            self.psp_v_msa.as_str(),
        ]
    }

    /// Diagnose every subject of `table`, in subject order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] if an evidence column is absent.
    #[instrument(skip_all, fields(n_subjects = table.n_subjects()))]
    pub fn diagnose(&self, table: &ResultTable) -> Result<Vec<Diagnosis>, CoreError> {
        let pvc = table.require_column(&self.park_v_control)?;
        let mpp = table.require_column(&self.msa_psp_v_pd)?;
        let ppm = table.require_column(&self.psp_v_pd_msa)?;
        let pm = table.require_column(&self.psp_v_msa)?;

        let diagnoses: Vec<Diagnosis> = (0..table.n_subjects())
            .into_par_iter()
            .map(|i| {
                DiagnosisEvidence {
                    park_v_control: pvc[i],
                    msa_psp_v_pd: mpp[i],
                    psp_v_pd_msa: ppm[i],
                    psp_v_msa: pm[i],
                }
                .diagnose()
            })
            .collect();

        for (id, diagnosis) in table.subject_ids().iter().zip(&diagnoses) {
            debug!(subject = %id, %diagnosis, "subject diagnosed");
        }
        Ok(diagnoses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubjectId;

    fn evidence(pvc: f64, mpp: f64, ppm: f64, pm: f64) -> DiagnosisEvidence {
        DiagnosisEvidence {
            park_v_control: pvc,
            msa_psp_v_pd: mpp,
            psp_v_pd_msa: ppm,
            psp_v_msa: pm,
        }
    }

    #[test]
    fn low_parkinsonism_wins_regardless() {
        for (mpp, ppm, pm) in [(0.0, 0.0, 0.0), (0.9, 0.9, 0.9), (0.2, 0.9, 0.6)] {
            assert_eq!(evidence(0.3, mpp, ppm, pm).diagnose(), Diagnosis::NotParkinsonism);
        }
    }

    #[test]
    fn pd_rule() {
        assert_eq!(evidence(0.9, 0.2, 0.0, 0.1).diagnose(), Diagnosis::Pd);
    }

    #[test]
    fn msa_rule() {
        assert_eq!(evidence(0.9, 0.8, 0.0, 0.2).diagnose(), Diagnosis::Msa);
    }

    #[test]
    fn psp_rule() {
        assert_eq!(evidence(0.9, 0.8, 0.0, 0.9).diagnose(), Diagnosis::Psp);
    }

    #[test]
    fn pd_rule_precedes_psp_fallback() {
        // High PSP-vs-rest alone does not override the PD rule.
        assert_eq!(evidence(0.9, 0.2, 0.9, 0.1).diagnose(), Diagnosis::Pd);
    }

    #[test]
    fn psp_fallback_rule() {
        assert_eq!(evidence(0.9, 0.2, 0.9, 0.6).diagnose(), Diagnosis::Psp);
        assert_eq!(evidence(0.9, 0.2, 0.1, 0.6).diagnose(), Diagnosis::Psp);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(evidence(0.5, 0.5, 0.0, 0.4).diagnose(), Diagnosis::Msa);
        assert_eq!(evidence(0.4999, 0.5, 0.5, 0.5).diagnose(), Diagnosis::NotParkinsonism);
    }

    #[test]
    fn nan_falls_through_to_unknown() {
        let nan = f64::NAN;
        assert_eq!(evidence(nan, nan, nan, nan).diagnose(), Diagnosis::Unknown);
        assert_eq!(evidence(0.9, nan, 0.2, 0.1).diagnose(), Diagnosis::Unknown);
    }

    #[test]
    fn unguarded_clause_fires_without_parkinsonism_probability() {
        assert_eq!(evidence(f64::NAN, 0.1, 0.1, 0.9).diagnose(), Diagnosis::Psp);
    }

    #[test]
    fn finite_inputs_never_unknown() {
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        for &a in &grid {
            for &b in &grid {
                for &c in &grid {
                    for &d in &grid {
                        assert_ne!(evidence(a, b, c, d).diagnose(), Diagnosis::Unknown);
                    }
                }
            }
        }
    }

    #[test]
    fn labels() {
        let labels: Vec<String> = Diagnosis::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["Not Parkinsonism", "PD", "MSA", "PSP", "Unknown"]);
    }

    #[test]
    fn engine_reads_named_columns() {
        let engine = DiagnosisEngine::default();
        let mut table = ResultTable::new(vec![SubjectId::new("a"), SubjectId::new("b"), SubjectId::new("c")]);
        let [pvc, mpp, ppm, pm] = engine.evidence_columns();
        table.push_column(pvc.to_string(), vec![0.2, 0.9, 0.9]).unwrap();
        table.push_column(mpp.to_string(), vec![0.9, 0.1, 0.7]).unwrap();
        table.push_column(ppm.to_string(), vec![0.9, 0.1, 0.1]).unwrap();
        table.push_column(pm.to_string(), vec![0.9, 0.1, 0.8]).unwrap();

        let diagnoses = engine.diagnose(&table).unwrap();
        assert_eq!(diagnoses, vec![Diagnosis::NotParkinsonism, Diagnosis::Pd, Diagnosis::Psp]);
        assert_eq!(pvc, "both_park_v_control (PD/MSA/PSP Probability)");
        assert_eq!(pm, "dmri_psp_v_msa (PSP Probability)");
    }

    #[test]
    fn engine_requires_evidence_columns() {
        let table = ResultTable::new(vec![SubjectId::new("a")]);
        let err = DiagnosisEngine::default().diagnose(&table).unwrap_err();
        assert!(matches!(err, CoreError::MissingColumn { .. }));
    }
}
