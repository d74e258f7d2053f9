//! CSV writers for prediction tables and training performance reports.

use std::fs;
use std::path::{Path, PathBuf};

use aidp_core::{
    CoreError, DIAGNOSIS_COLUMN, Experiment, ModelKey, PerformanceReport, PredictionOutcome,
    ReportSink, report_header,
};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::reader::InputTable;

/// Writes prediction and performance files into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{input_stem}_out.csv` and
/// `{model_key}_{experiment}_Training_Performance.csv`.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

fn write_rows(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), std::io::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()
}

impl ResultWriter {
    /// Create a new writer targeting `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the prediction table for `input_path`: `{stem}_out.csv`.
    #[must_use]
    pub fn prediction_path(&self, input_path: &Path) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map_or_else(|| "predictions".into(), |s| s.to_string_lossy());
        self.output_dir.join(format!("{stem}_out.csv"))
    }

    /// Path of the performance report for one track and collection.
    #[must_use]
    pub fn performance_path(&self, model_key: &ModelKey, experiment: Experiment) -> PathBuf {
        self.output_dir
            .join(format!("{model_key}_{}_Training_Performance.csv", experiment.key()))
    }

    /// Write the input rows with every probability column and the
    /// diagnosis appended.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ResultRowMismatch`] | Results are not in input row order |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(input = %input_path.display()))]
    pub fn write_predictions(
        &self,
        input_path: &Path,
        input: &InputTable,
        outcome: &PredictionOutcome,
    ) -> Result<PathBuf, IoError> {
        let results = &outcome.results;
        let expected = input.table().subject_ids();
        if results.n_subjects() != expected.len() || outcome.diagnoses.len() != expected.len() {
            return Err(IoError::ResultRowMismatch {
                row_index: results.n_subjects().min(expected.len()),
                expected: format!("{} rows", expected.len()),
                found: format!("{} rows", results.n_subjects()),
            });
        }
        for (row_index, (want, got)) in expected.iter().zip(results.subject_ids()).enumerate() {
            if want != got {
                return Err(IoError::ResultRowMismatch {
                    row_index,
                    expected: want.to_string(),
                    found: got.to_string(),
                });
            }
        }

        let mut header = input.header().to_vec();
        header.extend(results.column_names().map(String::from));
        header.push(DIAGNOSIS_COLUMN.to_string());

        let rows: Vec<Vec<String>> = input
            .records()
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let mut row = record.clone();
                row.extend(results.columns().iter().map(|c| c.values[i].to_string()));
                row.push(outcome.diagnoses[i].to_string());
                row
            })
            .collect();

        let path = self.prediction_path(input_path);
        write_rows(&path, &header, &rows).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_subjects = rows.len(), "results written");
        Ok(path)
    }

    fn write_performance_file(&self, report: &PerformanceReport) -> Result<PathBuf, (PathBuf, std::io::Error)> {
        let path = self.performance_path(&report.model_key, report.experiment);
        let rows: Vec<Vec<String>> = report
            .records
            .iter()
            .map(|record| {
                let mut row = vec![record.grouping.key().to_string()];
                row.extend(record.values().iter().map(ToString::to_string));
                row
            })
            .collect();
        match write_rows(&path, &report_header(), &rows) {
            Ok(()) => {
                info!(path = %path.display(), n_groupings = rows.len(), "performance report written");
                Ok(path)
            }
            Err(e) => Err((path, e)),
        }
    }

    /// Write one track's performance report.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    pub fn write_performance(&self, report: &PerformanceReport) -> Result<PathBuf, IoError> {
        self.write_performance_file(report)
            .map_err(|(path, source)| IoError::WriteFile { path, source })
    }
}

impl ReportSink for ResultWriter {
    fn write_report(&mut self, report: &PerformanceReport) -> Result<(), CoreError> {
        self.write_performance_file(report)
            .map(|_| ())
            .map_err(|(path, source)| CoreError::Storage { path, source })
    }
}
