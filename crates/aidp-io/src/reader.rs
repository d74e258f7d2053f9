//! CSV subject table reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use aidp_core::{ColumnSchema, DiagnosticClass, LABEL_COLUMN, SUBJECT_COLUMN, SubjectId, SubjectTable};
use tracing::{debug, info, instrument, warn};

use crate::IoError;

/// A parsed input file: the raw cells for pass-through output plus the
/// validated numeric table for the classifiers.
#[derive(Debug, Clone)]
pub struct InputTable {
    header: Vec<String>,
    records: Vec<Vec<String>>,
    table: SubjectTable,
}

impl InputTable {
    /// Header cells in file order.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Raw data cells, one vector per row, in file order.
    #[must_use]
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// The validated subject table.
    #[must_use]
    pub fn table(&self) -> &SubjectTable {
        &self.table
    }
}

/// Reads a subject table from a CSV file.
///
/// Expected CSV format:
/// - Header row required, containing a `Subject` column
/// - An optional `GroupID` column with codes 0 (Control), 1 (PD), 2 (MSA), 3 (PSP)
/// - Reference-list columns holding finite numbers
/// - Any other columns are carried through untouched
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | No `Subject` column, or no `GroupID` when labels are required |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, empty, or unparseable |
/// | [`IoError::InvalidLabel`] | `GroupID` cell is not a known class code |
/// | [`IoError::DuplicateSubject`] | Same subject appears twice |
/// | [`IoError::DuplicateColumn`] | A header name repeats |
/// | [`IoError::Table`] | Parsed rows cannot form a subject table |
pub struct SubjectReader {
    path: PathBuf,
    schema: ColumnSchema,
    require_labels: bool,
}

fn parse_label(raw: &str) -> Option<DiagnosticClass> {
    let raw = raw.trim();
    let code = match raw.parse::<i64>() {
        Ok(code) => code,
        Err(_) => {
            let value: f64 = raw.parse().ok()?;
            if value.fract() != 0.0 {
                return None;
            }
            value as i64
        }
    };
    DiagnosticClass::from_code(code)
}

impl SubjectReader {
    /// Create a reader for `path` that extracts the columns in `schema`.
    pub fn new(path: &Path, schema: ColumnSchema) -> Self {
        Self {
            path: path.to_path_buf(),
            schema,
            require_labels: false,
        }
    }

    /// Require a `GroupID` column, as training does.
    #[must_use]
    pub fn with_labels_required(mut self, require: bool) -> Self {
        self.require_labels = require;
        self
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display(), require_labels = self.require_labels))]
    pub fn read(&self) -> Result<InputTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(String::from)
            .collect();
        let expected_cols = header.len();

        let mut columns_seen: HashMap<&str, usize> = HashMap::with_capacity(expected_cols);
        for (second, name) in header.iter().enumerate() {
            if let Some(&first) = columns_seen.get(name.as_str()) {
                return Err(IoError::DuplicateColumn {
                    path: self.path.clone(),
                    column: name.clone(),
                    first,
                    second,
                });
            }
            columns_seen.insert(name.as_str(), second);
        }

        let position = |name: &str| header.iter().position(|h| h == name);
        let subject_col = position(SUBJECT_COLUMN).ok_or_else(|| IoError::MissingColumn {
            path: self.path.clone(),
            column: SUBJECT_COLUMN.to_string(),
        })?;
        let label_col = position(LABEL_COLUMN);
        if self.require_labels && label_col.is_none() {
            return Err(IoError::MissingColumn {
                path: self.path.clone(),
                column: LABEL_COLUMN.to_string(),
            });
        }

        let feature_cols: Vec<(usize, &String)> = self
            .schema
            .names()
            .iter()
            .filter_map(|name| position(name).map(|i| (i, name)))
            .collect();
        for name in &header {
            if name != SUBJECT_COLUMN && name != LABEL_COLUMN && !self.schema.contains(name) {
                warn!(column = %name, "column not in reference list, carried to output only");
            }
        }
        debug!(
            expected_cols,
            n_features = feature_cols.len(),
            has_labels = label_col.is_some(),
            "read CSV header"
        );

        let mut records = Vec::new();
        let mut subject_ids = Vec::new();
        let mut labels = Vec::new();
        let mut rows = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let subject = record.get(subject_col).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    subject,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            if let Some(&first_row) = seen.get(&subject) {
                return Err(IoError::DuplicateSubject {
                    path: self.path.clone(),
                    subject,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(subject.clone(), row_index);

            if let Some(col) = label_col {
                let raw = record.get(col).unwrap_or("");
                let class = parse_label(raw).ok_or_else(|| IoError::InvalidLabel {
                    path: self.path.clone(),
                    row_index,
                    raw: raw.to_string(),
                })?;
                labels.push(class);
            }

            let mut row = Vec::with_capacity(feature_cols.len());
            for &(col, name) in &feature_cols {
                let raw = record.get(col).unwrap_or("");
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: name.clone(),
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }

            subject_ids.push(SubjectId::new(subject));
            records.push(record.iter().map(String::from).collect());
            rows.push(row);
        }

        if subject_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let column_names = feature_cols.iter().map(|(_, name)| (*name).clone()).collect();
        let labels = label_col.map(|_| labels);
        let table = SubjectTable::new(subject_ids, labels, column_names, rows).map_err(|e| {
            IoError::Table {
                path: self.path.clone(),
                source: e,
            }
        })?;

        info!(
            n_subjects = table.n_subjects(),
            n_features = table.column_names().len(),
            "dataset loaded"
        );
        Ok(InputTable {
            header,
            records,
            table,
        })
    }
}

/// Read a one-name-per-line reference column list.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::ColumnList`] | Duplicate names, or no names at all |
#[instrument(fields(path = %path.display()))]
pub fn read_column_schema(path: &Path) -> Result<ColumnSchema, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schema = ColumnSchema::parse(&text).map_err(|e| IoError::ColumnList {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(n_columns = schema.len(), "column list loaded");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn schema() -> ColumnSchema {
        ColumnSchema::parse("Age\nSex\nUPDRS\n").unwrap()
    }

    #[test]
    fn read_labelled_table() {
        let f = write_csv("Subject,GroupID,Age,Sex,UPDRS,Site\nP01,1,61,1,20.5,A\nP02,0,58,0,2,B\n");
        let input = SubjectReader::new(f.path(), schema())
            .with_labels_required(true)
            .read()
            .unwrap();
        let table = input.table();
        assert_eq!(table.n_subjects(), 2);
        assert_eq!(table.column_names(), &["Age", "Sex", "UPDRS"]);
        assert_eq!(
            table.labels().unwrap(),
            &[DiagnosticClass::Pd, DiagnosticClass::Control]
        );
        assert_eq!(input.header().len(), 6);
        assert_eq!(input.records()[1][5], "B");
        let m = table.select(table.column_names()).unwrap();
        assert!((m.rows()[0][2] - 20.5).abs() < f64::EPSILON);
    }

    #[test]
    fn labels_optional_for_prediction() {
        let f = write_csv("Subject,Age,Sex,UPDRS\nP01,61,1,20\n");
        let input = SubjectReader::new(f.path(), schema()).read().unwrap();
        assert!(input.table().labels().is_none());
    }

    #[test]
    fn labels_required_for_training() {
        let f = write_csv("Subject,Age,Sex,UPDRS\nP01,61,1,20\n");
        let err = SubjectReader::new(f.path(), schema())
            .with_labels_required(true)
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "GroupID"));
    }

    #[test]
    fn missing_subject_column() {
        let f = write_csv("ID,Age\nP01,61\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "Subject"));
    }

    #[test]
    fn float_coded_label_accepted() {
        let f = write_csv("Subject,GroupID,Age\nP01,3.0,61\n");
        let input = SubjectReader::new(f.path(), schema()).read().unwrap();
        assert_eq!(input.table().labels().unwrap(), &[DiagnosticClass::Psp]);
    }

    #[test]
    fn unknown_label_rejected() {
        let f = write_csv("Subject,GroupID,Age\nP01,4,61\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidLabel { row_index: 0, .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("Subject,GroupID,Age\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn repeated_header_rejected() {
        let f = write_csv("Subject,Age,Sex,UPDRS,Age\nP1,61,1,20,99\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::DuplicateColumn { ref column, first: 1, second: 4, .. } if column == "Age"
        ));
    }

    #[test]
    fn repeated_carried_column_rejected() {
        let f = write_csv("Subject,Site,Age,Site\nP1,A,61,B\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(err, IoError::DuplicateColumn { ref column, .. } if column == "Site"));
    }

    #[test]
    fn duplicate_subject_error() {
        let f = write_csv("Subject,Age\nP01,61\nP01,62\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::DuplicateSubject { first_row: 0, second_row: 1, .. }
        ));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("Subject,Age,Sex\nP01,61,1\nP02,62\n");
        let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 1, .. }));
    }

    #[test]
    fn non_finite_feature_error() {
        for bad in ["NaN", "inf", "", "abc"] {
            let f = write_csv(&format!("Subject,Age\nP01,{bad}\n"));
            let err = SubjectReader::new(f.path(), schema()).read().unwrap_err();
            assert!(
                matches!(err, IoError::NonFiniteValue { ref column, .. } if column == "Age"),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn non_finite_ignored_column_is_carried() {
        let f = write_csv("Subject,Age,Notes\nP01,61,NaN\n");
        let input = SubjectReader::new(f.path(), schema()).read().unwrap();
        assert_eq!(input.records()[0][2], "NaN");
    }

    #[test]
    fn column_schema_file() {
        let f = write_csv("Subject\nGroupID\nAge\nPutamen_FA\n");
        let schema = read_column_schema(f.path()).unwrap();
        assert_eq!(schema.names(), &["Age", "Putamen_FA"]);

        let dup = write_csv("Age\nAge\n");
        assert!(matches!(
            read_column_schema(dup.path()),
            Err(IoError::ColumnList { .. })
        ));
    }
}
