//! I/O error types for aidp-io.

use std::path::PathBuf;

use aidp_core::CoreError;

/// Errors from reading subject tables and writing result files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a required column is absent from the header.
    #[error("missing column \"{column}\" in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the missing column.
        column: String,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} (subject {subject}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Subject identifier of the offending row.
        subject: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a feature cell is NaN, Inf, empty, or not a number.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a `GroupID` cell is not one of 0, 1, 2, 3.
    #[error("invalid diagnostic class in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidLabel {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value.
        raw: String,
    },

    /// Returned when the same subject identifier appears more than once.
    #[error("duplicate subject \"{subject}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateSubject {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated identifier.
        subject: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when the column reference list is invalid.
    #[error("invalid column list in {path}")]
    ColumnList {
        /// Path to the column list file.
        path: PathBuf,
        /// Underlying validation error.
        source: CoreError,
    },

    /// Returned when the same header name appears more than once.
    #[error("duplicate column \"{column}\" in {path} (positions {first} and {second})")]
    DuplicateColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The repeated header name.
        column: String,
        /// Zero-based position of the first occurrence.
        first: usize,
        /// Zero-based position of the repeat.
        second: usize,
    },

    /// Returned when parsed rows cannot form a subject table.
    #[error("invalid subject table from {path}")]
    Table {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying validation error.
        source: CoreError,
    },

    /// Returned when results do not line up with the input rows.
    #[error("result for row {row_index} is subject \"{found}\", input has \"{expected}\"")]
    ResultRowMismatch {
        /// Zero-based row index.
        row_index: usize,
        /// Subject in the input table.
        expected: String,
        /// Subject in the results.
        found: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
