//! File I/O, validation, and model persistence for the AIDP pipeline.

mod error;
mod reader;
mod store;
mod writer;

pub use error::IoError;
pub use reader::{InputTable, SubjectReader, read_column_schema};
pub use store::FsModelStore;
pub use writer::ResultWriter;
