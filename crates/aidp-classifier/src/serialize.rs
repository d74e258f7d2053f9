//! Model serialization and deserialization via bincode.

use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ClassifierError;
use crate::model::LogisticModel;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_features: usize,
    model: LogisticModel,
}

impl LogisticModel {
    /// Encode the model into its versioned binary form.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::SerializeModel`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassifierError> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_features: self.n_features(),
            model: self.clone(),
        };
        bincode::serialize(&envelope).map_err(|e| ClassifierError::SerializeModel { source: e })
    }

    /// Decode a model from bytes read from `path`.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::DeserializeModel`] | bincode decoding failed |
    /// | [`ClassifierError::IncompatibleModelVersion`] | format version mismatch |
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self, ClassifierError> {
        let envelope: ModelEnvelope =
            bincode::deserialize(bytes).map_err(|e| ClassifierError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ClassifierError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(n_features = envelope.n_features, "model decoded");
        Ok(envelope.model)
    }

    /// Save the model to a new binary file.
    ///
    /// The bytes go to a temporary file in the target directory, which is
    /// then linked into place only if `path` does not exist yet. A failed
    /// write leaves nothing at `path`, and an existing file is never
    /// replaced.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::SerializeModel`] | bincode encoding failed |
    /// | [`ClassifierError::ModelExists`] | a file already exists at `path` |
    /// | [`ClassifierError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ClassifierError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let write_error = |source: std::io::Error| ClassifierError::WriteModel {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(&bytes).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;

        tmp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                ClassifierError::ModelExists {
                    path: path.to_path_buf(),
                }
            } else {
                write_error(e.error)
            }
        })?;

        info!(size_bytes = bytes.len(), n_features = self.n_features(), "model saved");
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClassifierError::ReadModel`] | file read failed |
    /// | [`ClassifierError::DeserializeModel`] | bincode decoding failed |
    /// | [`ClassifierError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ClassifierError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes, path)
    }
}
