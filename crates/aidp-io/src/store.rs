//! Filesystem model store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aidp_classifier::{ClassifierError, LogisticModel};
use aidp_core::{CoreError, Experiment, Grouping, ModelKey, ModelStore};
use tracing::{debug, instrument};

/// Stores models at `{root}/{model_key}/{experiment}_{grouping}.bin`.
///
/// Artifacts are written through [`LogisticModel::save`]: an existing file
/// is never overwritten, and a failed write leaves no partial artifact.
#[derive(Debug, Clone)]
pub struct FsModelStore {
    root: PathBuf,
}

impl FsModelStore {
    /// Create a store rooted at `root`. Nothing is touched until the first save.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one model collection.
    #[must_use]
    pub fn collection_dir(&self, model_key: &ModelKey) -> PathBuf {
        self.root.join(model_key.as_str())
    }

    /// Path of the artifact for the key triple.
    #[must_use]
    pub fn artifact_path(&self, experiment: Experiment, grouping: Grouping, model_key: &ModelKey) -> PathBuf {
        self.collection_dir(model_key)
            .join(format!("{}_{}.bin", experiment.key(), grouping.key()))
    }
}

impl ModelStore for FsModelStore {
    #[instrument(skip(self, model), fields(root = %self.root.display()))]
    fn save(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
        model: &LogisticModel,
    ) -> Result<(), CoreError> {
        let dir = self.collection_dir(model_key);
        fs::create_dir_all(&dir).map_err(|e| CoreError::Storage {
            path: dir.clone(),
            source: e,
        })?;

        let path = self.artifact_path(experiment, grouping, model_key);
        model.save(&path).map_err(|e| match e {
            ClassifierError::ModelExists { .. } => CoreError::artifact_exists(experiment, grouping, model_key),
            ClassifierError::WriteModel { path, source } => CoreError::Storage { path, source },
            other => CoreError::classifier(experiment, grouping, other),
        })?;

        debug!(path = %path.display(), "artifact stored");
        Ok(())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn load(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
    ) -> Result<LogisticModel, CoreError> {
        let path = self.artifact_path(experiment, grouping, model_key);
        let model = LogisticModel::load(&path).map_err(|e| match e {
            ClassifierError::ReadModel { source, .. } if source.kind() == ErrorKind::NotFound => {
                CoreError::model_not_found(experiment, grouping, model_key)
            }
            ClassifierError::ReadModel { path, source } => CoreError::Storage { path, source },
            other => CoreError::classifier(experiment, grouping, other),
        })?;
        debug!(path = %path.display(), n_features = model.n_features(), "model loaded");
        Ok(model)
    }
}
