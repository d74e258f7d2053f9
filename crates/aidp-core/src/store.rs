//! Model artifact storage keyed by experiment, grouping, and collection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use aidp_classifier::{ClassifierError, LogisticModel};
use tracing::debug;

use crate::domain::ModelKey;
use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::grouping::Grouping;

/// Persists fitted classifiers addressed by `(experiment, grouping, model_key)`.
///
/// Implementations must never overwrite an existing artifact.
pub trait ModelStore {
    /// Persist `model` under the key triple.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ArtifactExists`] if the triple is already taken,
    /// or a storage error from the backend.
    fn save(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
        model: &LogisticModel,
    ) -> Result<(), CoreError>;

    /// Load the model stored under the key triple.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ModelNotFound`] if nothing is stored there, or
    /// [`CoreError::Classifier`] if the artifact is malformed.
    fn load(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
    ) -> Result<LogisticModel, CoreError>;
}

impl CoreError {
    /// A [`CoreError::ModelNotFound`] for the key triple.
    #[must_use]
    pub fn model_not_found(experiment: Experiment, grouping: Grouping, model_key: &ModelKey) -> Self {
        Self::ModelNotFound {
            experiment: experiment.key().to_string(),
            grouping: grouping.key().to_string(),
            model_key: model_key.to_string(),
        }
    }

    /// A [`CoreError::ArtifactExists`] for the key triple.
    #[must_use]
    pub fn artifact_exists(experiment: Experiment, grouping: Grouping, model_key: &ModelKey) -> Self {
        Self::ArtifactExists {
            experiment: experiment.key().to_string(),
            grouping: grouping.key().to_string(),
            model_key: model_key.to_string(),
        }
    }

    /// A [`CoreError::Classifier`] naming the failing pair.
    #[must_use]
    pub fn classifier(experiment: Experiment, grouping: Grouping, source: ClassifierError) -> Self {
        Self::Classifier {
            experiment: experiment.key().to_string(),
            grouping: grouping.key().to_string(),
            source,
        }
    }
}

type ArtifactKey = (Experiment, Grouping, ModelKey);

/// A [`ModelStore`] holding encoded artifacts in memory.
///
/// Models go through the same binary encoding as on-disk artifacts.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    artifacts: Mutex<HashMap<ArtifactKey, Vec<u8>>>,
}

impl InMemoryModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
        model: &LogisticModel,
    ) -> Result<(), CoreError> {
        let bytes = model
            .to_bytes()
            .map_err(|source| CoreError::classifier(experiment, grouping, source))?;
        let mut artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (experiment, grouping, model_key.clone());
        if artifacts.contains_key(&key) {
            return Err(CoreError::artifact_exists(experiment, grouping, model_key));
        }
        debug!(%experiment, %grouping, %model_key, size_bytes = bytes.len(), "artifact stored");
        artifacts.insert(key, bytes);
        Ok(())
    }

    fn load(
        &self,
        experiment: Experiment,
        grouping: Grouping,
        model_key: &ModelKey,
    ) -> Result<LogisticModel, CoreError> {
        let artifacts = self.artifacts.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = artifacts
            .get(&(experiment, grouping, model_key.clone()))
            .ok_or_else(|| CoreError::model_not_found(experiment, grouping, model_key))?;
        LogisticModel::from_bytes(bytes, Path::new("<memory>"))
            .map_err(|source| CoreError::classifier(experiment, grouping, source))
    }
}
