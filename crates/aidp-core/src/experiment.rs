//! Feature-filter tracks and their per-grouping train/predict loops.

use std::fmt;

use aidp_classifier::LogisticModel;
use tracing::{debug, info, instrument};

use crate::domain::{ModelKey, SubjectId};
use crate::error::CoreError;
use crate::grouping::Grouping;
use crate::pipeline::PipelineConfig;
use crate::report::{PerformanceRecord, PerformanceReport};
use crate::results::{ResultTable, probability_column_name};
use crate::schema::{CLINICAL_COLUMNS, CLINICAL_SCORE_COLUMN, ColumnSchema};
use crate::store::ModelStore;
use crate::table::{FeatureMatrix, SubjectTable};

/// A named column subset defining one analysis track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Experiment {
    /// The full standardized set.
    Both,
    /// Every standardized column except the clinical rating score.
    Dmri,
    /// Age, sex, and the clinical rating score only.
    Clinical,
}

/// Probabilities from one track, one entry per grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPredictions {
    /// Track that produced the predictions.
    pub experiment: Experiment,
    /// Subjects in row order.
    pub subject_ids: Vec<SubjectId>,
    /// Positive-class probabilities per grouping, in grouping order.
    pub predictions: Vec<(Grouping, Vec<f64>)>,
}

/// Fitted models and their performance for one track, not yet persisted.
#[derive(Debug, Clone)]
pub struct TrainedTrack {
    /// Track the models were fitted on.
    pub experiment: Experiment,
    /// One fitted model per grouping, in grouping order.
    pub models: Vec<(Grouping, LogisticModel)>,
    /// Training and validation metrics, in grouping order.
    pub records: Vec<PerformanceRecord>,
}

impl Experiment {
    /// All tracks, in engine order.
    pub const ALL: [Self; 3] = [Self::Both, Self::Dmri, Self::Clinical];

    /// Stable string identifier.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Dmri => "dmri",
            Self::Clinical => "clinical",
        }
    }

    /// Look up a track by its key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.key() == key)
    }

    /// Restrict `table` to this track's columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingColumn`] if the table lacks a column in
    /// `schema` or a column the track needs.
    pub fn filter(self, table: &SubjectTable, schema: &ColumnSchema) -> Result<FeatureMatrix, CoreError> {
        let standardized = table.select(schema.names())?;
        let filtered = match self {
            Self::Both => standardized,
            Self::Dmri => standardized.drop_column(CLINICAL_SCORE_COLUMN)?,
            Self::Clinical => {
                let names: Vec<String> = CLINICAL_COLUMNS.iter().map(|c| (*c).to_string()).collect();
                standardized.select(&names)?
            }
        };
        debug!(experiment = self.key(), n_features = filtered.feature_names().len(), "track filtered");
        Ok(filtered)
    }

    /// Predict every configured grouping with models from `store`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::MissingColumn`] | Filtering failed |
    /// | [`CoreError::ModelNotFound`] | No artifact for a grouping |
    /// | [`CoreError::Classifier`] | Artifact malformed or its features disagree |
    #[instrument(skip_all, fields(experiment = self.key(), model_key = %model_key, n_subjects = table.n_subjects()))]
    pub fn predict<S: ModelStore + ?Sized>(
        self,
        table: &SubjectTable,
        config: &PipelineConfig,
        store: &S,
        model_key: &ModelKey,
    ) -> Result<TrackPredictions, CoreError> {
        let matrix = self.filter(table, config.schema())?;

        let mut predictions = Vec::with_capacity(config.groupings().len());
        for &grouping in config.groupings() {
            let model = store.load(self, grouping, model_key)?;
            model
                .check_feature_names(matrix.feature_names())
                .map_err(|e| CoreError::classifier(self, grouping, e))?;
            let probabilities = model
                .predict_proba_batch(matrix.rows())
                .map_err(|e| CoreError::classifier(self, grouping, e))?;
            debug!(grouping = grouping.key(), "grouping predicted");
            predictions.push((grouping, probabilities));
        }

        Ok(TrackPredictions {
            experiment: self,
            subject_ids: matrix.subject_ids().to_vec(),
            predictions,
        })
    }

    /// Fit every configured grouping. Nothing is persisted here.
    ///
    /// The fitted model is the one trained on the training partition of
    /// the holdout split, so its reported metrics describe it exactly.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CoreError::MissingColumn`] | Filtering failed |
    /// | [`CoreError::MissingLabels`] | The table has no labels |
    /// | [`CoreError::LabelMismatch`] | A grouping lacks one of its classes |
    /// | [`CoreError::Classifier`] | Training failed |
    #[instrument(skip_all, fields(experiment = self.key(), n_subjects = table.n_subjects()))]
    pub fn train(self, table: &SubjectTable, config: &PipelineConfig) -> Result<TrainedTrack, CoreError> {
        let matrix = self.filter(table, config.schema())?;

        let mut models = Vec::with_capacity(config.groupings().len());
        let mut records = Vec::with_capacity(config.groupings().len());
        for &grouping in config.groupings() {
            let grouped = grouping.group(&matrix)?;
            let result = config
                .holdout()
                .evaluate(
                    config.classifier(),
                    &grouped.features,
                    &grouped.labels,
                    &grouped.feature_names,
                )
                .map_err(|e| CoreError::classifier(self, grouping, e))?;

            info!(
                grouping = grouping.key(),
                n_train = result.n_train,
                n_validation = result.n_validation,
                validation_auc = result.validation.auc,
                "grouping trained"
            );
            records.push(PerformanceRecord {
                grouping,
                training: result.training,
                validation: result.validation,
                n_train: result.n_train,
                n_validation: result.n_validation,
            });
            models.push((grouping, result.model));
        }

        Ok(TrainedTrack {
            experiment: self,
            models,
            records,
        })
    }
}

impl TrainedTrack {
    /// Save every fitted model into collection `model_key`.
    ///
    /// # Errors
    ///
    /// Any error from [`ModelStore::save`], e.g. [`CoreError::ArtifactExists`].
    pub fn save<S: ModelStore + ?Sized>(&self, store: &S, model_key: &ModelKey) -> Result<(), CoreError> {
        for (grouping, model) in &self.models {
            store.save(self.experiment, *grouping, model_key, model)?;
        }
        Ok(())
    }

    /// Performance report for this track under `model_key`.
    #[must_use]
    pub fn report(&self, model_key: &ModelKey) -> PerformanceReport {
        PerformanceReport {
            experiment: self.experiment,
            model_key: model_key.clone(),
            records: self.records.clone(),
        }
    }
}

impl TrackPredictions {
    /// Build the track's named-column result table, in grouping order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateColumn`] if a grouping repeats.
    pub fn into_result_table(self) -> Result<ResultTable, CoreError> {
        let mut table = ResultTable::new(self.subject_ids);
        for (grouping, probabilities) in self.predictions {
            table.push_column(probability_column_name(self.experiment, grouping), probabilities)?;
        }
        Ok(table)
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
