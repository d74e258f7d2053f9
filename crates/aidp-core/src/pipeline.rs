//! Prediction and training engines driving every track and grouping.

use std::collections::HashSet;
use std::hash::Hash;

use aidp_classifier::{HoldoutEvaluation, LogisticConfig};
use tracing::{info, instrument};

use crate::diagnosis::{Diagnosis, DiagnosisEngine};
use crate::domain::ModelKey;
use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::grouping::Grouping;
use crate::report::{PerformanceReport, ReportSink};
use crate::results::ResultTable;
use crate::schema::ColumnSchema;
use crate::store::ModelStore;
use crate::table::SubjectTable;

/// Tracks, groupings, reference columns, and classifier settings handed
/// to the engines.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | experiments | both, dmri, clinical |
/// | groupings   | all six, in [`Grouping::ALL`] order |
/// | schema      | [`ColumnSchema::standard`] |
/// | classifier  | [`LogisticConfig::default`] |
/// | holdout     | 20% validation, seed 42 |
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    experiments: Vec<Experiment>,
    groupings: Vec<Grouping>,
    schema: ColumnSchema,
    classifier: LogisticConfig,
    holdout: HoldoutEvaluation,
}

fn check_unique<T: Copy + Eq + Hash>(items: &[T], what: &str) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::InvalidPipeline {
            reason: format!("no {what} selected"),
        });
    }
    let mut seen = HashSet::new();
    if !items.iter().all(|item| seen.insert(*item)) {
        return Err(CoreError::InvalidPipeline {
            reason: format!("{what} listed more than once"),
        });
    }
    Ok(())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            experiments: Experiment::ALL.to_vec(),
            groupings: Grouping::ALL.to_vec(),
            schema: ColumnSchema::standard(),
            classifier: LogisticConfig::default(),
            holdout: HoldoutEvaluation::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration over the given tracks and groupings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPipeline`] if either list is empty or
    /// repeats an entry.
    pub fn new(experiments: Vec<Experiment>, groupings: Vec<Grouping>) -> Result<Self, CoreError> {
        check_unique(&experiments, "experiments")?;
        check_unique(&groupings, "groupings")?;
        Ok(Self {
            experiments,
            groupings,
            ..Self::default()
        })
    }

    /// Replace the reference column list.
    #[must_use]
    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the classifier settings.
    #[must_use]
    pub fn with_classifier(mut self, classifier: LogisticConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the holdout settings.
    #[must_use]
    pub fn with_holdout(mut self, holdout: HoldoutEvaluation) -> Self {
        self.holdout = holdout;
        self
    }

    /// Tracks in run order.
    #[must_use]
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Groupings in column order.
    #[must_use]
    pub fn groupings(&self) -> &[Grouping] {
        &self.groupings
    }

    /// Reference column list.
    #[must_use]
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Classifier settings.
    #[must_use]
    pub fn classifier(&self) -> &LogisticConfig {
        &self.classifier
    }

    /// Holdout settings.
    #[must_use]
    pub fn holdout(&self) -> &HoldoutEvaluation {
        &self.holdout
    }
}

/// Aggregated probabilities and the diagnosis for each subject.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    /// Probability columns of every track, merged by subject.
    pub results: ResultTable,
    /// One diagnosis per subject, in result order.
    pub diagnoses: Vec<Diagnosis>,
}

impl PredictionOutcome {
    /// Number of subjects per diagnosis, over [`Diagnosis::ALL`].
    #[must_use]
    pub fn diagnosis_counts(&self) -> Vec<(Diagnosis, usize)> {
        Diagnosis::ALL
            .iter()
            .map(|&d| (d, self.diagnoses.iter().filter(|&&x| x == d).count()))
            .collect()
    }
}

/// Predicts every track, aggregates, and diagnoses.
#[derive(Debug)]
pub struct PredictionEngine<'a, S: ModelStore + ?Sized> {
    config: &'a PipelineConfig,
    store: &'a S,
    diagnosis: DiagnosisEngine,
}

impl<'a, S: ModelStore + ?Sized> PredictionEngine<'a, S> {
    /// Create an engine reading models from `store`.
    pub fn new(config: &'a PipelineConfig, store: &'a S) -> Self {
        Self {
            config,
            store,
            diagnosis: DiagnosisEngine::default(),
        }
    }

    /// Run prediction for `table` with the models in collection `model_key`.
    ///
    /// # Errors
    ///
    /// Any error from [`Experiment::predict`], aggregation, or diagnosis.
    /// The first failure aborts the run.
    #[instrument(skip_all, fields(model_key = %model_key, n_subjects = table.n_subjects()))]
    pub fn run(&self, table: &SubjectTable, model_key: &ModelKey) -> Result<PredictionOutcome, CoreError> {
        let mut tracks = Vec::with_capacity(self.config.experiments().len());
        for &experiment in self.config.experiments() {
            let predictions = experiment.predict(table, self.config, self.store, model_key)?;
            tracks.push(predictions.into_result_table()?);
        }

        let results = ResultTable::aggregate(tracks)?.ok_or_else(|| CoreError::InvalidPipeline {
            reason: "no experiments selected".to_string(),
        })?;
        let diagnoses = self.diagnosis.diagnose(&results)?;

        info!(
            n_columns = results.columns().len(),
            n_subjects = results.n_subjects(),
            "predictions aggregated"
        );
        Ok(PredictionOutcome { results, diagnoses })
    }
}

/// Trains every track, persists models, and writes performance reports.
pub struct TrainingEngine<'a, S: ModelStore + ?Sized, R: ReportSink + ?Sized> {
    config: &'a PipelineConfig,
    store: &'a S,
    sink: &'a mut R,
    persist: bool,
}

impl<'a, S: ModelStore + ?Sized, R: ReportSink + ?Sized> TrainingEngine<'a, S, R> {
    /// Create an engine saving into `store` and reporting to `sink`.
    pub fn new(config: &'a PipelineConfig, store: &'a S, sink: &'a mut R) -> Self {
        Self {
            config,
            store,
            sink,
            persist: true,
        }
    }

    /// Whether fitted models are saved. Defaults to `true`.
    #[must_use]
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Train every track on `table` into collection `model_key`.
    ///
    /// Every track and grouping is fitted before anything is saved, so a
    /// failed fit leaves the store untouched and the key free for a retry.
    /// Reports are written to the sink after the models are saved.
    ///
    /// # Errors
    ///
    /// Any error from [`Experiment::train`], the store, or the report sink.
    /// The first failure aborts the run.
    #[instrument(skip_all, fields(model_key = %model_key, n_subjects = table.n_subjects(), persist = self.persist))]
    pub fn run(&mut self, table: &SubjectTable, model_key: &ModelKey) -> Result<Vec<PerformanceReport>, CoreError> {
        let mut tracks = Vec::with_capacity(self.config.experiments().len());
        for &experiment in self.config.experiments() {
            let track = experiment.train(table, self.config)?;
            info!(experiment = experiment.key(), n_groupings = track.records.len(), "track trained");
            tracks.push(track);
        }

        if self.persist {
            for track in &tracks {
                track.save(self.store, model_key)?;
            }
        }

        let mut reports = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let report = track.report(model_key);
            self.sink.write_report(&report)?;
            reports.push(report);
        }
        Ok(reports)
    }
}
