//! CSV in, models on disk, CSV out.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use aidp_core::{
    ColumnSchema, CoreError, Experiment, ModelKey, PerformanceReport, PipelineConfig, PredictionEngine,
    TrainingEngine,
};
use aidp_io::{FsModelStore, ResultWriter, SubjectReader};

/// Write a labelled cohort CSV with the standard columns plus a free-text
/// `Site` column, 10 subjects per class.
fn write_cohort(dir: &Path) -> PathBuf {
    let schema = ColumnSchema::standard();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut csv = String::from("Subject,Site,GroupID");
    for name in schema.names() {
        write!(csv, ",{name}").unwrap();
    }
    csv.push('\n');

    for i in 0..10 {
        for code in 0..4u8 {
            write!(csv, "S{code}{i:02},site-{},{code}", i % 3).unwrap();
            for j in 0..schema.len() {
                let raised = match j % 4 {
                    0 => code != 0,
                    1 => code >= 2,
                    2 => code == 3,
                    _ => false,
                };
                let base = if raised { 3.0 } else { 0.0 };
                write!(csv, ",{}", base + rng.r#gen::<f64>()).unwrap();
            }
            csv.push('\n');
        }
    }

    let path = dir.join("cohort.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

#[test]
fn train_then_predict_round_trip() {
    let dir = TempDir::new().unwrap();
    let input_path = write_cohort(dir.path());
    let models_dir = dir.path().join("models");
    let out_dir = dir.path().join("out");
    let key = ModelKey::new("2024-02-01-120000000000").unwrap();
    let config = PipelineConfig::default();
    let store = FsModelStore::new(&models_dir);

    // Train.
    let input = SubjectReader::new(&input_path, ColumnSchema::standard())
        .with_labels_required(true)
        .read()
        .unwrap();
    let mut writer = ResultWriter::new(&out_dir).unwrap();
    let reports = TrainingEngine::new(&config, &store, &mut writer)
        .run(input.table(), &key)
        .unwrap();
    assert_eq!(reports.len(), 3);

    let collection: Vec<_> = std::fs::read_dir(models_dir.join(key.as_str()))
        .unwrap()
        .collect();
    assert_eq!(collection.len(), 18);
    for experiment in Experiment::ALL {
        let report = out_dir.join(format!("{key}_{}_Training_Performance.csv", experiment.key()));
        let mut rdr = csv::Reader::from_path(&report).unwrap();
        assert_eq!(rdr.headers().unwrap().len(), 23);
        assert_eq!(rdr.records().count(), 6);
    }

    // Predict.
    let input = SubjectReader::new(&input_path, ColumnSchema::standard())
        .read()
        .unwrap();
    let outcome = PredictionEngine::new(&config, &store)
        .run(input.table(), &key)
        .unwrap();
    let out_path = writer.write_predictions(&input_path, &input, &outcome).unwrap();
    assert_eq!(out_path, out_dir.join("cohort_out.csv"));

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header.len(), input.header().len() + 18 + 1);
    assert_eq!(header[1], "Site");
    assert_eq!(header.last().unwrap(), "Predicted_diagnosis");

    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 40);
    let n_in = input.header().len();
    for (row, original) in rows.iter().zip(input.records()) {
        assert_eq!(&row[0], original[0].as_str());
        assert_eq!(&row[1], original[1].as_str());
        for p in row.iter().skip(n_in).take(18) {
            let p: f64 = p.parse().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
        let diagnosis = &row[n_in + 18];
        assert!(
            ["Not Parkinsonism", "PD", "MSA", "PSP"].contains(&diagnosis),
            "unexpected diagnosis {diagnosis}"
        );
    }

    // Controls separate cleanly from parkinsonism.
    for row in rows.iter().filter(|r| &r[2] == "0") {
        assert_eq!(&row[n_in + 18], "Not Parkinsonism");
    }
}

#[test]
fn prediction_without_models_fails() {
    let dir = TempDir::new().unwrap();
    let input_path = write_cohort(dir.path());
    let store = FsModelStore::new(&dir.path().join("models"));
    let input = SubjectReader::new(&input_path, ColumnSchema::standard())
        .read()
        .unwrap();

    let config = PipelineConfig::default();
    let err = PredictionEngine::new(&config, &store)
        .run(input.table(), &ModelKey::new("default").unwrap())
        .unwrap_err();
    assert!(matches!(err, CoreError::ModelNotFound { .. }));
}

#[test]
fn missing_reference_column_aborts_training() {
    let dir = TempDir::new().unwrap();
    let input_path = write_cohort(dir.path());
    let mut schema_names = ColumnSchema::standard().names().join("\n");
    schema_names.push_str("\nMidbrain_FA\n");
    let schema = ColumnSchema::parse(&schema_names).unwrap();

    let input = SubjectReader::new(&input_path, schema.clone())
        .with_labels_required(true)
        .read()
        .unwrap();
    let config = PipelineConfig::default().with_schema(schema);
    let store = FsModelStore::new(&dir.path().join("models"));
    let mut sink: Vec<PerformanceReport> = Vec::new();
    let err = TrainingEngine::new(&config, &store, &mut sink)
        .run(input.table(), &ModelKey::new("default").unwrap())
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingColumn { ref column } if column == "Midbrain_FA"));
    assert!(!dir.path().join("models").exists());
}

#[test]
fn shipped_column_list_matches_builtin_schema() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../resources/column_names.conf");
    let schema = aidp_io::read_column_schema(&path).unwrap();
    assert_eq!(schema, ColumnSchema::standard());
}
