//! Criterion benchmarks for aidp-classifier: training and batch prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use aidp_classifier::LogisticConfig;

fn make_classification(
    n_samples: usize,
    n_features: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % 2;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 } else { 0.0 };
                base + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    let names: Vec<String> = (0..n_features).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_classification(300, 27, 42);
    let cfg = LogisticConfig::default();

    c.bench_function("logistic_train_300x27_500epochs", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_predict(c: &mut Criterion) {
    let (features, labels, names) = make_classification(300, 27, 42);
    let model = LogisticConfig::default().fit(&features, &labels, &names).unwrap();

    c.bench_function("logistic_predict_proba_batch_300x27", |b| {
        b.iter(|| model.predict_proba_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);
