//! Criterion benchmarks for harvest-rf: tree induction, bagging, and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use harvest_rf::{BaggingConfig, DecisionTreeConfig};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn bench_bagging_train(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let cfg = BaggingConfig::new(50).unwrap().with_seed(42);

    c.bench_function("bagging_train_500x20_5class_50trees", |b| {
        b.iter(|| cfg.fit(&features, &labels).unwrap());
    });
}

fn bench_bagging_predict_batch(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let ensemble = BaggingConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();

    c.bench_function("bagging_predict_batch_500x20_50trees", |b| {
        b.iter(|| ensemble.predict_batch(&features).unwrap());
    });
}

fn bench_single_tree(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let cfg = DecisionTreeConfig::new();

    c.bench_function("tree_fit_500x20_5class", |b| {
        b.iter(|| cfg.fit(&features, &labels).unwrap());
    });
}

fn bench_single_tree_parallel_split(c: &mut Criterion) {
    // Large enough that the root split search runs per feature in parallel.
    let (features, labels) = make_classification(8000, 10, 3, 7);
    let cfg = DecisionTreeConfig::new().with_max_depth(Some(4));

    c.bench_function("tree_fit_8000x10_3class_depth4", |b| {
        b.iter(|| cfg.fit(&features, &labels).unwrap());
    });
}

criterion_group!(
    benches,
    bench_bagging_train,
    bench_bagging_predict_batch,
    bench_single_tree,
    bench_single_tree_parallel_split
);
criterion_main!(benches);
