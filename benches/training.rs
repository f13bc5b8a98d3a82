use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use model_explorer::preprocessing::Labels;
use model_explorer::training::{
    train_and_evaluate, train_test_split, KernelChoice, ModelKind, ModelParams,
};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Labels) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>());

    // Label by the sign of a noisy linear score
    let labels: Vec<&str> = x
        .rows()
        .into_iter()
        .map(|row| {
            let score: f64 = row.iter().enumerate().map(|(j, v)| if j % 2 == 0 { *v } else { -*v }).sum();
            if score + rng.gen::<f64>() * 0.1 > 0.0 { "1" } else { "0" }
        })
        .collect();

    (x, Labels::from_values(labels))
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_and_evaluate");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [200, 1000].iter() {
        let (x, labels) = create_classification_data(*n_rows, 8);
        let split = train_test_split(&x, labels.codes(), 0.2, 1).unwrap();

        for kind in ModelKind::ALL {
            let params = match kind {
                ModelKind::SupportVectorMachine => {
                    ModelParams::SupportVectorMachine { c: 1.0, kernel: KernelChoice::Rbf }
                }
                other => other.default_params(),
            };

            group.bench_with_input(
                BenchmarkId::new(kind.name(), n_rows),
                &split,
                |b, split| {
                    b.iter(|| train_and_evaluate(black_box(&params), black_box(split), &labels).unwrap())
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_models);
criterion_main!(benches);
