use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moviemash_engine::algorithms::retriever::top_k;
use moviemash_engine::algorithms::{FactorizationModel, IdMapper, Trainer, TrainingParams};
use moviemash_engine::services::extraction::build_training_set;
use moviemash_engine::services::recommendation::Recommender;
use moviemash_engine::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_votes(num_votes: i64, num_users: i64, num_movies: i64) -> Vec<Vote> {
    let mut rng = StdRng::seed_from_u64(17);
    (1..=num_votes)
        .map(|id| {
            let movies = (0..TOP4_SET_SIZE)
                .map(|_| {
                    if rng.gen_bool(0.1) {
                        None
                    } else {
                        Some(rng.gen_range(0..num_movies))
                    }
                })
                .collect();
            Vote::new(id, rng.gen_range(0..num_users), movies)
        })
        .collect()
}

fn benchmark_training(c: &mut Criterion) {
    let votes = synthetic_votes(2_000, 300, 1_000);
    let set = build_training_set(&votes).unwrap();

    c.bench_function("build_training_set_2k_votes", |b| {
        b.iter(|| black_box(build_training_set(&votes).unwrap()));
    });

    c.bench_function("fit_one_epoch_adam", |b| {
        let trainer = Trainer::new(TrainingParams::default().with_epochs(1).with_seed(1));
        b.iter(|| {
            black_box(
                trainer
                    .fit(&set.interactions, set.num_users(), set.num_movies())
                    .unwrap(),
            )
        });
    });
}

fn benchmark_recommendation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let scores: Vec<f32> = (0..50_000).map(|_| rng.gen()).collect();

    c.bench_function("top_20_of_50k", |b| {
        b.iter(|| black_box(top_k(&scores, 20)));
    });

    let model = FactorizationModel::init(500, 5_000, 50, &mut rng);
    let mapper = IdMapper::build(0..500, 0..5_000);
    let recommender = Recommender::new();
    recommender.install(model, mapper).unwrap();

    c.bench_function("recommend_single_user", |b| {
        b.iter(|| black_box(recommender.recommend(42, 20)));
    });

    c.bench_function("recommend_all_500_users", |b| {
        b.iter(|| black_box(recommender.recommend_all(20).unwrap()));
    });
}

criterion_group!(benches, benchmark_training, benchmark_recommendation);
criterion_main!(benches);
