use moviemash_engine::services::scheduler::{RetrainScheduler, ScheduledRetrain, TickOutcome};
use moviemash_engine::services::storage::{MemoryVoteStore, VoteStore};
use moviemash_engine::services::training::PipelineOutcome;
use moviemash_engine::*;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn scenario_votes() -> Vec<Vote> {
    vec![
        Vote::new(1, 1, vec![Some(10), Some(11), Some(12), None]),
        Vote::new(2, 2, vec![Some(10), Some(13), Some(14), Some(15)]),
    ]
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.training.seed = Some(2024);
    config.recommendation.top_k = 3;
    config
}

fn app(votes: Vec<Vote>) -> (AppState, Arc<MemoryVoteStore>) {
    let store = Arc::new(MemoryVoteStore::with_votes(votes));
    (AppState::with_store(test_config(), store.clone()), store)
}

#[tokio::test]
async fn test_two_vote_scenario() {
    let (state, _store) = app(scenario_votes());

    let outcome = assert_ok!(state.training_service.train_now().await);
    let report = match outcome {
        PipelineOutcome::Trained(report) => report,
        PipelineOutcome::Skipped => panic!("scenario should train"),
    };
    assert_eq!(report.num_interactions, 7);

    let snapshot = state.recommender.snapshot().expect("model installed");
    assert_eq!(snapshot.mapper.user_index(1).unwrap(), 0);
    assert_eq!(snapshot.mapper.user_index(2).unwrap(), 1);
    for (idx, movie) in [10, 11, 12, 13, 14, 15].iter().enumerate() {
        assert_eq!(snapshot.mapper.movie_index(*movie).unwrap(), idx);
    }

    let recs = state.recommender.recommend(1, 3);
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|(m, _)| (10..=15).contains(m)));
    assert!(recs.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[tokio::test]
async fn test_recommendations_are_bounded_by_catalogue() {
    let (state, _store) = app(scenario_votes());
    assert_ok!(state.training_service.train_now().await);

    for top_k in [0, 1, 6, 50] {
        let recs = state.recommender.recommend(2, top_k);
        assert_eq!(recs.len(), top_k.min(6));
        assert!(recs.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

#[tokio::test]
async fn test_empty_window_preserves_model() {
    let (state, store) = app(scenario_votes());
    assert_ok!(state.training_service.train_now().await);
    let before = state.recommender.snapshot().unwrap();

    // A store that only contains null-only votes trains nothing
    let empty = Arc::new(MemoryVoteStore::with_votes(vec![Vote::new(
        3,
        9,
        vec![None, None, None, None],
    )]));
    let service = moviemash_engine::services::training::TrainingService::new(
        empty,
        state.recommender.clone(),
        state.config.clone(),
    );
    assert_eq!(assert_ok!(service.train_now().await), PipelineOutcome::Skipped);

    let after = state.recommender.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(store.vote_count(), 2);
}

#[tokio::test]
async fn test_unknown_user_from_previous_generation() {
    let (state, store) = app(scenario_votes());
    assert_ok!(state.training_service.train_now().await);
    assert!(!state.recommender.recommend(1, 3).is_empty());

    // Next generation only sees user 2
    let next = Arc::new(MemoryVoteStore::with_votes(vec![Vote::new(
        5,
        2,
        vec![Some(10), Some(20), None, None],
    )]));
    let service = moviemash_engine::services::training::TrainingService::new(
        next,
        state.recommender.clone(),
        state.config.clone(),
    );
    assert_ok!(service.train_now().await);

    assert_eq!(state.recommender.generation(), Some(2));
    assert!(state.recommender.recommend(1, 3).is_empty());
    assert_err!(state.recommender.try_recommend(1, 3));
    assert_eq!(store.vote_count(), 2);
}

#[tokio::test]
async fn test_persisting_replaces_previous_rows() {
    let store = MemoryVoteStore::new();
    assert_ok!(
        store
            .replace_recommendations(1, &[Recommendation::new(1, 20, 0.5)])
            .await
    );

    assert_ok!(
        store
            .replace_recommendations(
                1,
                &[Recommendation::new(1, 10, 0.9), Recommendation::new(1, 11, 0.8)],
            )
            .await
    );

    let rows = assert_ok!(store.recommendations_for(1).await);
    let pairs: Vec<_> = rows.iter().map(|r| (r.user_id, r.movie_id, r.score)).collect();
    assert_eq!(pairs, vec![(1, 10, 0.9), (1, 11, 0.8)]);
}

#[tokio::test]
async fn test_scheduler_retrains_and_persists() {
    let votes: Vec<Vote> = (1..=100)
        .map(|id| Vote::new(id, id % 5, vec![Some(100 + id % 9), Some(200 + id % 4), None, None]))
        .collect();
    let (state, store) = app(votes);

    let retrainer = Arc::new(ScheduledRetrain::new(
        state.training_service.clone(),
        state.config.training.retrain_epochs,
    ));
    let mut scheduler =
        RetrainScheduler::new(state.store.clone(), retrainer, state.config.scheduler.clone());

    let outcome = assert_ok!(scheduler.tick().await);
    match outcome {
        TickOutcome::Retrained {
            new_votes,
            outcome: PipelineOutcome::Trained(report),
        } => {
            assert_eq!(new_votes, 100);
            assert_eq!(report.num_users, 5);
            assert_eq!(report.users_persisted, 5);
        }
        other => panic!("expected a retrain, got {:?}", other),
    }

    assert_eq!(scheduler.last_seen_vote_id(), 100);
    for user in 0..5 {
        let rows = assert_ok!(store.recommendations_for(user).await);
        assert_eq!(rows.len(), 3);
    }
}

#[tokio::test]
async fn test_scheduler_error_does_not_touch_state() {
    let (state, store) = app(scenario_votes());
    let retrainer = Arc::new(ScheduledRetrain::new(state.training_service.clone(), 1));
    let mut scheduler =
        RetrainScheduler::new(state.store.clone(), retrainer, state.config.scheduler.clone());

    store.fail_next(1);
    assert_err!(scheduler.tick().await);
    assert_eq!(scheduler.last_seen_vote_id(), 0);
    assert!(state.recommender.snapshot().is_none());

    assert_eq!(
        assert_ok!(scheduler.tick().await),
        TickOutcome::BelowThreshold { new_votes: 2 }
    );
    assert_eq!(scheduler.last_seen_vote_id(), 2);
}
