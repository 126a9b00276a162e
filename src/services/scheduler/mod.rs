use crate::config::SchedulerConfig;
use crate::error::EngineResult;
use crate::services::storage::VoteStore;
use crate::services::training::{PipelineOutcome, TrainingService};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Time source for the poll loop. Tests swap in a clock that does not
/// actually wait.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Whatever the scheduler runs once the new-vote threshold is crossed.
/// `now` is the scheduler clock's time for the tick.
#[async_trait::async_trait]
pub trait Retrainer: Send + Sync {
    async fn retrain(&self, now: DateTime<Utc>) -> EngineResult<PipelineOutcome>;
}

/// Scheduler retrains use the shorter `retrain_epochs` schedule.
pub struct ScheduledRetrain {
    service: Arc<TrainingService>,
    epochs: usize,
}

impl ScheduledRetrain {
    pub fn new(service: Arc<TrainingService>, epochs: usize) -> Self {
        Self { service, epochs }
    }
}

#[async_trait::async_trait]
impl Retrainer for ScheduledRetrain {
    async fn retrain(&self, now: DateTime<Utc>) -> EngineResult<PipelineOutcome> {
        self.service.run_pipeline_at(self.epochs, now).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
    Retraining,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoNewVotes,
    BelowThreshold { new_votes: i64 },
    Retrained { new_votes: i64, outcome: PipelineOutcome },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub retrains: u64,
    pub failures: u64,
}

/// Polls for new votes and retrains once enough of them have arrived.
///
/// Ticks run strictly one after another; a retrain blocks the next poll
/// until it finishes. Errors never end the loop.
pub struct RetrainScheduler<C: Clock = TokioClock> {
    store: Arc<dyn VoteStore>,
    retrainer: Arc<dyn Retrainer>,
    clock: C,
    config: SchedulerConfig,
    state: SchedulerState,
    last_seen_vote_id: i64,
    last_tick_at: Option<DateTime<Utc>>,
    stats: SchedulerStats,
}

impl RetrainScheduler<TokioClock> {
    pub fn new(store: Arc<dyn VoteStore>, retrainer: Arc<dyn Retrainer>, config: SchedulerConfig) -> Self {
        Self::with_clock(store, retrainer, config, TokioClock)
    }
}

impl<C: Clock> RetrainScheduler<C> {
    pub fn with_clock(
        store: Arc<dyn VoteStore>,
        retrainer: Arc<dyn Retrainer>,
        config: SchedulerConfig,
        clock: C,
    ) -> Self {
        Self {
            store,
            retrainer,
            clock,
            last_seen_vote_id: config.initial_watermark,
            config,
            state: SchedulerState::Idle,
            last_tick_at: None,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn last_seen_vote_id(&self) -> i64 {
        self.last_seen_vote_id
    }

    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Runs one poll. The watermark moves forward whenever new votes are
    /// seen, independently of whether a retrain follows.
    pub async fn tick(&mut self) -> EngineResult<TickOutcome> {
        self.stats.ticks += 1;
        let now = self.clock.now();
        self.last_tick_at = Some(now);
        self.state = SchedulerState::Polling;

        let result = self.poll(now).await;

        self.state = SchedulerState::Idle;
        if result.is_err() {
            self.stats.failures += 1;
        }
        result
    }

    async fn poll(&mut self, now: DateTime<Utc>) -> EngineResult<TickOutcome> {
        let new_votes = self.store.count_votes_after(self.last_seen_vote_id).await?;
        if new_votes <= 0 {
            return Ok(TickOutcome::NoNewVotes);
        }

        info!("Found {} new votes", new_votes);

        if let Some(max_id) = self.store.max_vote_id().await? {
            self.last_seen_vote_id = self.last_seen_vote_id.max(max_id);
        }

        if new_votes < self.config.retrain_threshold {
            debug!(
                "{} new votes below retrain threshold {}",
                new_votes, self.config.retrain_threshold
            );
            return Ok(TickOutcome::BelowThreshold { new_votes });
        }

        self.state = SchedulerState::Retraining;
        info!("Retraining model after {} new votes...", new_votes);

        let outcome = self.retrainer.retrain(now).await?;
        self.stats.retrains += 1;
        info!("Model retraining complete");

        Ok(TickOutcome::Retrained { new_votes, outcome })
    }

    /// Polls until `stop` reads `true` (or its sender is dropped). The stop
    /// signal is checked between ticks and also cuts the sleep short.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) {
        let interval = self.config.poll_interval();
        info!(
            "Polling for votes every {:?} (retrain threshold {})",
            interval, self.config.retrain_threshold
        );

        loop {
            if *stop.borrow() {
                break;
            }

            match self.tick().await {
                Ok(outcome) => debug!("Tick finished: {:?}", outcome),
                Err(e) if e.is_recoverable() => warn!("Error polling votes: {}", e),
                Err(e) => error!("Error polling votes: {}", e),
            }

            tokio::select! {
                _ = self.clock.sleep(interval) => {}
                _ = stop.wait_for(|stopped| *stopped) => break,
            }
        }

        info!(
            "Scheduler stopped after {} ticks ({} retrains, {} failures)",
            self.stats.ticks, self.stats.retrains, self.stats.failures
        );
    }
}
