use std::sync::Arc;

use cadastre_model::{CadastralNumber, Parcel};
use tokio::sync::{broadcast, mpsc, mpsc::error::TrySendError};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::{Scorer, ScoringConfig};
use crate::database::ports::results::ResultRepository;
use crate::error::{CadastreError, Result};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A parcel waiting to be scored.
#[derive(Debug, Clone)]
pub struct ScoringJob {
    pub parcel: Parcel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoringOutcome {
    Completed(f64),
    Failed(String),
}

/// Published once per job when it finishes, successfully or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringEvent {
    pub cadastral_number: CadastralNumber,
    pub outcome: ScoringOutcome,
}

/// Producer side of the job queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ScoringQueue {
    tx: mpsc::Sender<ScoringJob>,
}

impl ScoringQueue {
    /// Never waits: a full queue or a shut-down pool is reported as
    /// [`CadastreError::Unavailable`] and the job is dropped.
    pub fn enqueue(&self, parcel: Parcel) -> Result<()> {
        self.tx.try_send(ScoringJob { parcel }).map_err(|err| match err {
            TrySendError::Full(job) => CadastreError::Unavailable(format!(
                "scoring queue is full; dropped job for {}",
                job.parcel.cadastral_number
            )),
            TrySendError::Closed(job) => CadastreError::Unavailable(format!(
                "scoring queue is closed; dropped job for {}",
                job.parcel.cadastral_number
            )),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs scoring jobs in the background, each in its own task, with a cap on
/// how many run at once.
pub struct ScoringWorkerPool {
    dispatcher: JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
    events: broadcast::Sender<ScoringEvent>,
    config: ScoringConfig,
}

impl std::fmt::Debug for ScoringWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringWorkerPool")
            .field("max_concurrent_jobs", &self.config.max_concurrent_jobs)
            .field("queue_capacity", &self.config.queue_capacity)
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl ScoringWorkerPool {
    pub fn start(
        config: ScoringConfig,
        scorer: Arc<dyn Scorer>,
        results: Arc<dyn ResultRepository>,
    ) -> (Self, ScoringQueue) {
        let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let dispatcher = tokio::spawn(Self::dispatch_loop(
            config.clone(),
            scorer,
            results,
            events.clone(),
            jobs_rx,
            shutdown_rx,
        ));

        info!(
            max_concurrent_jobs = config.max_concurrent_jobs,
            queue_capacity = config.queue_capacity,
            "Started scoring worker pool"
        );

        (
            Self {
                dispatcher,
                shutdown_tx,
                events,
                config,
            },
            ScoringQueue { tx: jobs_tx },
        )
    }

    /// Receive an event for every job that finishes after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ScoringEvent> {
        self.events.subscribe()
    }

    /// Stop taking jobs, give in-flight jobs the configured grace period,
    /// then abort whatever is still running.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(err) = self.dispatcher.await {
            error!("Scoring dispatcher ended abnormally: {err}");
        }
    }

    async fn dispatch_loop(
        config: ScoringConfig,
        scorer: Arc<dyn Scorer>,
        results: Arc<dyn ResultRepository>,
        events: broadcast::Sender<ScoringEvent>,
        mut jobs_rx: mpsc::Receiver<ScoringJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let max_in_flight = config.max_concurrent_jobs.max(1);
        let mut tasks = JoinSet::new();
        let mut queue_open = true;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::log_join(joined);
                }
                job = jobs_rx.recv(), if queue_open && tasks.len() < max_in_flight => {
                    match job {
                        Some(job) => {
                            tasks.spawn(Self::run_job(
                                job,
                                scorer.clone(),
                                results.clone(),
                                events.clone(),
                            ));
                        }
                        None => queue_open = false,
                    }
                }
            }
        }

        jobs_rx.close();
        let mut dropped = 0usize;
        while let Ok(job) = jobs_rx.try_recv() {
            dropped += 1;
            warn!(
                cadastral_number = %job.parcel.cadastral_number,
                "Scoring job dropped at shutdown; result stays pending"
            );
        }

        let in_flight = tasks.len();
        info!(
            in_flight,
            dropped,
            grace_secs = config.shutdown_grace.as_secs_f64(),
            "Scoring worker pool shutting down"
        );

        let drained = timeout(config.shutdown_grace, async {
            while let Some(joined) = tasks.join_next().await {
                Self::log_join(joined);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                aborted = tasks.len(),
                "Aborting scoring jobs still running after the grace period"
            );
            tasks.shutdown().await;
        }
    }

    async fn run_job(
        job: ScoringJob,
        scorer: Arc<dyn Scorer>,
        results: Arc<dyn ResultRepository>,
        events: broadcast::Sender<ScoringEvent>,
    ) {
        let cadastral_number = job.parcel.cadastral_number.clone();
        info!(%cadastral_number, "Scoring job started");

        let outcome = match scorer.score(&job.parcel).await {
            Ok(score) => {
                match results.update_score(&cadastral_number, score).await {
                    Ok(0) => {
                        warn!(
                            %cadastral_number,
                            "Scored parcel has no result row; it was removed"
                        );
                        ScoringOutcome::Failed("result row not found".into())
                    }
                    Ok(_) => {
                        info!(%cadastral_number, score, "Scoring job completed");
                        ScoringOutcome::Completed(score)
                    }
                    Err(err) => {
                        error!(%cadastral_number, "Failed to store score: {err}");
                        ScoringOutcome::Failed(err.to_string())
                    }
                }
            }
            Err(err) => {
                error!(%cadastral_number, "Scoring failed: {err}");
                ScoringOutcome::Failed(err.to_string())
            }
        };

        // No subscribers is the normal case outside tests.
        let _ = events.send(ScoringEvent {
            cadastral_number,
            outcome,
        });
    }

    fn log_join(joined: std::result::Result<(), JoinError>) {
        if let Err(err) = joined
            && err.is_panic()
        {
            error!("Scoring job panicked: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::database::ports::territory::TerritoryRepository;
    use crate::scoring::{FixedScorer, MockScorer};
    use cadastre_model::ScoreLookup;
    use std::time::Duration;

    fn parcel(number: &str) -> Parcel {
        Parcel::new(number, -30.2155, 70.1558).unwrap()
    }

    fn config() -> ScoringConfig {
        ScoringConfig {
            max_concurrent_jobs: 2,
            queue_capacity: 8,
            shutdown_grace: Duration::from_secs(1),
            ..ScoringConfig::default()
        }
    }

    #[tokio::test]
    async fn completed_jobs_write_the_score_and_publish_an_event() {
        let store = Arc::new(InMemoryStore::new());
        let parcel = parcel("66:66:666666:65");
        let id = store.create(&parcel).await.unwrap();

        let (pool, queue) = ScoringWorkerPool::start(
            config(),
            Arc::new(FixedScorer::new(55.532757)),
            store.clone(),
        );
        let mut events = pool.subscribe();

        queue.enqueue(parcel.clone()).unwrap();
        let event = events.recv().await.unwrap();

        assert_eq!(event.cadastral_number, parcel.cadastral_number);
        assert_eq!(event.outcome, ScoringOutcome::Completed(55.532757));
        assert_eq!(
            store.get_score(id).await.unwrap(),
            ScoreLookup::Computed(55.532757)
        );
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn scorer_failure_leaves_the_row_pending() {
        let store = Arc::new(InMemoryStore::new());
        let parcel = parcel("11:11:111111:11");
        let id = store.create(&parcel).await.unwrap();

        let mut scorer = MockScorer::new();
        scorer
            .expect_score()
            .times(1)
            .returning(|_| Err(CadastreError::Scoring("remote blew up".into())));

        let (pool, queue) =
            ScoringWorkerPool::start(config(), Arc::new(scorer), store.clone());
        let mut events = pool.subscribe();

        queue.enqueue(parcel).unwrap();
        let event = events.recv().await.unwrap();

        assert!(matches!(
            event.outcome,
            ScoringOutcome::Failed(ref message) if message.contains("remote blew up")
        ));
        assert_eq!(store.get_score(id).await.unwrap(), ScoreLookup::Pending);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn missing_result_row_is_reported_as_failure() {
        let store = Arc::new(InMemoryStore::new());
        let (pool, queue) = ScoringWorkerPool::start(
            config(),
            Arc::new(FixedScorer::new(1.0)),
            store,
        );
        let mut events = pool.subscribe();

        queue.enqueue(parcel("22:22:222222:22")).unwrap();
        let event = events.recv().await.unwrap();

        assert_eq!(
            event.outcome,
            ScoringOutcome::Failed("result row not found".into())
        );
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_run_concurrently_up_to_the_cap() {
        let store = Arc::new(InMemoryStore::new());
        let numbers = ["10:00:000000:01", "10:00:000000:02", "10:00:000000:03"];
        for number in numbers {
            store.create(&parcel(number)).await.unwrap();
        }

        let scorer =
            FixedScorer::new(7.0).with_delay(Duration::from_secs(10));
        let (pool, queue) =
            ScoringWorkerPool::start(config(), Arc::new(scorer), store);
        let mut events = pool.subscribe();

        let started = tokio::time::Instant::now();
        for number in numbers {
            queue.enqueue(parcel(number)).unwrap();
        }

        let mut finished_at = Vec::new();
        for _ in numbers {
            let event = events.recv().await.unwrap();
            assert_eq!(event.outcome, ScoringOutcome::Completed(7.0));
            finished_at.push(started.elapsed());
        }

        // Two run side by side, the third waits for a free slot.
        assert!(finished_at[1] < Duration::from_secs(11));
        assert!(finished_at[2] >= Duration::from_secs(20));
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_rejects_without_waiting() {
        let store = Arc::new(InMemoryStore::new());
        let config = ScoringConfig {
            max_concurrent_jobs: 1,
            queue_capacity: 1,
            ..config()
        };
        let scorer =
            FixedScorer::new(3.0).with_delay(Duration::from_secs(15));
        let (pool, queue) =
            ScoringWorkerPool::start(config, Arc::new(scorer), store);

        queue.enqueue(parcel("40:00:000000:01")).unwrap();
        // The dispatcher takes the first job; the second fills the queue.
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.enqueue(parcel("40:00:000000:02")).unwrap();

        let err = queue.enqueue(parcel("40:00:000000:03")).unwrap_err();
        assert!(
            matches!(err, CadastreError::Unavailable(ref message) if message.contains("full")),
            "{err:?}"
        );
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_jobs_that_outlive_the_grace_period() {
        let store = Arc::new(InMemoryStore::new());
        let parcel = parcel("33:33:333333:33");
        let id = store.create(&parcel).await.unwrap();

        let scorer =
            FixedScorer::new(9.0).with_delay(Duration::from_secs(60));
        let (pool, queue) =
            ScoringWorkerPool::start(config(), Arc::new(scorer), store.clone());

        queue.enqueue(parcel.clone()).unwrap();
        // Let the dispatcher pick the job up before shutting down.
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.shutdown().await;

        assert_eq!(store.get_score(id).await.unwrap(), ScoreLookup::Pending);
        assert!(queue.is_closed());
        assert!(matches!(
            queue.enqueue(parcel),
            Err(CadastreError::Unavailable(_))
        ));
    }
}
