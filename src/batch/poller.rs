use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::dto::{BatchJob, JobStatus};
use crate::error::ApiError;

/// Anything that can report the status of a batch job.
#[async_trait]
pub trait JobStatusSource: Send + Sync + 'static {
    async fn job_status(&self, job_id: i64) -> Result<BatchJob, ApiError>;
}

/// How a polling run ended.
#[derive(Debug)]
pub enum PollOutcome {
    Completed(BatchJob),
    Failed(BatchJob),
    Stopped(BatchJob),
    /// The status query itself failed; the job record was left untouched.
    TransportError(ApiError),
    Cancelled,
}

impl PollOutcome {
    pub fn job(&self) -> Option<&BatchJob> {
        match self {
            PollOutcome::Completed(j) | PollOutcome::Failed(j) | PollOutcome::Stopped(j) => Some(j),
            _ => None,
        }
    }
}

/// Result of one status query.
#[derive(Debug)]
pub enum PollStep {
    StillPolling(BatchJob),
    Finished(PollOutcome),
}

pub fn classify(result: Result<BatchJob, ApiError>) -> PollStep {
    match result {
        Ok(job) => match job.status {
            JobStatus::Completed => PollStep::Finished(PollOutcome::Completed(job)),
            JobStatus::Failed => PollStep::Finished(PollOutcome::Failed(job)),
            JobStatus::Stopped => PollStep::Finished(PollOutcome::Stopped(job)),
            _ => PollStep::StillPolling(job),
        },
        Err(e) => PollStep::Finished(PollOutcome::TransportError(e)),
    }
}

/// What the view reads: the last observed job and whether polling is running.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub job: Option<BatchJob>,
    pub polling: bool,
}

/// Handle to a running poll task.
///
/// Dropping the handle leaves the task running until it reaches a terminal
/// status or a query fails; only [`PollHandle::cancel`] stops it early.
pub struct PollHandle {
    job_id: i64,
    cancel_tx: watch::Sender<bool>,
    state: watch::Receiver<PollState>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn cancel(&self) {
        if !self.cancel_tx.send_replace(true) {
            debug!(job_id = self.job_id, "poll cancel requested");
        }
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.state.borrow().polling
    }

    /// Resolves once polling has stopped, with the final published state.
    pub async fn settled(&self) -> PollState {
        let mut rx = self.state.clone();
        loop {
            {
                let current = rx.borrow_and_update();
                if !current.polling {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    /// Waits for the task to finish. A panic inside the task is re-raised here
    /// rather than reported as a cancellation.
    pub async fn outcome(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                warn!(job_id = self.job_id, "poll task panicked");
                std::panic::resume_unwind(e.into_panic())
            }
            Err(e) => {
                warn!(job_id = self.job_id, error = %e, "poll task aborted");
                PollOutcome::Cancelled
            }
        }
    }
}

/// Queries job status immediately and then every `interval` until a terminal
/// status, a failed query, or cancellation.
pub struct BatchPoller<S: JobStatusSource> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: JobStatusSource> Clone for BatchPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            interval: self.interval,
        }
    }
}

impl<S: JobStatusSource> BatchPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Starts polling `job_id`. `initial` is the record returned by the upload
    /// and is what the view shows until the first query answers.
    pub fn spawn(&self, job_id: i64, initial: Option<BatchJob>) -> PollHandle {
        let (state_tx, state_rx) = watch::channel(PollState {
            job: initial,
            polling: true,
        });
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            Arc::clone(&self.source),
            job_id,
            self.interval,
            state_tx,
            cancel_rx,
        ));
        PollHandle {
            job_id,
            cancel_tx,
            state: state_rx,
            task,
        }
    }
}

/// Resolves when cancellation is requested; pends forever if the handle is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn stop(state_tx: &watch::Sender<PollState>, job: Option<BatchJob>) {
    state_tx.send_modify(|s| {
        if job.is_some() {
            s.job = job;
        }
        s.polling = false;
    });
}

async fn run<S: JobStatusSource>(
    source: Arc<S>,
    job_id: i64,
    interval: Duration,
    state_tx: watch::Sender<PollState>,
    mut cancel_rx: watch::Receiver<bool>,
) -> PollOutcome {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(job_id, interval_ms = interval.as_millis() as u64, "polling started");

    loop {
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel_rx) => {
                stop(&state_tx, None);
                info!(job_id, "polling cancelled");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel_rx) => {
                stop(&state_tx, None);
                info!(job_id, "polling cancelled");
                return PollOutcome::Cancelled;
            }
            r = source.job_status(job_id) => r,
        };

        match classify(result) {
            PollStep::StillPolling(job) => {
                debug!(job_id, status = %job.status, "job still running");
                state_tx.send_modify(|s| s.job = Some(job));
            }
            PollStep::Finished(outcome) => {
                match &outcome {
                    PollOutcome::TransportError(e) => {
                        warn!(job_id, error = %e, "status query failed; polling stopped");
                    }
                    other => {
                        if let Some(job) = other.job() {
                            info!(job_id, status = %job.status, "job finished");
                        }
                    }
                }
                stop(&state_tx, outcome.job().cloned());
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn job(status: &str) -> BatchJob {
        BatchJob {
            job_execution_id: 42,
            status: JobStatus::from(status.to_string()),
            start_time: None,
            end_time: None,
            total_records: None,
            success_count: None,
            failure_count: None,
            skip_count: None,
            message: None,
            errors: vec![],
        }
    }

    /// Replays scripted answers and records when each query was made.
    struct Scripted {
        answers: Mutex<VecDeque<Result<BatchJob, ApiError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<BatchJob, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobStatusSource for Scripted {
        async fn job_status(&self, _job_id: i64) -> Result<BatchJob, ApiError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(job("STARTED")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_completed_with_two_second_spacing() {
        let source = Scripted::new(vec![Ok(job("STARTED")), Ok(job("STARTED")), Ok(job("COMPLETED"))]);
        let poller = BatchPoller::new(source.clone(), Duration::from_millis(2000));
        let start = Instant::now();

        let handle = poller.spawn(42, Some(job("STARTED")));
        assert!(handle.is_polling());
        let settled = handle.settled().await;
        assert!(!settled.polling);
        assert_eq!(settled.job.unwrap().status, JobStatus::Completed);

        let outcome = handle.outcome().await;
        assert!(matches!(outcome, PollOutcome::Completed(_)));

        // give a runaway loop the chance to issue more queries
        tokio::time::sleep(Duration::from_secs(10)).await;
        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0] - start, Duration::ZERO);
        assert_eq!(calls[1] - start, Duration::from_millis(2000));
        assert_eq!(calls[2] - start, Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn query_failure_stops_and_keeps_last_job() {
        let source = Scripted::new(vec![
            Ok(job("STARTED")),
            Err(ApiError::Decode("connection reset".into())),
        ]);
        let poller = BatchPoller::new(source.clone(), Duration::from_millis(2000));
        let handle = poller.spawn(42, None);

        let settled = handle.settled().await;
        assert!(!settled.polling);
        assert_eq!(settled.job.unwrap().status, JobStatus::Started);
        assert!(matches!(handle.outcome().await, PollOutcome::TransportError(_)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_on_first_query_leaves_no_job() {
        let source = Scripted::new(vec![Err(ApiError::Decode("eof".into()))]);
        let handle = BatchPoller::new(source.clone(), Duration::from_millis(2000)).spawn(7, None);
        let settled = handle.settled().await;
        assert_eq!(settled, PollState { job: None, polling: false });
    }

    #[tokio::test(start_paused = true)]
    async fn failed_and_stopped_are_terminal() {
        for (status, expect_failed) in [("FAILED", true), ("STOPPED", false)] {
            let source = Scripted::new(vec![Ok(job("STARTING")), Ok(job(status))]);
            let handle = BatchPoller::new(source.clone(), Duration::from_millis(2000)).spawn(42, None);
            let outcome = handle.outcome().await;
            if expect_failed {
                assert!(matches!(outcome, PollOutcome::Failed(_)));
            } else {
                assert!(matches!(outcome, PollOutcome::Stopped(_)));
            }
            assert_eq!(source.calls().len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_queries() {
        let source = Scripted::new(vec![]);
        let handle = BatchPoller::new(source.clone(), Duration::from_millis(2000)).spawn(42, None);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(source.calls().len(), 2);

        handle.cancel();
        let settled = handle.settled().await;
        assert!(!settled.polling);
        assert!(matches!(handle.outcome().await, PollOutcome::Cancelled));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_keeps_polling_to_completion() {
        let source = Scripted::new(vec![Ok(job("STARTED")), Ok(job("COMPLETED"))]);
        drop(BatchPoller::new(source.clone(), Duration::from_millis(2000)).spawn(42, None));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls().len(), 2);
    }

    struct Exploding;

    #[async_trait]
    impl JobStatusSource for Exploding {
        async fn job_status(&self, _job_id: i64) -> Result<BatchJob, ApiError> {
            panic!("status source blew up");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_task_is_not_reported_as_cancelled() {
        let handle = BatchPoller::new(Arc::new(Exploding), Duration::from_millis(2000)).spawn(42, None);
        let joined = tokio::spawn(handle.outcome()).await;
        let err = joined.expect_err("outcome should re-raise the panic");
        assert!(err.is_panic());
    }

    #[test]
    fn classify_distinguishes_outcomes() {
        assert!(matches!(classify(Ok(job("STARTED"))), PollStep::StillPolling(_)));
        assert!(matches!(classify(Ok(job("UNKNOWN"))), PollStep::StillPolling(_)));
        assert!(matches!(
            classify(Ok(job("COMPLETED"))),
            PollStep::Finished(PollOutcome::Completed(_))
        ));
        assert!(matches!(
            classify(Err(ApiError::Decode("x".into()))),
            PollStep::Finished(PollOutcome::TransportError(_))
        ));
    }
}
