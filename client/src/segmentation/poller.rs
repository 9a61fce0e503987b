//! Segmentation job polling state machine

use metrics::{counter, gauge};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SegmentationConfig;

use super::client::SegmentationApi;
use super::types::{JobError, JobEvent, JobIndicator, JobStatus, StartOutcome};

/// Cancellable periodic timer driving status polls.
///
/// Dropping the timer cancels it. The first tick fires one full period after
/// the timer starts.
#[derive(Debug)]
pub struct PollTimer {
    interval: Interval,
}

/// Shortest poll period; a zero interval is never scheduled
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl PollTimer {
    pub fn start(period: Duration) -> Self {
        let period = period.max(MIN_POLL_INTERVAL);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next tick (cancel safe)
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Starts a server-side segmentation job and polls it until it finishes.
///
/// The poller owns the job status and the only poll timer. At most one timer
/// exists at a time; it is dropped exactly once when the job ends.
pub struct SegmentationJobPoller<A, U> {
    api: A,
    indicator: U,
    config: SegmentationConfig,
    status: JobStatus,
    timer: Option<PollTimer>,
    attempts: u32,
    consecutive_failures: u32,
}

impl<A: SegmentationApi, U: JobIndicator> SegmentationJobPoller<A, U> {
    pub fn new(api: A, indicator: U, config: SegmentationConfig) -> Self {
        Self {
            api,
            indicator,
            config,
            status: JobStatus::Idle,
            timer: None,
            attempts: 0,
            consecutive_failures: 0,
        }
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn indicator(&self) -> &U {
        &self.indicator
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Whether a poll timer is currently scheduled
    pub fn has_active_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Number of status polls issued for the current job
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Begin a job.
    ///
    /// Only accepted while idle or after a failed job; any other call is ignored
    /// without contacting the server. On a failed start the trigger is enabled
    /// again and the poller returns to idle.
    pub async fn start(&mut self) -> Result<StartOutcome, JobError> {
        if !self.status.accepts_start() {
            debug!(
                "Segmentation start ignored in state {:?}",
                self.status
            );
            return Ok(StartOutcome::Ignored);
        }

        self.status = JobStatus::Starting;
        self.attempts = 0;
        self.consecutive_failures = 0;
        self.indicator.set_trigger_enabled(false);
        self.indicator.set_status_text("Starting segmentation");
        counter!("slideview_segmentation_jobs_started_total").increment(1);

        if let Err(e) = self.api.start_job().await {
            error!("Failed to start segmentation job: {}", e);
            self.status = JobStatus::Idle;
            self.indicator.set_trigger_enabled(true);
            self.indicator
                .set_status_text(&format!("Segmentation failed to start: {}", e));
            return Err(JobError::JobStartFailed(e.to_string()));
        }

        if self.cancel_timer() {
            warn!("Replaced a poll timer left over from a previous job");
        }
        self.timer = Some(PollTimer::start(self.config.poll_interval));
        self.status = JobStatus::Polling { progress: 0 };
        self.show_progress(0);
        info!(
            "Segmentation job started, polling every {:?}",
            self.config.poll_interval
        );

        Ok(StartOutcome::Started)
    }

    /// Wait for the next scheduled poll.
    ///
    /// Never completes while no timer is active. Cancel safe, so it can sit in
    /// a `tokio::select!` next to other event sources.
    pub async fn wait_tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => timer.tick().await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Issue one status poll and apply the response.
    ///
    /// Returns `None` when no job is being polled.
    pub async fn poll_once(&mut self) -> Option<JobEvent> {
        if !matches!(self.status, JobStatus::Polling { .. }) {
            return None;
        }

        self.attempts += 1;
        counter!("slideview_segmentation_polls_total").increment(1);

        let event = match self.api.check_status().await {
            Ok(payload) => {
                self.consecutive_failures = 0;
                let progress = payload.percent();
                self.show_progress(progress);
                self.indicator.set_status_text(&payload.status);

                if payload.is_done() {
                    self.cancel_timer();
                    self.status = JobStatus::Done;
                    info!("Segmentation job done after {} polls", self.attempts);
                    return Some(JobEvent::Completed);
                }

                debug!("Segmentation {}: {}%", payload.status, progress);
                self.status = JobStatus::Polling { progress };
                JobEvent::Progress {
                    progress,
                    status: payload.status,
                }
            }
            Err(e) => {
                self.consecutive_failures += 1;
                counter!("slideview_segmentation_poll_failures_total").increment(1);
                let err = JobError::PollFailed(e.to_string());
                warn!(
                    "{} ({} consecutive), retrying next tick",
                    err, self.consecutive_failures
                );

                if let Some(max) = self.config.max_consecutive_failures
                    && self.consecutive_failures >= max
                {
                    return Some(self.fail(format!(
                        "status unavailable after {} failed polls",
                        self.consecutive_failures
                    )));
                }
                JobEvent::PollFailed {
                    consecutive_failures: self.consecutive_failures,
                }
            }
        };

        if let Some(max) = self.config.max_poll_attempts
            && self.attempts >= max
        {
            return Some(self.fail(format!("job not done after {} polls", self.attempts)));
        }

        Some(event)
    }

    /// Wait for the next tick, then poll
    pub async fn tick(&mut self) -> Option<JobEvent> {
        if self.timer.is_none() {
            return None;
        }
        self.wait_tick().await;
        self.poll_once().await
    }

    /// Poll until the job completes or fails
    pub async fn run_to_completion(&mut self) -> JobStatus {
        while let Some(event) = self.tick().await {
            if event.is_terminal() {
                break;
            }
        }
        self.status.clone()
    }

    fn fail(&mut self, message: String) -> JobEvent {
        error!("Segmentation job failed: {}", message);
        self.cancel_timer();
        self.status = JobStatus::Failed {
            message: Some(message.clone()),
        };
        self.indicator
            .set_status_text(&format!("Segmentation failed: {}", message));
        self.indicator.set_trigger_enabled(true);
        JobEvent::Failed { message }
    }

    fn show_progress(&mut self, progress: u8) {
        gauge!("slideview_segmentation_progress").set(progress as f64);
        self.indicator.set_progress_text(&format!("{}%", progress));
        self.indicator.set_progress_bar(progress);
    }

    /// Drop the poll timer, returning whether one was active
    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                debug!("Poll timer cancelled (period {:?})", timer.period());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::types::{ApiError, StatusPayload};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedApi {
        start_fails: bool,
        starts: AtomicUsize,
        polls: AtomicUsize,
        /// `None` entries simulate a failed request
        responses: Mutex<VecDeque<Option<StatusPayload>>>,
    }

    impl ScriptedApi {
        fn with_responses(responses: Vec<Option<StatusPayload>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SegmentationApi for ScriptedApi {
        async fn start_job(&self) -> Result<(), ApiError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.start_fails {
                return Err(ApiError::Status(500));
            }
            Ok(())
        }

        async fn check_status(&self) -> Result<StatusPayload, ApiError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Some(payload)) => Ok(payload),
                Some(None) => Err(ApiError::Status(503)),
                None => Ok(StatusPayload::new("Running", 0.0)),
            }
        }
    }

    #[derive(Debug, Default)]
    struct Indicator {
        trigger_enabled: bool,
        status: String,
        progress_text: String,
        bar: u8,
    }

    impl JobIndicator for Indicator {
        fn set_trigger_enabled(&mut self, enabled: bool) {
            self.trigger_enabled = enabled;
        }
        fn set_status_text(&mut self, text: &str) {
            self.status = text.to_string();
        }
        fn set_progress_text(&mut self, text: &str) {
            self.progress_text = text.to_string();
        }
        fn set_progress_bar(&mut self, percent: u8) {
            self.bar = percent;
        }
    }

    fn poller(api: ScriptedApi) -> SegmentationJobPoller<ScriptedApi, Indicator> {
        poller_with(api, SegmentationConfig::default())
    }

    fn poller_with(
        api: ScriptedApi,
        config: SegmentationConfig,
    ) -> SegmentationJobPoller<ScriptedApi, Indicator> {
        let indicator = Indicator {
            trigger_enabled: true,
            ..Default::default()
        };
        SegmentationJobPoller::new(api, indicator, config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_begins_polling() {
        let mut p = poller(ScriptedApi::default());
        assert_eq!(p.start().await.unwrap(), StartOutcome::Started);

        assert_eq!(p.status(), &JobStatus::Polling { progress: 0 });
        assert!(p.has_active_timer());
        assert!(!p.indicator().trigger_enabled);
        assert_eq!(p.indicator().progress_text, "0%");
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_sends_one_request() {
        let mut p = poller(ScriptedApi::default());
        assert_eq!(p.start().await.unwrap(), StartOutcome::Started);
        assert_eq!(p.start().await.unwrap(), StartOutcome::Ignored);

        assert_eq!(p.api().starts.load(Ordering::SeqCst), 1);
        assert!(p.has_active_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_waits_one_period() {
        let mut p = poller(ScriptedApi::default());
        p.start().await.unwrap();

        let before = Instant::now();
        p.tick().await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_then_done() {
        let api = ScriptedApi::with_responses(vec![
            Some(StatusPayload::new("Running", 40.0)),
            Some(StatusPayload::new("Done", 100.0)),
        ]);
        let mut p = poller(api);
        p.start().await.unwrap();

        let event = p.tick().await.unwrap();
        assert_eq!(
            event,
            JobEvent::Progress {
                progress: 40,
                status: "Running".to_string()
            }
        );
        assert_eq!(p.indicator().progress_text, "40%");
        assert_eq!(p.indicator().bar, 40);
        assert_eq!(p.indicator().status, "Running");

        assert_eq!(p.tick().await, Some(JobEvent::Completed));
        assert_eq!(p.status(), &JobStatus::Done);
        assert!(!p.has_active_timer());
        assert_eq!(p.indicator().bar, 100);

        // No timer left, nothing more to poll
        assert_eq!(p.tick().await, None);
        assert_eq!(p.api().polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_done_is_ignored() {
        let api = ScriptedApi::with_responses(vec![Some(StatusPayload::new("Done", 100.0))]);
        let mut p = poller(api);
        p.start().await.unwrap();
        assert_eq!(p.run_to_completion().await, JobStatus::Done);

        assert_eq!(p.start().await.unwrap(), StartOutcome::Ignored);
        assert_eq!(p.api().starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_state_and_retries() {
        let api = ScriptedApi::with_responses(vec![
            Some(StatusPayload::new("Running", 10.0)),
            None,
            None,
            Some(StatusPayload::new("Running", 30.0)),
        ]);
        let mut p = poller(api);
        p.start().await.unwrap();

        p.tick().await.unwrap();
        assert_eq!(
            p.tick().await,
            Some(JobEvent::PollFailed {
                consecutive_failures: 1
            })
        );
        assert_eq!(p.status(), &JobStatus::Polling { progress: 10 });
        assert_eq!(
            p.tick().await,
            Some(JobEvent::PollFailed {
                consecutive_failures: 2
            })
        );
        assert!(p.has_active_timer());

        p.tick().await.unwrap();
        assert_eq!(p.status(), &JobStatus::Polling { progress: 30 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_failure_limit() {
        let api = ScriptedApi::with_responses(vec![None, None, None]);
        let config = SegmentationConfig {
            max_consecutive_failures: Some(3),
            ..Default::default()
        };
        let mut p = poller_with(api, config);
        p.start().await.unwrap();

        let status = p.run_to_completion().await;
        assert!(matches!(status, JobStatus::Failed { message: Some(_) }));
        assert!(!p.has_active_timer());
        assert!(p.indicator().trigger_enabled);
        assert_eq!(p.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_attempt_limit() {
        let config = SegmentationConfig {
            max_poll_attempts: Some(5),
            ..Default::default()
        };
        let mut p = poller_with(ScriptedApi::default(), config);
        p.start().await.unwrap();

        let status = p.run_to_completion().await;
        assert!(matches!(status, JobStatus::Failed { .. }));
        assert_eq!(p.api().polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_failure() {
        let api = ScriptedApi::with_responses(vec![None]);
        let config = SegmentationConfig {
            max_consecutive_failures: Some(1),
            ..Default::default()
        };
        let mut p = poller_with(api, config);
        p.start().await.unwrap();
        p.run_to_completion().await;

        assert_eq!(p.start().await.unwrap(), StartOutcome::Started);
        assert_eq!(p.status(), &JobStatus::Polling { progress: 0 });
        assert_eq!(p.attempts(), 0);
        assert_eq!(p.api().starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_reenables_trigger() {
        let api = ScriptedApi {
            start_fails: true,
            ..Default::default()
        };
        let mut p = poller(api);

        let err = p.start().await.unwrap_err();
        assert!(matches!(err, JobError::JobStartFailed(_)));
        assert_eq!(p.status(), &JobStatus::Idle);
        assert!(!p.has_active_timer());
        assert!(p.indicator().trigger_enabled);
        assert!(p.indicator().status.contains("failed to start"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_is_clamped() {
        let api = ScriptedApi::with_responses(vec![Some(StatusPayload::new("Done", 100.0))]);
        let config = SegmentationConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let mut p = poller_with(api, config);
        p.start().await.unwrap();

        assert_eq!(p.run_to_completion().await, JobStatus::Done);
        assert_eq!(
            PollTimer::start(Duration::ZERO).period(),
            MIN_POLL_INTERVAL
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_when_idle() {
        let mut p = poller(ScriptedApi::default());
        assert_eq!(p.poll_once().await, None);
        assert_eq!(p.tick().await, None);
        assert_eq!(p.api().polls.load(Ordering::SeqCst), 0);
    }
}
