//! Probe scheduling loop
//!
//! A [`Scheduler`] drives one probe against one target on a fixed interval.
//! The first result is a warm-up: it is printed but neither counted nor added
//! to the statistics. The loop ends when a [`StopHandle`] fires or when the
//! target's counter of counted probes is reached, and then prints the
//! summary.
//!
//! States only move forward: `Idle -> Running -> Stopping -> Stopped`.

use crate::defaults::DEFAULT_INTERVAL;
use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::Target;
use crate::output::ResultFormatter;
use crate::probe::Probe;
use crate::stats::{StatsAggregator, Summary};
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Delay before the first probe
const FIRST_TICK: Duration = Duration::from_millis(1);

/// Lifecycle of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for SchedulerState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
struct Control {
    state: AtomicU8,
    stop: CancellationToken,
}

impl Control {
    fn state(&self) -> SchedulerState {
        self.state.load(Ordering::SeqCst).into()
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Requests a scheduler to stop. Cheap to clone and safe to call from any
/// task any number of times.
#[derive(Debug, Clone)]
pub struct StopHandle {
    control: Arc<Control>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.control.stop.cancel();
    }

    pub fn state(&self) -> SchedulerState {
        self.control.state()
    }
}

/// Runs one probe periodically and aggregates the results
pub struct Scheduler<W: Write> {
    target: Target,
    probe: Box<dyn Probe>,
    formatter: ResultFormatter<W>,
    control: Arc<Control>,
    logger: Logger,
}

impl<W: Write> Scheduler<W> {
    pub fn new(target: Target, probe: Box<dyn Probe>, formatter: ResultFormatter<W>) -> Self {
        let mut logger = Logger::new("scheduler");
        logger.set_level(crate::logging::LogLevel::Warn);
        Self {
            target,
            probe,
            formatter,
            control: Arc::new(Control {
                state: AtomicU8::new(SchedulerState::Idle as u8),
                stop: CancellationToken::new(),
            }),
            logger,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.control.state()
    }

    pub fn formatter(&self) -> &ResultFormatter<W> {
        &self.formatter
    }

    /// Time between two ticks; a zero interval falls back to the default
    pub fn interval(&self) -> Duration {
        if self.target.interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            self.target.interval
        }
    }

    /// Run until stopped or until the counter is reached, then print and
    /// return the summary. A scheduler runs at most once.
    pub async fn run(&mut self) -> Result<Summary> {
        if !self.control.transition(SchedulerState::Idle, SchedulerState::Running) {
            return Err(AppError::internal(format!(
                "scheduler cannot start from state {:?}",
                self.state()
            )));
        }

        // cancelling the stop token also cancels the in-flight probe
        let probe_ctx = self.control.stop.child_token();
        let interval = self.interval();
        let mut stats = StatsAggregator::new();
        let mut warmed_up = false;
        let mut output_error = None;

        self.logger
            .info("Starting probes")
            .field("target", self.target.to_string())
            .field("counter", self.target.counter)
            .field("interval_ms", interval.as_millis() as u64)
            .field("timeout_ms", self.target.timeout.as_millis() as u64)
            .log()
            .await;

        let timer = sleep(FIRST_TICK);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = self.control.stop.cancelled() => {
                    self.logger.debug("Stop requested").log().await;
                    break;
                }
                _ = &mut timer => {
                    let result = self.probe.probe(&probe_ctx).await;
                    timer.as_mut().reset(Instant::now() + interval);

                    if result.is_cancelled() && probe_ctx.is_cancelled() {
                        self.logger.debug("Dropping probe aborted by shutdown").log().await;
                        continue;
                    }

                    if let Err(err) = self.formatter.print_result(&result) {
                        output_error = Some(err);
                        break;
                    }

                    if !warmed_up {
                        warmed_up = true;
                        self.logger.debug("Warm-up probe excluded from statistics").probe(&result).log().await;
                        continue;
                    }

                    stats.observe(&result);
                    self.logger.trace("Sample recorded").probe(&result).field("total", stats.total()).log().await;

                    if self.target.is_bounded() && stats.total() as i64 >= self.target.counter {
                        self.logger
                            .info("Probe counter reached")
                            .field("counter", self.target.counter)
                            .log()
                            .await;
                        break;
                    }
                }
            }
        }

        self.control.transition(SchedulerState::Running, SchedulerState::Stopping);
        probe_ctx.cancel();
        self.control.transition(SchedulerState::Stopping, SchedulerState::Stopped);

        if let Some(err) = output_error {
            return Err(err);
        }

        let summary = stats.summarize();
        self.logger
            .info("Probing finished")
            .field("summary", summary)
            .log()
            .await;
        self.formatter.print_summary(&summary)?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::models::{ProbeResult, Protocol};
    use crate::probe::testing::{FailingProbe, SleepProbe};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::OnceLock;
    use tokio_test::{assert_err, assert_ok};

    fn target(counter: i64, interval: Duration) -> Target {
        Target::new(Protocol::Tcp, "127.0.0.1", 80)
            .with_counter(counter)
            .with_interval(interval)
    }

    fn scheduler(counter: i64, interval: Duration, probe: impl Probe + 'static) -> Scheduler<Vec<u8>> {
        let formatter = ResultFormatter::new(Vec::new(), "tcp://127.0.0.1:80", false);
        Scheduler::new(target(counter, interval), Box::new(probe), formatter)
    }

    fn output(scheduler: &Scheduler<Vec<u8>>) -> String {
        String::from_utf8(scheduler.formatter().get_ref().clone()).unwrap()
    }

    fn probe_lines(output: &str) -> usize {
        output.lines().filter(|line| line.contains(": Ping ")).count()
    }

    /// Succeeds immediately and requests a stop on its `stop_after`-th call
    struct StoppingProbe {
        stop_after: usize,
        calls: AtomicUsize,
        handle: Arc<OnceLock<StopHandle>>,
    }

    #[async_trait]
    impl Probe for StoppingProbe {
        async fn probe(&self, _ctx: &CancellationToken) -> ProbeResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.stop_after {
                if let Some(handle) = self.handle.get() {
                    handle.stop();
                }
            }
            ProbeResult::success(Duration::from_millis(1)).with_address("127.0.0.1:80")
        }
    }

    #[tokio::test]
    async fn test_counter_limits_counted_probes() {
        let probe = SleepProbe::new(Duration::from_millis(10));
        let calls = Arc::clone(&probe.calls);
        let mut scheduler = scheduler(3, Duration::from_millis(10), probe);

        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.failures, 0);
        // one warm-up plus three counted probes
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(summary.min >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_n_ticks_yield_n_minus_one_samples() {
        let handle = Arc::new(OnceLock::new());
        let probe = StoppingProbe {
            stop_after: 6,
            calls: AtomicUsize::new(0),
            handle: Arc::clone(&handle),
        };
        let mut scheduler = scheduler(0, Duration::from_millis(5), probe);
        handle.set(scheduler.stop_handle()).unwrap();

        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.successes + summary.failures, summary.total);
        assert_eq!(probe_lines(&output(&scheduler)), 6);
    }

    #[tokio::test]
    async fn test_warm_up_is_displayed_but_not_counted() {
        let mut scheduler = scheduler(1, Duration::from_millis(5), SleepProbe::new(Duration::from_millis(1)));

        let summary = assert_ok!(scheduler.run().await);
        let out = output(&scheduler);

        assert_eq!(summary.total, 1);
        assert_eq!(probe_lines(&out), 2);
        assert!(out.contains("Ping statistics tcp://127.0.0.1:80"));
        assert!(out.contains("\t1 probes sent."));
    }

    #[tokio::test]
    async fn test_concurrent_stop_is_idempotent() {
        let mut scheduler = scheduler(0, Duration::from_millis(5), SleepProbe::new(Duration::from_millis(2)));
        let handle = scheduler.stop_handle();

        let runner = tokio::spawn(async move {
            let summary = scheduler.run().await;
            (summary, scheduler)
        });

        sleep(Duration::from_millis(40)).await;
        let stops = (0..16).map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.stop() })
        });
        for joined in futures::future::join_all(stops).await {
            joined.unwrap();
        }

        let (summary, scheduler) = runner.await.unwrap();
        let summary = assert_ok!(summary);

        assert_eq!(handle.state(), SchedulerState::Stopped);
        assert_eq!(summary.successes + summary.failures, summary.total);
        assert_eq!(output(&scheduler).matches("Ping statistics").count(), 1);

        // stopping a stopped scheduler is a no-op
        handle.stop();
        assert_eq!(handle.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_in_flight_probe_cancelled_by_stop_is_not_counted() {
        let mut scheduler = scheduler(0, Duration::from_millis(10), SleepProbe::new(Duration::from_millis(200)));
        let handle = scheduler.stop_handle();

        tokio::spawn(async move {
            // warm-up ends near 200ms, the second probe is in flight at 300ms
            sleep(Duration::from_millis(300)).await;
            handle.stop();
        });

        let summary = assert_ok!(scheduler.run().await);
        let out = output(&scheduler);

        assert_eq!(summary.total, 0);
        assert_eq!(summary.failures, 0);
        assert_eq!(probe_lines(&out), 1);
        assert!(!out.contains("Failed"));
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let mut scheduler = scheduler(2, Duration::from_millis(5), FailingProbe { delay: Duration::from_millis(1) });

        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.failures, 2);
        assert_eq!(summary.successes, 0);
        assert_eq!(output(&scheduler).matches("Failed(connection refused)").count(), 3);
    }

    #[tokio::test]
    async fn test_stop_before_run_prints_empty_summary() {
        let probe = SleepProbe::new(Duration::from_millis(1));
        let calls = Arc::clone(&probe.calls);
        let mut scheduler = scheduler(0, Duration::from_millis(5), probe);
        scheduler.stop_handle().stop();

        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary, Summary::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(output(&scheduler).contains("\t0 probes sent."));
    }

    #[tokio::test]
    async fn test_scheduler_cannot_run_twice() {
        let mut scheduler = scheduler(1, Duration::from_millis(5), SleepProbe::new(Duration::from_millis(1)));
        assert_ok!(scheduler.run().await);

        let err = assert_err!(scheduler.run().await);
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_zero_interval_uses_default() {
        let mut scheduler = scheduler(1, Duration::ZERO, SleepProbe::new(Duration::from_millis(1)));
        assert_eq!(scheduler.interval(), DEFAULT_INTERVAL);

        let started = Instant::now();
        assert_ok!(scheduler.run().await);
        assert!(started.elapsed() >= DEFAULT_INTERVAL);
    }

    #[tokio::test]
    async fn test_timeout_failures_are_recorded_not_dropped() {
        struct TimeoutProbe;

        #[async_trait]
        impl Probe for TimeoutProbe {
            async fn probe(&self, _ctx: &CancellationToken) -> ProbeResult {
                ProbeResult::failure(ProbeError::Timeout(Duration::from_millis(5)), Duration::from_millis(5))
            }
        }

        let mut scheduler = scheduler(2, Duration::from_millis(5), TimeoutProbe);
        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary.failures, 2);
        assert!(output(&scheduler).contains("Failed(timeout)"));
    }

    #[tokio::test]
    async fn test_cancelled_result_outside_shutdown_is_a_failure() {
        struct AlwaysAborted;

        #[async_trait]
        impl Probe for AlwaysAborted {
            async fn probe(&self, _ctx: &CancellationToken) -> ProbeResult {
                ProbeResult::failure(ProbeError::Cancelled, Duration::from_millis(1))
            }
        }

        let mut scheduler = scheduler(2, Duration::from_millis(5), AlwaysAborted);
        let summary = assert_ok!(scheduler.run().await);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.failures, 2);
        assert_eq!(probe_lines(&output(&scheduler)), 3);
    }

    #[test]
    fn test_state_from_u8() {
        assert_eq!(SchedulerState::from(0), SchedulerState::Idle);
        assert_eq!(SchedulerState::from(1), SchedulerState::Running);
        assert_eq!(SchedulerState::from(2), SchedulerState::Stopping);
        assert_eq!(SchedulerState::from(3), SchedulerState::Stopped);
    }
}
