//! Job scheduler infrastructure for background tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::middleware::metrics::record_job_duration;

/// Job frequency for scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
    Hourly,
}

impl JobFrequency {
    /// Get the duration between job executions.
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
        }
    }

    /// Frequency for an interval given in seconds.
    pub fn from_secs(secs: u64) -> Self {
        match secs {
            3600 => JobFrequency::Hourly,
            s if s % 60 == 0 => JobFrequency::Minutes(s / 60),
            s => JobFrequency::Seconds(s),
        }
    }
}

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging and metrics).
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Background job scheduler.
///
/// Each job waits for the startup delay, runs once, then runs on every tick
/// of its frequency. Shutdown stops the loops between runs; a run that is in
/// progress always completes.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    startup_delay: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new(startup_delay: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            startup_delay,
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Start all registered jobs.
    pub fn start(&mut self) {
        info!(
            jobs = self.jobs.len(),
            startup_delay_secs = self.startup_delay.as_secs(),
            "Starting job scheduler"
        );

        for job in &self.jobs {
            let job = Arc::clone(job);
            let shutdown_rx = self.shutdown_rx.clone();
            let startup_delay = self.startup_delay;

            self.handles
                .push(tokio::spawn(run_job(job, startup_delay, shutdown_rx)));
        }
    }

    /// Signals all job loops to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all jobs to complete with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

async fn run_job(job: Arc<dyn Job>, startup_delay: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let name = job.name();
    let frequency = job.frequency();
    info!(job = name, frequency = ?frequency, "Job scheduled");

    tokio::select! {
        _ = tokio::time::sleep(startup_delay) => {}
        _ = wait_for_signal(&mut shutdown_rx) => {
            info!(job = name, "Job shutting down before first run");
            return;
        }
    }

    execute_once(job.as_ref()).await;

    let mut interval = tokio::time::interval(frequency.duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first immediate tick
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => execute_once(job.as_ref()).await,
            _ = wait_for_signal(&mut shutdown_rx) => {
                info!(job = name, "Job shutting down");
                break;
            }
        }
    }
}

/// Resolves once shutdown is signalled or the scheduler is dropped.
async fn wait_for_signal(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}

async fn execute_once(job: &dyn Job) {
    let name = job.name();
    let start = Instant::now();
    info!(job = name, "Job starting");

    let result = job.execute().await;
    let elapsed = start.elapsed();
    record_job_duration(name, result.is_ok(), elapsed.as_secs_f64());

    match result {
        Ok(()) => info!(
            job = name,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job completed successfully"
        ),
        Err(e) => error!(
            job = name,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %e,
            "Job failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestJob {
        run_count: Arc<AtomicUsize>,
        should_fail: bool,
        run_for: Duration,
    }

    impl TestJob {
        fn new(run_count: &Arc<AtomicUsize>) -> Self {
            Self {
                run_count: Arc::clone(run_count),
                should_fail: false,
                run_for: Duration::ZERO,
            }
        }
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            "test_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(10)
        }

        async fn execute(&self) -> Result<(), String> {
            tokio::time::sleep(self.run_for).await;
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err("Test failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Minutes(5).duration(), Duration::from_secs(300));
        assert_eq!(JobFrequency::Hourly.duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_job_frequency_from_secs() {
        assert_eq!(JobFrequency::from_secs(3600), JobFrequency::Hourly);
        assert_eq!(JobFrequency::from_secs(300), JobFrequency::Minutes(5));
        assert_eq!(JobFrequency::from_secs(45), JobFrequency::Seconds(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_startup_delay_then_on_interval() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new(Duration::from_secs(5));
        scheduler.register(TestJob::new(&run_count));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 2);

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_run() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new(Duration::from_secs(5));
        scheduler.register(TestJob::new(&run_count));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_job_completes_on_shutdown() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new(Duration::ZERO);
        let mut job = TestJob::new(&run_count);
        job.run_for = Duration::from_secs(3);
        scheduler.register(job);
        scheduler.start();

        // Mid-run
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_keeps_running() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new(Duration::ZERO);
        let mut job = TestJob::new(&run_count);
        job.should_fail = true;
        scheduler.register(job);
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 3);

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;
    }
}
