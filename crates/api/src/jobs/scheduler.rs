//! Job scheduler infrastructure for background tasks.
//!
//! Jobs that mutate shared state declare a lease; the scheduler acquires
//! it before each tick and skips the tick when another instance holds it,
//! so a horizontally scaled deployment runs each sweep once per interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use persistence::repositories::SchedulerLeaseRepository;

/// Job frequency for scheduling.
#[derive(Debug, Clone, Copy)]
pub enum JobFrequency {
    /// Run every N seconds (for testing).
    Seconds(u64),
    /// Run every N minutes.
    Minutes(u64),
    /// Run every hour.
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
}

/// Cluster-wide lease a job runs under.
#[derive(Debug, Clone, Copy)]
pub struct LeaseSettings {
    /// Lease row name, stable across instances and restarts.
    pub name: &'static str,
    /// Floor on how long the lease outlives acquisition even after release.
    pub lock_at_least: chrono::Duration,
    /// Cap on how long a crashed holder can keep the lease.
    pub lock_at_most: chrono::Duration,
}

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging).
    fn name(&self) -> &'static str;

    /// The frequency at which this job should run.
    fn frequency(&self) -> JobFrequency;

    /// The lease this job must hold while running, if any.
    fn lease(&self) -> Option<LeaseSettings> {
        None
    }

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Storage backing the scheduler leases.
#[async_trait::async_trait]
pub trait LeaseStore: Send + Sync {
    async fn try_acquire(
        &self,
        name: &str,
        lock_at_least_for: chrono::Duration,
        lock_at_most_for: chrono::Duration,
    ) -> Result<bool, String>;

    async fn release(&self, name: &str) -> Result<(), String>;
}

#[async_trait::async_trait]
impl LeaseStore for SchedulerLeaseRepository {
    async fn try_acquire(
        &self,
        name: &str,
        lock_at_least_for: chrono::Duration,
        lock_at_most_for: chrono::Duration,
    ) -> Result<bool, String> {
        SchedulerLeaseRepository::try_acquire(self, name, lock_at_least_for, lock_at_most_for)
            .await
            .map_err(|e| e.to_string())
    }

    async fn release(&self, name: &str) -> Result<(), String> {
        SchedulerLeaseRepository::release(self, name)
            .await
            .map_err(|e| e.to_string())
    }
}

/// One scheduled tick: acquire the lease if the job declares one, execute,
/// release. A held lease elsewhere skips the tick silently.
async fn run_job_tick(job: &Arc<dyn Job>, leases: &Arc<dyn LeaseStore>) {
    let name = job.name();

    if let Some(lease) = job.lease() {
        match leases
            .try_acquire(lease.name, lease.lock_at_least, lease.lock_at_most)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(job = name, lease = lease.name, "Lease held elsewhere, skipping tick");
                return;
            }
            Err(e) => {
                error!(job = name, lease = lease.name, error = %e, "Lease acquisition failed");
                return;
            }
        }
    }

    let start = std::time::Instant::now();
    info!(job = name, "Job starting");

    match job.execute().await {
        Ok(()) => {
            info!(
                job = name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Job completed successfully"
            );
        }
        Err(e) => {
            error!(
                job = name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Job failed"
            );
        }
    }

    if let Some(lease) = job.lease() {
        if let Err(e) = leases.release(lease.name).await {
            warn!(job = name, lease = lease.name, error = %e, "Lease release failed");
        }
    }
}

/// Background job scheduler.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    leases: Arc<dyn LeaseStore>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Create a new job scheduler over the given lease store.
    pub fn new(leases: Arc<dyn LeaseStore>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            leases,
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
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            let leases = Arc::clone(&self.leases);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let frequency = job.frequency();
                let mut interval = tokio::time::interval(frequency.duration());

                // Skip the first immediate tick
                interval.tick().await;

                info!(job = name, frequency = ?frequency, "Job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            run_job_tick(&job, &leases).await;
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Initiate graceful shutdown of all jobs.
    /// Returns immediately after signaling shutdown.
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestJob {
        run_count: Arc<AtomicUsize>,
        leased: bool,
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            "test_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(1)
        }

        fn lease(&self) -> Option<LeaseSettings> {
            self.leased.then_some(LeaseSettings {
                name: "test_job_lease",
                lock_at_least: chrono::Duration::seconds(30),
                lock_at_most: chrono::Duration::seconds(300),
            })
        }

        async fn execute(&self) -> Result<(), String> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeLeaseStore {
        grant: AtomicBool,
        acquires: AtomicUsize,
        releases: AtomicUsize,
    }

    impl FakeLeaseStore {
        fn granting(grant: bool) -> Arc<Self> {
            Arc::new(Self {
                grant: AtomicBool::new(grant),
                acquires: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl LeaseStore for FakeLeaseStore {
        async fn try_acquire(
            &self,
            _name: &str,
            _lock_at_least_for: chrono::Duration,
            _lock_at_most_for: chrono::Duration,
        ) -> Result<bool, String> {
            self.acquires.fetch_add(1, Ordering::SeqCst);
            Ok(self.grant.load(Ordering::SeqCst))
        }

        async fn release(&self, _name: &str) -> Result<(), String> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(
            JobFrequency::Seconds(30).duration(),
            Duration::from_secs(30)
        );
        assert_eq!(JobFrequency::Minutes(1).duration(), Duration::from_secs(60));
        assert_eq!(JobFrequency::Hourly.duration(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_tick_runs_leased_job_and_releases() {
        let store = FakeLeaseStore::granting(true);
        let run_count = Arc::new(AtomicUsize::new(0));
        let job: Arc<dyn Job> = Arc::new(TestJob {
            run_count: Arc::clone(&run_count),
            leased: true,
        });

        run_job_tick(&job, &(store.clone() as Arc<dyn LeaseStore>)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(store.acquires.load(Ordering::SeqCst), 1);
        assert_eq!(store.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tick_skips_when_lease_held_elsewhere() {
        let store = FakeLeaseStore::granting(false);
        let run_count = Arc::new(AtomicUsize::new(0));
        let job: Arc<dyn Job> = Arc::new(TestJob {
            run_count: Arc::clone(&run_count),
            leased: true,
        });

        run_job_tick(&job, &(store.clone() as Arc<dyn LeaseStore>)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 0);
        assert_eq!(store.releases.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_runs_unleased_job_without_store() {
        let store = FakeLeaseStore::granting(false);
        let run_count = Arc::new(AtomicUsize::new(0));
        let job: Arc<dyn Job> = Arc::new(TestJob {
            run_count: Arc::clone(&run_count),
            leased: false,
        });

        run_job_tick(&job, &(store.clone() as Arc<dyn LeaseStore>)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(store.acquires.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scheduler_register_and_shutdown() {
        let mut scheduler = JobScheduler::new(FakeLeaseStore::granting(true));
        let run_count = Arc::new(AtomicUsize::new(0));
        scheduler.register(TestJob {
            run_count: Arc::clone(&run_count),
            leased: false,
        });
        assert_eq!(scheduler.jobs.len(), 1);
        scheduler.start();

        // Give it a moment to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        // First tick is skipped, so the job never ran.
        assert_eq!(run_count.load(Ordering::SeqCst), 0);
    }
}
