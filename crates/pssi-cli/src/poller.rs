use async_trait::async_trait;
use pssi_host::HostStats;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::client::ApiClient;

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Where the poller reads statistics from.
#[async_trait]
pub trait StatsSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<HostStats, String>;
}

#[async_trait]
impl StatsSource for ApiClient {
    async fn fetch(&self) -> Result<HostStats, String> {
        self.get("/api/stats").await.map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Stats(HostStats),
    Failed(String),
}

/// What the screen shows. Every resolved request overwrites it, in the order
/// the requests resolve.
#[derive(Debug, Default)]
pub struct PollState {
    latest: Option<PollOutcome>,
    received: u64,
}

impl PollState {
    pub fn apply(&mut self, outcome: PollOutcome) {
        self.latest = Some(outcome);
        self.received += 1;
    }

    pub fn latest(&self) -> Option<&PollOutcome> {
        self.latest.as_ref()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.latest, Some(PollOutcome::Failed(_)))
    }

    pub fn render(&self) -> String {
        match &self.latest {
            None => "Waiting for first reading...".to_string(),
            Some(PollOutcome::Stats(stats)) => render_stats(stats),
            Some(PollOutcome::Failed(message)) => {
                format!("Error: {}\nPress Enter to retry.", message)
            }
        }
    }
}

pub fn render_stats(stats: &HostStats) -> String {
    let mut lines = vec![
        format!(
            "CPU     {} ({} cores @ {:.2} GHz)  {:.1}%",
            stats.cpu.brand, stats.cpu.cores, stats.cpu.speed, stats.cpu.usage
        ),
        format!(
            "Memory  {:.1} / {:.1} GB ({}%)",
            stats.memory.used as f64 / GB,
            stats.memory.total as f64 / GB,
            stats.memory.percentage
        ),
        format!(
            "OS      {} {} ({})",
            stats.os.distro, stats.os.release, stats.os.arch
        ),
    ];

    for disk in &stats.disk {
        lines.push(format!(
            "Disk    {} {:.1}% of {:.1} GB",
            disk.mount,
            disk.percentage,
            disk.size as f64 / GB
        ));
    }

    lines.push(format!("Updated {}", stats.timestamp.to_rfc3339()));
    lines.join("\n")
}

/// Fixed-interval statistics poller.
///
/// Each tick starts a new request without waiting for earlier ones; overlapping
/// requests are not deduplicated.
pub struct StatsPoller<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: StatsSource> StatsPoller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source: Arc::new(source),
            interval,
        }
    }

    /// Start one request; its outcome is sent to `results` when it resolves.
    pub fn spawn_fetch(&self, results: mpsc::UnboundedSender<PollOutcome>) {
        let source = self.source.clone();
        tokio::spawn(async move {
            let outcome = match source.fetch().await {
                Ok(stats) => PollOutcome::Stats(stats),
                Err(e) => {
                    tracing::debug!("Stats poll failed: {}", e);
                    PollOutcome::Failed(e)
                }
            };
            let _ = results.send(outcome);
        });
    }

    /// Poll until `shutdown` resolves. A message on `retry` issues an extra
    /// request when the last one failed. `render` runs after every response.
    pub async fn run<F, R>(
        &self,
        mut retry: mpsc::UnboundedReceiver<()>,
        shutdown: F,
        mut render: R,
    ) -> PollState
    where
        F: Future<Output = ()>,
        R: FnMut(&PollState),
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = PollState::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.spawn_fetch(tx.clone()),
                Some(()) = retry.recv() => {
                    if state.is_failed() {
                        self.spawn_fetch(tx.clone());
                    }
                }
                Some(outcome) = rx.recv() => {
                    state.apply(outcome);
                    render(&state);
                }
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pssi_host::{CpuStats, DiskStats, MemoryStats, OsStats};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample(usage: f32) -> HostStats {
        HostStats {
            timestamp: chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            cpu: CpuStats {
                manufacturer: "GenuineIntel".to_string(),
                brand: "Intel Core i7".to_string(),
                cores: 8,
                speed: 3.2,
                usage,
            },
            memory: MemoryStats {
                total: 16 * 1024 * 1024 * 1024,
                free: 8 * 1024 * 1024 * 1024,
                used: 8 * 1024 * 1024 * 1024,
                percentage: "50.00".to_string(),
            },
            os: OsStats {
                platform: "linux".to_string(),
                distro: "Ubuntu".to_string(),
                release: "22.04".to_string(),
                arch: "x86_64".to_string(),
            },
            disk: vec![DiskStats {
                fs: "/dev/sda1".to_string(),
                fs_type: "ext4".to_string(),
                mount: "/".to_string(),
                size: 100 * 1024 * 1024 * 1024,
                used: 25 * 1024 * 1024 * 1024,
                available: 75 * 1024 * 1024 * 1024,
                percentage: 25.0,
            }],
            network: Vec::new(),
        }
    }

    /// First request is slow, later ones answer immediately.
    struct SlowThenFast {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatsSource for SlowThenFast {
        async fn fetch(&self) -> Result<HostStats, String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(sample(10.0))
            } else {
                Ok(sample(90.0))
            }
        }
    }

    struct Failing;

    #[async_trait]
    impl StatsSource for Failing {
        async fn fetch(&self) -> Result<HostStats, String> {
            Err("Request failed: connection refused".to_string())
        }
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StatsSource for Counting {
        async fn fetch(&self) -> Result<HostStats, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(sample(1.0))
        }
    }

    #[tokio::test]
    async fn test_last_resolved_response_wins() {
        let poller = StatsPoller::new(
            SlowThenFast {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(5),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        poller.spawn_fetch(tx.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.spawn_fetch(tx);

        let mut state = PollState::default();
        while let Some(outcome) = rx.recv().await {
            state.apply(outcome);
        }

        assert_eq!(state.received(), 2);
        // The older request resolved last, so its reading is shown.
        match state.latest() {
            Some(PollOutcome::Stats(stats)) => assert_eq!(stats.cpu.usage, 10.0),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failure_is_rendered_verbatim() {
        let mut state = PollState::default();
        state.apply(PollOutcome::Failed("Bad Gateway (HTTP 502)".to_string()));

        assert!(state.is_failed());
        assert_eq!(
            state.render(),
            "Error: Bad Gateway (HTTP 502)\nPress Enter to retry."
        );
    }

    #[test]
    fn test_render_stats() {
        let rendered = render_stats(&sample(42.5));

        assert!(rendered.contains("Intel Core i7 (8 cores @ 3.20 GHz)  42.5%"));
        assert!(rendered.contains("Memory  8.0 / 16.0 GB (50.00%)"));
        assert!(rendered.contains("Disk    / 25.0% of 100.0 GB"));
        assert!(rendered.ends_with("Updated 2024-05-01T12:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_run_polls_on_each_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poller = StatsPoller::new(
            Counting {
                calls: calls.clone(),
            },
            Duration::from_millis(20),
        );
        let (_retry_tx, retry_rx) = mpsc::unbounded_channel();

        let mut renders = 0;
        let state = poller
            .run(
                retry_rx,
                tokio::time::sleep(Duration::from_millis(150)),
                |_| renders += 1,
            )
            .await;

        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(state.received() >= 2);
        assert_eq!(renders as u64, state.received());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let poller = StatsPoller::new(Failing, Duration::from_secs(60));
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();

        let state = poller
            .run(
                retry_rx,
                tokio::time::sleep(Duration::from_millis(100)),
                |state| {
                    if state.received() == 1 {
                        let _ = retry_tx.send(());
                    }
                },
            )
            .await;

        // One request from the first tick, one from the manual retry.
        assert_eq!(state.received(), 2);
        assert!(state.render().contains("connection refused"));
    }
}
