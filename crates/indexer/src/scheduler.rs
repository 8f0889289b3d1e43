use crate::{IndexStats, IndexerError, Result, SnapshotIndexer};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant};

const STARTUP_REASON: &str = "startup";
const PERIODIC_REASON: &str = "interval";

/// When background rebuilds happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSchedule {
    /// Delay before the first rebuild after start.
    pub startup_delay: Duration,
    /// Gap between the end of one rebuild and the start of the next.
    pub interval: Duration,
}

impl Default for RebuildSchedule {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(1),
            interval: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexUpdate {
    pub generation: u64,
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub stats: IndexStats,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerHealth {
    pub rebuilding: bool,
    pub rebuilds: u64,
    pub last_generation: Option<u64>,
    pub last_success: Option<SystemTime>,
    pub last_duration_ms: Option<u64>,
    pub last_error: Option<String>,
}

enum SchedulerCommand {
    Trigger { reason: String },
    Shutdown,
}

/// Handle to the background rebuild loop.
///
/// The loop runs one rebuild at a time: the next one is scheduled only after
/// the previous one has published. Dropping the last handle stops the loop.
#[derive(Clone)]
pub struct RebuildScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    command_tx: mpsc::Sender<SchedulerCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_rx: watch::Receiver<SchedulerHealth>,
}

impl RebuildScheduler {
    /// Spawn the loop on the current tokio runtime.
    #[must_use]
    pub fn start(indexer: Arc<SnapshotIndexer>, schedule: RebuildSchedule) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (update_tx, _) = broadcast::channel(32);
        let (health_tx, health_rx) = watch::channel(SchedulerHealth::default());

        spawn_rebuild_loop(indexer, schedule, command_rx, update_tx.clone(), health_tx);

        Self {
            inner: Arc::new(SchedulerInner {
                command_tx,
                update_tx,
                health_rx,
            }),
        }
    }

    /// Run a rebuild as soon as the loop is idle, ignoring the timer.
    pub async fn trigger(&self, reason: impl Into<String>) -> Result<()> {
        self.inner
            .command_tx
            .send(SchedulerCommand::Trigger {
                reason: reason.into(),
            })
            .await
            .map_err(|e| IndexerError::Other(format!("failed to send trigger: {e}")))?;
        Ok(())
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<IndexUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn health_snapshot(&self) -> SchedulerHealth {
        self.inner.health_rx.borrow().clone()
    }
}

impl Drop for RebuildScheduler {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(SchedulerCommand::Shutdown);
        }
    }
}

fn spawn_rebuild_loop(
    indexer: Arc<SnapshotIndexer>,
    schedule: RebuildSchedule,
    mut command_rx: mpsc::Receiver<SchedulerCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<SchedulerHealth>,
) {
    tokio::spawn(async move {
        let mut health = SchedulerHealth::default();
        let mut deadline = Instant::now() + schedule.startup_delay;
        let mut reason = STARTUP_REASON.to_string();

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::Trigger { reason: forced }) => {
                            reason = forced;
                            deadline = Instant::now();
                        }
                        Some(SchedulerCommand::Shutdown) | None => break,
                    }
                }
                () = time::sleep_until(deadline) => {
                    health.rebuilding = true;
                    let _ = health_tx.send(health.clone());

                    let cycle_reason = std::mem::replace(&mut reason, PERIODIC_REASON.to_string());
                    run_rebuild_cycle(&indexer, cycle_reason, &mut health, &health_tx, &update_tx)
                        .await;
                    deadline = Instant::now() + schedule.interval;
                }
            }
        }

        info!("Rebuild scheduler for {} stopped", indexer.root().display());
    });
}

async fn run_rebuild_cycle(
    indexer: &Arc<SnapshotIndexer>,
    reason: String,
    health: &mut SchedulerHealth,
    health_tx: &watch::Sender<SchedulerHealth>,
    update_tx: &broadcast::Sender<IndexUpdate>,
) {
    let worker = indexer.clone();
    let outcome = tokio::task::spawn_blocking(move || worker.rebuild()).await;
    health.rebuilding = false;

    match outcome {
        Ok((snapshot, stats)) => {
            health.rebuilds += 1;
            health.last_generation = Some(snapshot.generation());
            health.last_success = Some(SystemTime::now());
            health.last_duration_ms = Some(stats.time_ms);
            health.last_error = None;
            let _ = health_tx.send(health.clone());
            let _ = update_tx.send(IndexUpdate {
                generation: snapshot.generation(),
                completed_at: SystemTime::now(),
                duration_ms: stats.time_ms,
                stats,
                reason,
            });
        }
        Err(err) => {
            error!("Rebuild task ({reason}) failed: {err}");
            health.last_error = Some(err.to_string());
            let _ = health_tx.send(health.clone());
        }
    }
}
