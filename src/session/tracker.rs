use super::config::SessionConfig;
use super::state::Session;
use super::stats::{HikeSummary, SessionStats};
use crate::error::HikeError;
use crate::location::{LocationSource, Position, SubscriptionId};
use chrono::Utc;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// The two producers that only exist while tracking
///
/// Dropping this aborts both tasks and, if the subscription was not
/// released by `stop`, unsubscribes from a spawned task so a tracker
/// dropped mid-hike never leaves a live stream or tick behind.
struct Producers {
    source: Arc<dyn LocationSource>,
    subscription: Option<SubscriptionId>,
    stop_tx: Option<oneshot::Sender<()>>,
    position_task: JoinHandle<()>,
    tick_task: JoinHandle<()>,
}

impl Drop for Producers {
    fn drop(&mut self) {
        self.position_task.abort();
        self.tick_task.abort();

        let Some(id) = self.subscription.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                let source = Arc::clone(&self.source);
                handle.spawn(async move {
                    if let Err(e) = source.unsubscribe(id).await {
                        error!("Failed to unsubscribe from {}: {}", source.name(), e);
                    }
                });
            }
            Err(_) => warn!("No runtime to release subscription {}", id.0),
        }
    }
}

/// Hike session tracker
///
/// Owns the session state, the position subscription and the duration
/// tick. Position updates and ticks are applied one at a time under the
/// session lock, in arrival order.
pub struct HikeTracker {
    /// Session configuration
    config: SessionConfig,

    /// Where position updates come from
    source: Arc<dyn LocationSource>,

    /// Session state, written by the position task and the tick task
    session: Arc<Mutex<Session>>,

    /// Live producers; `Some` exactly while tracking. Held for the whole
    /// teardown so a `start` cannot interleave with a `stop`.
    producers: Arc<Mutex<Option<Producers>>>,
}

impl HikeTracker {
    pub fn new(config: SessionConfig, source: Arc<dyn LocationSource>) -> Self {
        Self {
            config,
            source,
            session: Arc::new(Mutex::new(Session::new())),
            producers: Arc::new(Mutex::new(None)),
        }
    }

    /// Start tracking
    ///
    /// A second start while tracking is ignored. Fails with
    /// `PermissionDenied` if location access was refused, leaving the
    /// tracker Idle.
    pub async fn start(&self) -> Result<(), HikeError> {
        let mut producers = self.producers.lock().await;
        if producers.is_some() {
            warn!("Hike already being tracked");
            return Ok(());
        }

        if !self.source.request_permission().await?.is_granted() {
            warn!("Cannot start tracking: location permission denied");
            return Err(HikeError::PermissionDenied);
        }

        let subscription = self
            .source
            .subscribe(self.config.min_distance_meters)
            .await?;

        {
            let mut session = self.session.lock().await;
            if !session.start(Utc::now(), Instant::now()) {
                error!("Session still tracking without producers; discarding it");
                session.stop(Utc::now(), Instant::now());
                session.start(Utc::now(), Instant::now());
            }
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let position_task = tokio::spawn(Self::run_positions(
            Arc::clone(&self.session),
            subscription.receiver,
            stop_rx,
        ));
        let tick_task = tokio::spawn(Self::run_ticks(
            Arc::clone(&self.session),
            self.config.tick_interval,
        ));

        *producers = Some(Producers {
            source: Arc::clone(&self.source),
            subscription: Some(subscription.id),
            stop_tx: Some(stop_tx),
            position_task,
            tick_task,
        });

        info!(
            "Hike tracking started via {} (subscription={})",
            self.source.name(),
            subscription.id.0
        );

        Ok(())
    }

    /// Stop tracking and return the finalized summary
    ///
    /// Unregisters both producers before returning. Fixes the source emitted
    /// before the stop are all accounted for; nothing emitted afterwards is.
    /// Returns `None` if no hike was being tracked.
    ///
    /// The teardown runs on its own task, so it completes even if the
    /// caller is cancelled while waiting for it.
    pub async fn stop(&self) -> Option<HikeSummary> {
        let producers = Arc::clone(&self.producers).lock_owned().await;
        if producers.is_none() {
            warn!("Hike tracking not active");
            return None;
        }

        let teardown = tokio::spawn(Self::teardown(
            producers,
            Arc::clone(&self.source),
            Arc::clone(&self.session),
        ));

        match teardown.await {
            Ok(summary) => summary,
            Err(e) => {
                error!("Hike teardown failed: {}", e);
                None
            }
        }
    }

    async fn teardown(
        mut producers: OwnedMutexGuard<Option<Producers>>,
        source: Arc<dyn LocationSource>,
        session: Arc<Mutex<Session>>,
    ) -> Option<HikeSummary> {
        let mut active = producers.take()?;

        if let Some(id) = active.subscription.take() {
            if let Err(e) = source.unsubscribe(id).await {
                error!("Failed to unsubscribe from {}: {}", source.name(), e);
            }
        }

        // Signal the position task to drain whatever is buffered and exit
        if let Some(stop_tx) = active.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(e) = (&mut active.position_task).await {
            error!("Position task panicked: {}", e);
        }

        active.tick_task.abort();
        if let Err(e) = (&mut active.tick_task).await {
            if !e.is_cancelled() {
                error!("Tick task panicked: {}", e);
            }
        }
        drop(active);

        let summary = session.lock().await.stop(Utc::now(), Instant::now());

        if let Some(summary) = &summary {
            info!(
                "Hike tracking stopped: {} points, {:.1}m, {}s",
                summary.path.len(),
                summary.distance_meters,
                summary.duration_seconds
            );
        }

        // Released only now, after the session is Idle
        drop(producers);
        summary
    }

    pub async fn is_tracking(&self) -> bool {
        self.session.lock().await.is_tracking()
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let mut session = self.session.lock().await;
        session.refresh_elapsed(Instant::now());
        session.stats()
    }

    async fn run_positions(
        session: Arc<Mutex<Session>>,
        mut receiver: mpsc::Receiver<Position>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        debug!("Position task started");

        loop {
            tokio::select! {
                update = receiver.recv() => match update {
                    Some(position) => {
                        session.lock().await.record_position(position);
                    }
                    None => {
                        // Source ended the stream; keep the path as is
                        warn!("Position stream closed by source");
                        break;
                    }
                },
                _ = &mut stop_rx => {
                    receiver.close();
                    let mut session = session.lock().await;
                    while let Some(position) = receiver.recv().await {
                        session.record_position(position);
                    }
                    break;
                }
            }
        }

        debug!("Position task stopped");
    }

    async fn run_ticks(session: Arc<Mutex<Session>>, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            session.lock().await.refresh_elapsed(Instant::now());
        }
    }
}
