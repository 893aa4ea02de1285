//! Background liveness polling for live-broadcast catalog channels.
//!
//! Owned and started only by the registry. Self-terminates when no
//! live-broadcast channels remain; `stop` is safe at any time and
//! guarantees no further ticks fire.

use crate::catalog::RemoteCatalogClient;
use crate::registry::{RegistryEvent, RegistryState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) struct LivenessMonitor {
    running: Arc<AtomicBool>,
    /// Video identifiers covered by the most recent tick.
    tracked: Arc<StdMutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl LivenessMonitor {
    pub(crate) fn spawn(
        state: Arc<RwLock<RegistryState>>,
        client: RemoteCatalogClient,
        events: broadcast::Sender<RegistryEvent>,
        period: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let tracked = Arc::new(StdMutex::new(Vec::new()));
        let flag = Arc::clone(&running);
        let tracked_writer = Arc::clone(&tracked);
        let task = tokio::spawn(async move {
            poll_loop(state, client, events, period, flag, tracked_writer).await;
        });
        Self {
            running,
            tracked,
            task,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn tracked_video_ids(&self) -> Vec<String> {
        self.tracked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.task.abort();
    }
}

async fn poll_loop(
    state: Arc<RwLock<RegistryState>>,
    client: RemoteCatalogClient,
    events: broadcast::Sender<RegistryEvent>,
    period: Duration,
    running: Arc<AtomicBool>,
    tracked: Arc<StdMutex<Vec<String>>>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // An interval yields immediately; consume that so the first check
    // happens one full period after start.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !running.load(Ordering::Acquire) {
            break;
        }

        let targets = state.read().await.live_check_targets();
        if targets.is_empty() {
            info!("no live-broadcast channels left to verify, stopping monitor");
            running.store(false, Ordering::Release);
            break;
        }

        let video_ids: Vec<String> = targets.iter().map(|(_, v)| v.clone()).collect();
        *tracked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = video_ids.clone();
        let liveness = match client.check_liveness(&video_ids).await {
            Ok(map) => map,
            Err(err) => {
                // Fail open: inconclusive data never removes a channel.
                warn!("liveness check failed, keeping all channels: {}", err);
                continue;
            }
        };

        let dead: Vec<String> = targets
            .iter()
            .filter(|(_, video_id)| !liveness.get(video_id).copied().unwrap_or(false))
            .map(|(channel_id, _)| channel_id.clone())
            .collect();
        if dead.is_empty() {
            debug!("all {} live channel(s) still broadcasting", targets.len());
            continue;
        }

        let (removed, selection_changed) = {
            let mut st = state.write().await;
            let removed = st.remove_live_channels(&dead);
            let selection_changed = if removed.is_empty() {
                false
            } else {
                st.rev += 1;
                st.ensure_selection()
            };
            (removed, selection_changed)
        };

        if !removed.is_empty() {
            info!("removed dead live channel(s): {:?}", removed);
            let _ = events.send(RegistryEvent::ChannelsRemoved(removed));
        }
        if selection_changed {
            let _ = events.send(RegistryEvent::SelectionChanged);
        }
    }
}
