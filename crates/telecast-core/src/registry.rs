//! Channel-state reconciliation engine.
//!
//! The registry owns the unified channel set (remote catalog plus user
//! streams), the current selection, and the volume state. UI layers read
//! snapshots and subscribe to change events; nothing outside this module
//! mutates the underlying collections.

use crate::catalog::RemoteCatalogClient;
use crate::channel::{Channel, StreamKind, UserStreamDescriptor};
use crate::config::Config;
use crate::error::{CatalogError, RegistryError};
use crate::fallback::fallback_channels;
use crate::monitor::LivenessMonitor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Catalog readiness. Both the success and the fallback path of a fetch
/// land in `Ready`; there is no error-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// UI volume state. Replaced atomically; the UI is responsible for
/// clamping the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub level: u8,
    pub visible: bool,
}

impl Default for VolumeInfo {
    fn default() -> Self {
        Self {
            level: 50,
            visible: false,
        }
    }
}

/// Change notifications emitted by the registry.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    CatalogUpdated,
    SelectionChanged,
    UserStreamsChanged,
    /// Channel ids pruned by the liveness monitor.
    ChannelsRemoved(Vec<String>),
    VolumeChanged,
}

/// A point-in-time copy of the registry. `rev` is a monotonic counter
/// bumped on every state change; clients can use it to detect missed
/// updates.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub rev: u64,
    pub load: LoadState,
    /// Catalog channels followed by user streams, each in insertion order.
    pub channels: Vec<Channel>,
    pub current_id: Option<String>,
    pub volume: VolumeInfo,
    /// Last catalog-fetch error, kept for diagnostics only. The fallback
    /// path masks it from users.
    pub last_error: Option<String>,
}

pub(crate) struct RegistryState {
    pub(crate) rev: u64,
    pub(crate) load: LoadState,
    pub(crate) catalog: Vec<Channel>,
    pub(crate) user_streams: Vec<Channel>,
    pub(crate) current_id: Option<String>,
    pub(crate) volume: VolumeInfo,
    pub(crate) last_error: Option<String>,
    user_seq: u64,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            rev: 1,
            load: LoadState::Uninitialized,
            catalog: Vec::new(),
            user_streams: Vec::new(),
            current_id: None,
            volume: VolumeInfo::default(),
            last_error: None,
            user_seq: 0,
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub(crate) fn find(&self, id: &str) -> Option<&Channel> {
        self.catalog
            .iter()
            .chain(self.user_streams.iter())
            .find(|c| c.id == id)
    }

    pub(crate) fn unified(&self) -> Vec<Channel> {
        self.catalog
            .iter()
            .chain(self.user_streams.iter())
            .cloned()
            .collect()
    }

    /// Replace the catalog portion. Duplicate ids within the incoming list
    /// keep the first occurrence; ids colliding with an existing user
    /// stream are dropped (the user overlay wins).
    pub(crate) fn adopt_catalog(&mut self, incoming: Vec<Channel>) {
        let mut seen: HashSet<String> =
            self.user_streams.iter().map(|c| c.id.clone()).collect();
        let mut catalog = Vec::with_capacity(incoming.len());
        for channel in incoming {
            if seen.insert(channel.id.clone()) {
                catalog.push(channel);
            } else {
                warn!("dropping catalog entry with duplicate id {:?}", channel.id);
            }
        }
        self.catalog = catalog;
    }

    /// Re-establish the selection invariant: a non-empty unified set always
    /// has a member selected. Returns true when the selection changed.
    pub(crate) fn ensure_selection(&mut self) -> bool {
        let valid = self
            .current_id
            .as_deref()
            .map(|id| self.contains(id))
            .unwrap_or(false);
        if valid {
            return false;
        }
        let next = self
            .catalog
            .first()
            .or_else(|| self.user_streams.first())
            .map(|c| c.id.clone());
        if next == self.current_id {
            return false;
        }
        self.current_id = next;
        true
    }

    /// Remove live-broadcast catalog channels by id. Only `YoutubeLive`
    /// entries are eligible; fallback and user-stream channels are never
    /// touched here.
    pub(crate) fn remove_live_channels(&mut self, dead_ids: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        self.catalog.retain(|c| {
            let dead =
                c.kind == StreamKind::YoutubeLive && dead_ids.iter().any(|id| id == &c.id);
            if dead {
                removed.push(c.id.clone());
            }
            !dead
        });
        removed
    }

    /// Catalog channels still subject to liveness verification, as
    /// `(channel id, platform video id)` pairs.
    pub(crate) fn live_check_targets(&self) -> Vec<(String, String)> {
        self.catalog
            .iter()
            .filter(|c| c.needs_liveness_check())
            .filter_map(|c| c.video_id.as_ref().map(|v| (c.id.clone(), v.clone())))
            .collect()
    }

    fn synthesize_user_id(&mut self) -> String {
        // The sequence number alone guarantees uniqueness for the process
        // lifetime; the timestamp keeps ids distinct across restarts.
        self.user_seq += 1;
        format!(
            "user-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            self.user_seq
        )
    }

    fn add_user_stream(&mut self, descriptor: UserStreamDescriptor) -> (Channel, bool) {
        if let Some(id) = descriptor.id.as_deref() {
            if let Some(existing) = self.find(id) {
                return (existing.clone(), false);
            }
        }

        let id = match descriptor.id {
            Some(id) => id,
            None => self.synthesize_user_id(),
        };
        let ordinal = self.user_streams.len() + 1;
        let channel_number = self
            .catalog
            .iter()
            .chain(self.user_streams.iter())
            .map(|c| c.channel_number)
            .max()
            .unwrap_or(0)
            + 1;

        let channel = Channel {
            id,
            name: descriptor
                .name
                .unwrap_or_else(|| format!("User Stream {}", ordinal)),
            channel_number,
            stream_url: descriptor.url,
            logo_url: descriptor.logo_url,
            category: "user".to_string(),
            is_active: true,
            kind: StreamKind::UserStream,
            video_id: None,
            display_tag: Some(format!("U{}", ordinal)),
        };
        self.user_streams.push(channel.clone());
        (channel, true)
    }

    fn remove_user_stream(&mut self, id: &str) -> bool {
        let before = self.user_streams.len();
        self.user_streams.retain(|c| c.id != id);
        self.user_streams.len() != before
    }

    fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            rev: self.rev,
            load: self.load,
            channels: self.unified(),
            current_id: self.current_id.clone(),
            volume: self.volume,
            last_error: self.last_error.clone(),
        }
    }
}

pub struct ChannelRegistry {
    state: Arc<RwLock<RegistryState>>,
    client: RemoteCatalogClient,
    poll_interval: Duration,
    events: broadcast::Sender<RegistryEvent>,
    monitor: StdMutex<Option<LivenessMonitor>>,
}

impl ChannelRegistry {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = RemoteCatalogClient::new(config)?;
        let (events, _) = broadcast::channel(64);
        Ok(Self {
            state: Arc::new(RwLock::new(RegistryState::new())),
            client,
            poll_interval: config.poll_interval(),
            events,
            monitor: StdMutex::new(None),
        })
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Fetch the catalog and reconcile.
    ///
    /// Never fails: an empty or failed fetch adopts the fallback channels
    /// instead, recording the error for diagnostics. Afterwards the
    /// registry is `Ready`, the selection invariant holds, and the
    /// liveness monitor runs iff live-broadcast channels were adopted.
    pub async fn fetch_channels(&self) {
        {
            let mut st = self.state.write().await;
            st.load = LoadState::Loading;
            st.last_error = None;
            st.rev += 1;
        }

        let outcome = self.client.fetch_catalog().await;

        let (selection_changed, has_live) = {
            let mut st = self.state.write().await;
            match outcome {
                Ok(channels) if !channels.is_empty() => {
                    info!("catalog fetch: {} channels", channels.len());
                    st.adopt_catalog(channels);
                }
                Ok(_) => {
                    warn!("catalog fetch returned no channels, using fallback");
                    st.adopt_catalog(fallback_channels());
                }
                Err(err) => {
                    warn!("catalog fetch failed, using fallback: {}", err);
                    st.last_error = Some(err.to_string());
                    st.adopt_catalog(fallback_channels());
                }
            }
            st.load = LoadState::Ready;
            let selection_changed = st.ensure_selection();
            st.rev += 1;
            let has_live = st.catalog.iter().any(Channel::needs_liveness_check);
            (selection_changed, has_live)
        };

        let _ = self.events.send(RegistryEvent::CatalogUpdated);
        if selection_changed {
            let _ = self.events.send(RegistryEvent::SelectionChanged);
        }
        if has_live {
            self.start_live_monitoring();
        }
    }

    /// Search the catalog. Errors surface to the caller; there is no
    /// static fallback for search results.
    pub async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, CatalogError> {
        self.client.search(query).await
    }

    /// Select a channel by id. The id must reference a member of the
    /// unified set.
    pub async fn set_current_channel(&self, id: &str) -> Result<(), RegistryError> {
        let changed = {
            let mut st = self.state.write().await;
            if !st.contains(id) {
                return Err(RegistryError::InvalidReference(id.to_string()));
            }
            if st.current_id.as_deref() == Some(id) {
                false
            } else {
                st.current_id = Some(id.to_string());
                st.rev += 1;
                true
            }
        };
        if changed {
            let _ = self.events.send(RegistryEvent::SelectionChanged);
        }
        Ok(())
    }

    /// Add a user stream. A descriptor whose id already exists in the
    /// unified set is a no-op returning the existing channel.
    pub async fn add_user_stream(&self, descriptor: UserStreamDescriptor) -> Channel {
        let (channel, added, selection_changed) = {
            let mut st = self.state.write().await;
            let (channel, added) = st.add_user_stream(descriptor);
            let mut selection_changed = false;
            if added {
                if st.current_id.is_none() {
                    st.current_id = Some(channel.id.clone());
                    selection_changed = true;
                }
                st.rev += 1;
            }
            (channel, added, selection_changed)
        };
        if added {
            let _ = self.events.send(RegistryEvent::UserStreamsChanged);
        }
        if selection_changed {
            let _ = self.events.send(RegistryEvent::SelectionChanged);
        }
        channel
    }

    /// Remove one user stream. Returns false when no such stream exists.
    pub async fn remove_user_stream(&self, id: &str) -> bool {
        let (removed, selection_changed) = {
            let mut st = self.state.write().await;
            let removed = st.remove_user_stream(id);
            let mut selection_changed = false;
            if removed {
                selection_changed = st.ensure_selection();
                st.rev += 1;
            }
            (removed, selection_changed)
        };
        if removed {
            let _ = self.events.send(RegistryEvent::UserStreamsChanged);
        }
        if selection_changed {
            let _ = self.events.send(RegistryEvent::SelectionChanged);
        }
        removed
    }

    /// Remove every user stream. Idempotent.
    pub async fn remove_all_user_streams(&self) {
        let (removed, selection_changed) = {
            let mut st = self.state.write().await;
            if st.user_streams.is_empty() {
                (false, false)
            } else {
                st.user_streams.clear();
                let selection_changed = st.ensure_selection();
                st.rev += 1;
                (true, selection_changed)
            }
        };
        if removed {
            let _ = self.events.send(RegistryEvent::UserStreamsChanged);
        }
        if selection_changed {
            let _ = self.events.send(RegistryEvent::SelectionChanged);
        }
    }

    /// Catalog channels followed by user streams; a fresh copy each call.
    pub async fn get_all_channels(&self) -> Vec<Channel> {
        self.state.read().await.unified()
    }

    /// Like [`get_all_channels`](Self::get_all_channels), restricted to
    /// channels flagged active.
    pub async fn get_active_channels(&self) -> Vec<Channel> {
        let mut channels = self.state.read().await.unified();
        channels.retain(|c| c.is_active);
        channels
    }

    pub async fn current_channel(&self) -> Option<Channel> {
        let st = self.state.read().await;
        st.current_id
            .as_deref()
            .and_then(|id| st.find(id))
            .cloned()
    }

    pub async fn volume_info(&self) -> VolumeInfo {
        self.state.read().await.volume
    }

    /// Replace the volume state atomically. No validation; the UI clamps.
    pub async fn set_volume_info(&self, info: VolumeInfo) {
        {
            let mut st = self.state.write().await;
            st.volume = info;
            st.rev += 1;
        }
        let _ = self.events.send(RegistryEvent::VolumeChanged);
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().await.snapshot()
    }

    /// Start the liveness monitor. Idempotent; a no-op while one is
    /// already running, or when no platform API key is configured.
    pub fn start_live_monitoring(&self) {
        if !self.client.has_api_key() {
            info!("no platform API key configured, liveness checks disabled");
            return;
        }
        let mut slot = self.monitor_slot();
        if slot.as_ref().map(LivenessMonitor::is_running).unwrap_or(false) {
            return;
        }
        info!("starting liveness monitor, period {:?}", self.poll_interval);
        *slot = Some(LivenessMonitor::spawn(
            Arc::clone(&self.state),
            self.client.clone(),
            self.events.clone(),
            self.poll_interval,
        ));
    }

    /// Stop the liveness monitor. Safe to call at any time, including
    /// mid-tick; guarantees no further ticks fire. Idempotent.
    pub fn stop_live_monitoring(&self) {
        if let Some(monitor) = self.monitor_slot().take() {
            monitor.stop();
            info!("liveness monitor stopped");
        }
    }

    pub fn is_live_monitoring(&self) -> bool {
        self.monitor_slot()
            .as_ref()
            .map(LivenessMonitor::is_running)
            .unwrap_or(false)
    }

    /// Video identifiers covered by the monitor's most recent tick; empty
    /// when the monitor has never run.
    pub fn monitored_video_ids(&self) -> Vec<String> {
        self.monitor_slot()
            .as_ref()
            .map(LivenessMonitor::tracked_video_ids)
            .unwrap_or_default()
    }

    fn monitor_slot(&self) -> std::sync::MutexGuard<'_, Option<LivenessMonitor>> {
        self.monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ChannelRegistry {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor_slot().take() {
            monitor.stop();
        }
    }
}
