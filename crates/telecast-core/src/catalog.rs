//! Remote catalog client.
//!
//! Talks to two collaborators: the channel catalog API (`/channels`,
//! `/channels/search`) and the video-platform data API used for batched
//! liveness queries against live-broadcast channels.

use crate::channel::Channel;
use crate::config::Config;
use crate::error::CatalogError;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone)]
pub struct RemoteCatalogClient {
    http: reqwest::Client,
    api_base: String,
    videos_api_base: String,
    api_key: Option<String>,
}

impl RemoteCatalogClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            videos_api_base: config.videos_api_base.trim_end_matches('/').to_string(),
            api_key: config.youtube_api_key.clone(),
        })
    }

    /// Whether a platform API key is configured. Without one, liveness
    /// queries are never issued.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the full channel catalog.
    pub async fn fetch_catalog(&self) -> Result<Vec<Channel>, CatalogError> {
        let url = format!("{}/channels", self.api_base);
        debug!("fetching catalog from {}", url);
        self.get_channel_list(self.http.get(&url)).await
    }

    /// Search the catalog. No fallback on failure; the error is the caller's.
    pub async fn search(&self, query: &str) -> Result<Vec<Channel>, CatalogError> {
        let url = format!("{}/channels/search", self.api_base);
        debug!("searching catalog: q={:?}", query);
        self.get_channel_list(self.http.get(&url).query(&[("q", query)]))
            .await
    }

    async fn get_channel_list(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Channel>, CatalogError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?
            .error_for_status()
            .map_err(CatalogError::from_reqwest)?;

        response
            .json::<Vec<Channel>>()
            .await
            .map_err(CatalogError::from_reqwest)
    }

    /// Batch-query the video platform for broadcast liveness.
    ///
    /// Returns one entry per requested identifier; identifiers absent from
    /// the platform's `items` array come back `false` (not live).
    pub async fn check_liveness(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, bool>, CatalogError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CatalogError::Auth("no platform API key configured".to_string()))?;

        let mut liveness: HashMap<String, bool> =
            video_ids.iter().map(|id| (id.clone(), false)).collect();
        if video_ids.is_empty() {
            return Ok(liveness);
        }

        let url = format!("{}/videos", self.videos_api_base);
        let joined_ids = video_ids.join(",");
        debug!("liveness query for {} video(s)", video_ids.len());
        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,liveStreamingDetails"),
                ("id", joined_ids.as_str()),
                ("key", key),
            ])
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?
            .error_for_status()
            .map_err(CatalogError::from_reqwest)?;

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(CatalogError::from_reqwest)?;

        for item in body.items {
            if let Some(entry) = liveness.get_mut(&item.id) {
                *entry = item.is_live();
            }
        }

        Ok(liveness)
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Option<VideoSnippet>,
}

impl VideoItem {
    fn is_live(&self) -> bool {
        self.snippet
            .as_ref()
            .map(|s| s.live_broadcast_content == "live")
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(rename = "liveBroadcastContent", default)]
    live_broadcast_content: String,
}
