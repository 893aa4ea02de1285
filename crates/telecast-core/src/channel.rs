use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// How a channel's stream is transported / sourced.
///
/// Serialized as the backend's tag strings (`hls`, `youtube-live`,
/// `user-stream`, `other`). Unknown inbound tags decode as `Other` so a
/// backend rollout of a new kind never breaks the whole catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    /// Plain HLS (or progressive) URL.
    #[default]
    Hls,
    /// Platform live broadcast; subject to periodic liveness verification.
    YoutubeLive,
    /// Contributed at runtime by the user, never fetched from the network.
    UserStream,
    /// Anything else the backend may emit.
    Other,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Hls => "hls",
            StreamKind::YoutubeLive => "youtube-live",
            StreamKind::UserStream => "user-stream",
            StreamKind::Other => "other",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "hls" => StreamKind::Hls,
            "youtube-live" => StreamKind::YoutubeLive,
            "user-stream" => StreamKind::UserStream,
            _ => StreamKind::Other,
        }
    }
}

impl Serialize for StreamKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StreamKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(StreamKind::from_tag(&tag))
    }
}

/// One playable channel, as served by the catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Numeric ordering key (the classic channel number).
    #[serde(default)]
    pub channel_number: u32,
    /// Stream URL, or a platform-native live-stream locator.
    pub stream_url: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub kind: StreamKind,
    /// Platform-native video identifier, required for liveness checks.
    #[serde(default)]
    pub video_id: Option<String>,
    /// Ordinal display tag (`U1`, `U2`, ...); only set on user streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_tag: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Channel {
    /// True for catalog channels that need periodic liveness verification.
    pub fn needs_liveness_check(&self) -> bool {
        self.kind == StreamKind::YoutubeLive && self.video_id.is_some()
    }
}

/// Input for [`crate::registry::ChannelRegistry::add_user_stream`].
///
/// Only the stream URL is required; everything else is synthesized or
/// defaulted at add time.
#[derive(Debug, Clone, Default)]
pub struct UserStreamDescriptor {
    pub url: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_catalog_record() {
        let json = r#"{
            "id": "trt-1",
            "name": "TRT 1",
            "channel_number": 1,
            "stream_url": "https://tv-trt1.medya.trt.com.tr/master.m3u8",
            "logo_url": null,
            "category": "Ulusal",
            "is_active": true,
            "kind": "hls"
        }"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.id, "trt-1");
        assert_eq!(ch.kind, StreamKind::Hls);
        assert!(ch.is_active);
        assert!(ch.video_id.is_none());
    }

    #[test]
    fn test_unknown_kind_decodes_as_other() {
        let json = r#"{"id": "x", "name": "X", "stream_url": "http://x", "kind": "webrtc"}"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.kind, StreamKind::Other);
    }

    #[test]
    fn test_minimal_record_defaults() {
        let json = r#"{"id": "x", "name": "X", "stream_url": "http://x"}"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.kind, StreamKind::Hls);
        assert!(ch.is_active);
        assert_eq!(ch.channel_number, 0);
    }

    #[test]
    fn test_kind_roundtrip_tags() {
        assert_eq!(
            serde_json::to_string(&StreamKind::YoutubeLive).unwrap(),
            "\"youtube-live\""
        );
        assert_eq!(
            serde_json::from_str::<StreamKind>("\"user-stream\"").unwrap(),
            StreamKind::UserStream
        );
    }

    #[test]
    fn test_needs_liveness_check() {
        let mut ch = Channel {
            id: "live".into(),
            name: "Live".into(),
            stream_url: "v1".into(),
            kind: StreamKind::YoutubeLive,
            video_id: Some("v1".into()),
            ..Channel::default()
        };
        assert!(ch.needs_liveness_check());
        ch.video_id = None;
        assert!(!ch.needs_liveness_check());
        ch.kind = StreamKind::Hls;
        assert!(!ch.needs_liveness_check());
    }
}
