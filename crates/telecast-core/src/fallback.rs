use crate::channel::{Channel, StreamKind};

/// Hard-coded channels used when the catalog endpoint is empty or
/// unreachable. Pure data, no failure modes.
pub fn fallback_channels() -> Vec<Channel> {
    vec![
        Channel {
            id: "fallback-1".to_string(),
            name: "TRT 1".to_string(),
            channel_number: 1,
            stream_url: "https://tv-trt1.medya.trt.com.tr/master.m3u8".to_string(),
            logo_url: Some(
                "https://upload.wikimedia.org/wikipedia/commons/thumb/8/85/TRT_1_logo_%282021-%29.svg/512px-TRT_1_logo_%282021-%29.svg.png"
                    .to_string(),
            ),
            category: "Ulusal".to_string(),
            is_active: true,
            kind: StreamKind::Hls,
            video_id: None,
            display_tag: None,
        },
        Channel {
            id: "fallback-2".to_string(),
            name: "Show TV".to_string(),
            channel_number: 2,
            stream_url: "https://ciner-live.daioncdn.net/showtv/showtv.m3u8".to_string(),
            logo_url: Some(
                "https://upload.wikimedia.org/wikipedia/commons/thumb/f/f1/Show_TV_logo.svg/512px-Show_TV_logo.svg.png"
                    .to_string(),
            ),
            category: "Ulusal".to_string(),
            is_active: true,
            kind: StreamKind::Hls,
            video_id: None,
            display_tag: None,
        },
    ]
}
