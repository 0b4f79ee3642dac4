//! Property tests for rendition selection: determinism, category purity,
//! and the tier ordering guarantees, over generated rendition sets.

use proptest::prelude::*;
use sinkbridge::selector::{select_audio, select_video, AudioQuality, VideoQuality};
use sinkbridge::StreamRendition;

fn arb_rendition() -> impl Strategy<Value = StreamRendition> {
    (
        "[a-z0-9]{2,8}",
        prop_oneof![
            Just(Some("avc1".to_string())),
            Just(Some("vp9".to_string())),
            Just(Some("none".to_string())),
            Just(None),
        ],
        prop_oneof![
            Just(Some("mp4a.40.2".to_string())),
            Just(Some("opus".to_string())),
            Just(Some("none".to_string())),
            Just(None),
        ],
        0u32..4320,
        0.0f32..400.0,
        0.0f32..10_000.0,
    )
        .prop_map(|(id, vcodec, acodec, height, abr, tbr)| StreamRendition {
            format_id: id.clone(),
            url: format!("https://cdn/{}", id),
            ext: "mp4".to_string(),
            vcodec,
            acodec,
            width: height * 16 / 9,
            height,
            fps: 30.0,
            abr,
            tbr,
            filesize: None,
            protocol: "https".to_string(),
        })
}

fn arb_video_tier() -> impl Strategy<Value = VideoQuality> {
    prop_oneof![
        Just(VideoQuality::P144),
        Just(VideoQuality::P360),
        Just(VideoQuality::P720),
        Just(VideoQuality::P1080),
        Just(VideoQuality::P2160),
        Just(VideoQuality::Best),
        Just(VideoQuality::Worst),
    ]
}

proptest! {
    #[test]
    fn video_selection_is_deterministic(
        set in prop::collection::vec(arb_rendition(), 0..12),
        tier in arb_video_tier(),
    ) {
        let first = select_video(&set, tier).map(|r| r.format_id.clone());
        for _ in 0..3 {
            let again = select_video(&set, tier).map(|r| r.format_id.clone());
            prop_assert_eq!(&first, &again);
        }
    }

    #[test]
    fn chosen_video_is_video_capable(
        set in prop::collection::vec(arb_rendition(), 0..12),
        tier in arb_video_tier(),
    ) {
        if let Ok(chosen) = select_video(&set, tier) {
            prop_assert!(chosen.is_video_capable());
        } else {
            prop_assert!(set.iter().all(|r| !r.is_video_capable()));
        }
    }

    #[test]
    fn chosen_audio_is_audio_capable(
        set in prop::collection::vec(arb_rendition(), 0..12),
    ) {
        if let Ok(chosen) = select_audio(&set, AudioQuality::K128) {
            prop_assert!(chosen.is_audio_capable());
        } else {
            prop_assert!(set.iter().all(|r| !r.is_audio_capable()));
        }
    }

    #[test]
    fn best_is_the_maximum_height(
        set in prop::collection::vec(arb_rendition(), 1..12),
    ) {
        if let Ok(chosen) = select_video(&set, VideoQuality::Best) {
            let max = set
                .iter()
                .filter(|r| r.is_video_capable())
                .map(|r| r.height)
                .max()
                .unwrap();
            prop_assert_eq!(chosen.height, max);
        }
    }

    #[test]
    fn named_tier_never_exceeds_target_when_satisfiable(
        set in prop::collection::vec(arb_rendition(), 1..12),
    ) {
        let target = 720;
        if let Ok(chosen) = select_video(&set, VideoQuality::P720) {
            let any_within = set
                .iter()
                .any(|r| r.is_video_capable() && r.height <= target);
            if any_within {
                prop_assert!(chosen.height <= target);
            } else {
                // All exceed the target: the global minimum wins
                let min = set
                    .iter()
                    .filter(|r| r.is_video_capable())
                    .map(|r| r.height)
                    .min()
                    .unwrap();
                prop_assert_eq!(chosen.height, min);
            }
        }
    }
}
