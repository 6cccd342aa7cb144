//! Creatomate timeline builder (spec §4.6). No teacher module builds
//! timelines directly; element construction follows the style of
//! `sg_models::composition` (serde value builders) grounded in the
//! original `video/creatomate_client.py` / `heygen_creatomate_integration.py`
//! element shapes named in the expanded spec.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::debug;

use sg_media::estimate_duration_from_chars;
use sg_models::{Composition, CompositionElement, Movie, PosterStrategy, ScriptBundle};

use crate::error::{CompositionError, CompositionResult};

const MAIN_TRACK: u32 = 1;
const OVERLAY_BANNER_TRACK: u32 = 2;
const OVERLAY_POSTER_TRACK: u32 = 3;

const INTRO_DURATION: f64 = 1.0;
const OUTRO_DURATION: f64 = 2.0;
const POSTER_DURATION: f64 = 3.0;
const POSTER_FADE: f64 = 0.3;
const CLIP_TRIM_SECONDS: f64 = 8.0;

const BANNER_Y_FRACTION: f64 = 0.0625;
const BANNER_HEIGHT_FRACTION: f64 = 0.125;

fn static_intro_image_url() -> String {
    std::env::var("STREAMGANK_INTRO_IMAGE_URL")
        .unwrap_or_else(|_| "https://res.cloudinary.com/streamgank/image/upload/v1/static/intro.jpg".to_string())
}

fn static_outro_image_url() -> String {
    std::env::var("STREAMGANK_OUTRO_IMAGE_URL")
        .unwrap_or_else(|_| "https://res.cloudinary.com/streamgank/image/upload/v1/static/outro.jpg".to_string())
}

fn brand_banner_image_url() -> String {
    std::env::var("STREAMGANK_BANNER_IMAGE_URL")
        .unwrap_or_else(|_| "https://res.cloudinary.com/streamgank/image/upload/v1/static/banner.png".to_string())
}

fn element(kind: &str, track: u32) -> CompositionElement {
    CompositionElement {
        kind: kind.to_string(),
        track,
        source: None,
        time: None,
        duration: None,
        fade_in: None,
        fade_out: None,
        trim_start: None,
        trim_duration: None,
        y: None,
        height: None,
        extra: json!({}),
    }
}

/// Build the compositor timeline document for a job (spec §4.6).
///
/// `movies` must be in slot order (`movie1`, `movie2`, ...); `avatar_urls`,
/// `avatar_durations`, `assets.posters` and `assets.clips` are keyed by
/// slot name. Missing a poster or clip URL for any slot is a build-time
/// error; a missing avatar duration falls back to the character-count
/// estimate (spec §4.8).
pub fn build(
    movies: &[Movie],
    scripts: &ScriptBundle,
    assets: &sg_models::AssetBundle,
    avatar_urls: &BTreeMap<String, String>,
    avatar_durations: &BTreeMap<String, f64>,
    strategy: PosterStrategy,
) -> CompositionResult<Composition> {
    let mut composition = Composition::new();
    let mut cursor = 0.0;

    let mut intro = element("image", MAIN_TRACK);
    intro.source = Some(static_intro_image_url());
    intro.time = Some(cursor);
    intro.duration = Some(INTRO_DURATION);
    composition.elements.push(intro);
    cursor += INTRO_DURATION;

    for (index, movie) in movies.iter().enumerate() {
        let slot = Movie::slot_name(index);

        let avatar_url = avatar_urls.get(&slot).ok_or_else(|| CompositionError::MissingSlotAsset {
            slot: slot.clone(),
            what: "avatar video url",
        })?;
        let poster_url = assets.posters.get(&slot).ok_or_else(|| CompositionError::MissingSlotAsset {
            slot: slot.clone(),
            what: "poster url",
        })?;
        let clip_url = assets.clips.get(&slot).ok_or_else(|| CompositionError::MissingSlotAsset {
            slot: slot.clone(),
            what: "clip url",
        })?;

        let avatar_duration = avatar_durations.get(&slot).copied().unwrap_or_else(|| {
            let script_len = scripts.individual.get(&slot).map(|s| s.len()).unwrap_or(0);
            let estimate = estimate_duration_from_chars(script_len);
            debug!("no probed duration for {slot}, estimating {estimate}s from script length");
            estimate
        });

        let mut avatar = element("video", MAIN_TRACK);
        avatar.source = Some(avatar_url.clone());
        avatar.time = Some(cursor);
        avatar.duration = Some(avatar_duration);
        composition.elements.push(avatar);

        match strategy {
            PosterStrategy::HeygenLast3s => {
                let mut poster = element("image", OVERLAY_POSTER_TRACK);
                poster.source = Some(poster_url.clone());
                poster.time = Some(cursor + (avatar_duration - POSTER_DURATION).max(0.0));
                poster.duration = Some(POSTER_DURATION);
                poster.fade_in = Some(POSTER_FADE);
                poster.fade_out = Some(POSTER_FADE);
                composition.elements.push(poster);

                cursor += avatar_duration;

                let mut clip = element("video", MAIN_TRACK);
                clip.source = Some(clip_url.clone());
                clip.time = Some(cursor);
                clip.duration = Some(CLIP_TRIM_SECONDS);
                clip.trim_start = Some(0.0);
                clip.trim_duration = Some(CLIP_TRIM_SECONDS);
                composition.elements.push(clip);

                cursor += CLIP_TRIM_SECONDS;
            }
            PosterStrategy::BetweenClips => {
                cursor += avatar_duration;

                let mut poster = element("image", MAIN_TRACK);
                poster.source = Some(poster_url.clone());
                poster.time = Some(cursor);
                poster.duration = Some(POSTER_DURATION);
                poster.fade_in = Some(POSTER_FADE);
                poster.fade_out = Some(POSTER_FADE);
                composition.elements.push(poster);

                cursor += POSTER_DURATION;

                let mut clip = element("video", MAIN_TRACK);
                clip.source = Some(clip_url.clone());
                clip.time = Some(cursor);
                clip.duration = Some(CLIP_TRIM_SECONDS);
                clip.trim_start = Some(0.0);
                clip.trim_duration = Some(CLIP_TRIM_SECONDS);
                composition.elements.push(clip);

                cursor += CLIP_TRIM_SECONDS;
            }
        }
    }

    let mut outro = element("image", MAIN_TRACK);
    outro.source = Some(static_outro_image_url());
    outro.time = Some(cursor);
    outro.duration = Some(OUTRO_DURATION);
    composition.elements.push(outro);
    cursor += OUTRO_DURATION;

    let mut banner = element("image", OVERLAY_BANNER_TRACK);
    banner.source = Some(brand_banner_image_url());
    banner.time = Some(INTRO_DURATION);
    banner.duration = Some((cursor - INTRO_DURATION).max(0.0));
    banner.y = Some(BANNER_Y_FRACTION * Composition::new().height as f64);
    banner.height = Some(BANNER_HEIGHT_FRACTION * Composition::new().height as f64);
    composition.elements.push(banner);

    Ok(composition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_models::{AssetBundle, ScriptBundle};

    fn sample_movie(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: 2025,
            genres: vec!["Horror".to_string()],
            platform: "Netflix".to_string(),
            imdb_score: 7.5,
            imdb_votes: 1000,
            poster_url: "https://example.com/poster.jpg".to_string(),
            trailer_url: Some("https://example.com/trailer.mp4".to_string()),
            runtime_minutes: Some(100),
        }
    }

    fn sample_bundle(n: usize) -> (Vec<Movie>, ScriptBundle, AssetBundle, BTreeMap<String, String>, BTreeMap<String, f64>) {
        let movies: Vec<Movie> = (0..n).map(|i| sample_movie(i as i64, &format!("Movie {i}"))).collect();
        let hooks: Vec<String> = (0..n)
            .map(|i| format!("hook {i} text here with enough words to pass the band requirement yes"))
            .collect();
        let mut bundle = ScriptBundle::assemble("Get ready.".to_string(), hooks);
        let mut assets = AssetBundle::new();
        let mut avatar_urls = BTreeMap::new();
        let mut durations = BTreeMap::new();
        for i in 0..n {
            let slot = Movie::slot_name(i);
            assets.posters.insert(slot.clone(), format!("https://cdn.example.com/{slot}_poster.jpg"));
            assets.clips.insert(slot.clone(), format!("https://cdn.example.com/{slot}_clip.mp4"));
            avatar_urls.insert(slot.clone(), format!("https://cdn.heygen.com/{slot}.mp4"));
            durations.insert(slot.clone(), 12.0);
            bundle.individual.insert(slot, format!("script for slot {i}"));
        }
        (movies, bundle, assets, avatar_urls, durations)
    }

    #[test]
    fn element_count_matches_scenario_a() {
        let (movies, scripts, assets, avatar_urls, durations) = sample_bundle(3);
        let composition = build(&movies, &scripts, &assets, &avatar_urls, &durations, PosterStrategy::HeygenLast3s).unwrap();
        assert_eq!(composition.elements.len(), 12);
    }

    #[test]
    fn missing_poster_url_is_an_error() {
        let (movies, scripts, mut assets, avatar_urls, durations) = sample_bundle(1);
        assets.posters.clear();
        let err = build(&movies, &scripts, &assets, &avatar_urls, &durations, PosterStrategy::HeygenLast3s).unwrap_err();
        assert!(matches!(err, CompositionError::MissingSlotAsset { .. }));
    }

    #[test]
    fn between_clips_places_poster_on_main_track() {
        let (movies, scripts, assets, avatar_urls, durations) = sample_bundle(1);
        let composition = build(&movies, &scripts, &assets, &avatar_urls, &durations, PosterStrategy::BetweenClips).unwrap();
        let poster = composition.elements.iter().find(|e| e.kind == "image" && e.duration == Some(POSTER_DURATION)).unwrap();
        assert_eq!(poster.track, MAIN_TRACK);
    }

    #[test]
    fn heygen_last3s_overlays_poster_on_its_own_track() {
        let (movies, scripts, assets, avatar_urls, durations) = sample_bundle(1);
        let composition = build(&movies, &scripts, &assets, &avatar_urls, &durations, PosterStrategy::HeygenLast3s).unwrap();
        let poster = composition.elements.iter().find(|e| e.kind == "image" && e.duration == Some(POSTER_DURATION)).unwrap();
        assert_eq!(poster.track, OVERLAY_POSTER_TRACK);
    }
}
