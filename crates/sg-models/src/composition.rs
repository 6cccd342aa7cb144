//! The compositor's timeline document, built by step 6.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strategy for when enhanced posters are shown relative to their avatar
/// video. See spec §4.6 / SPEC_FULL.md Open Question 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PosterStrategy {
    /// Poster overlays the last 3s of its avatar video. Default.
    #[default]
    HeygenLast3s,
    /// Poster occupies its own 3s slot between the avatar video and the clip.
    BetweenClips,
}

/// One element on a track in the compositor's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub track: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub extra: Value,
}

/// The finished timeline document submitted to the compositor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub timeline_type: String,
    pub output_format: String,
    pub elements: Vec<CompositionElement>,
}

impl Composition {
    pub fn new() -> Self {
        Self {
            width: 1080,
            height: 1920,
            frame_rate: 30,
            timeline_type: "sequential".to_string(),
            output_format: "mp4".to_string(),
            elements: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).expect("Composition always serializes")
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}
