//! Media-CDN transformation presets (spec §6).

use serde::{Deserialize, Serialize};

/// Named Cloudinary transformation preset applied to an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformPreset {
    /// Crop-to-fill 1080x1920, center gravity. Used for trailer clips.
    VerticalPortraitFill,
    /// Letterbox with a black background.
    Fit,
    /// Letterbox with a blurred background.
    Pad,
    /// Stretch to fit, breaking aspect ratio. Discouraged.
    Scale,
}

/// Parameters this preset expands to in the Cloudinary upload call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformParams {
    pub width: u32,
    pub height: u32,
    pub crop: &'static str,
    pub gravity: Option<&'static str>,
    pub background: Option<&'static str>,
    pub video_bit_rate: Option<&'static str>,
}

impl TransformParams {
    /// Render as a Cloudinary transformation string, e.g.
    /// `w_1080,h_1920,c_fill,g_center,vc_auto,br_3000k`.
    pub fn to_cloudinary_string(&self) -> String {
        let mut parts = vec![
            format!("w_{}", self.width),
            format!("h_{}", self.height),
            format!("c_{}", self.crop),
        ];
        if let Some(g) = self.gravity {
            parts.push(format!("g_{g}"));
        }
        if let Some(b) = self.background {
            parts.push(format!("b_{b}"));
        }
        if let Some(br) = self.video_bit_rate {
            parts.push(format!("br_{br}"));
        }
        parts.join(",")
    }
}

impl TransformPreset {
    pub fn params(self) -> TransformParams {
        match self {
            Self::VerticalPortraitFill => TransformParams {
                width: 1080,
                height: 1920,
                crop: "fill",
                gravity: Some("center"),
                background: None,
                video_bit_rate: Some("3000k"),
            },
            Self::Fit => TransformParams {
                width: 1080,
                height: 1920,
                crop: "fit",
                gravity: None,
                background: Some("black"),
                video_bit_rate: None,
            },
            Self::Pad => TransformParams {
                width: 1080,
                height: 1920,
                crop: "pad",
                gravity: None,
                background: Some("blurred"),
                video_bit_rate: None,
            },
            Self::Scale => TransformParams {
                width: 1080,
                height: 1920,
                crop: "scale",
                gravity: None,
                background: None,
                video_bit_rate: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_portrait_fill_matches_spec() {
        let p = TransformPreset::VerticalPortraitFill.params();
        assert_eq!(p.width, 1080);
        assert_eq!(p.height, 1920);
        assert_eq!(p.crop, "fill");
        assert_eq!(p.video_bit_rate, Some("3000k"));
    }
}
