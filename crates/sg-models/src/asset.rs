//! Media assets produced by step 3.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Posters, clips and the (optional) scroll screencast for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssetBundle {
    pub posters: BTreeMap<String, String>,
    pub clips: BTreeMap<String, String>,
    pub scroll_video: Option<String>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }
}
