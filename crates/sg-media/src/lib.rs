//! Media utilities backing step 3 and step 4.8 of the StreamGank pipeline:
//! trailer/poster download, enhanced-poster compositing, clip trimming,
//! ffprobe duration probing, and the scroll-screencast invoker.

pub mod clip;
pub mod download;
pub mod error;
pub mod poster;
pub mod probe;
pub mod screencast;

pub use error::{MediaError, MediaResult};
pub use poster::{load_system_font, render_enhanced_poster, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use probe::{estimate_duration_from_chars, probe_remote_duration, probe_video, VideoInfo};
