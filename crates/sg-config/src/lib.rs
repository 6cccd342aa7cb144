//! Static mapping tables and env-driven configuration for the StreamGank
//! workflow orchestrator. Pure data and pure functions only, no I/O beyond
//! reading environment variables.

pub mod presets;
pub mod runtime;
pub mod tables;

pub use presets::{TransformParams, TransformPreset};
pub use runtime::{ConfigError, Credentials, WorkerConfig};
pub use tables::{
    heygen_template_for_genre, platform_badge_color, resolve_catalog_url, resolve_content_type,
    resolve_genre, resolve_platform, CatalogUrlError, DEFAULT_HEYGEN_TEMPLATE,
};
