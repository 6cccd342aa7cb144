//! External service clients: HeyGen (avatar rendering), Vizard (clip
//! extraction), Cloudinary (media CDN) and Creatomate (compositor).
//! Each owns its own auth, polling and terminal-status handling; all four
//! share the transport-retry policy in [`retry::retry_http`].

pub mod cloudinary;
pub mod creatomate;
pub mod error;
pub mod heygen;
pub mod retry;
pub mod vizard;

pub use cloudinary::CloudinaryClient;
pub use creatomate::CreatomateClient;
pub use error::{ClientError, ClientResult};
pub use heygen::HeyGenClient;
pub use vizard::VizardClient;
