//! Video generation against upstream model providers.

pub mod traits;
pub mod types;
pub mod veo;

pub use traits::{GenerationError, VideoGenerator};
pub use types::ArtifactRef;
pub use veo::VeoClient;
