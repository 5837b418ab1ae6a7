//! Script generation from content ideas.

pub mod gemini;
pub mod traits;
pub mod types;

pub use gemini::GeminiScreenwriter;
pub use traits::{ScriptError, Screenwriter};
pub use types::Script;
