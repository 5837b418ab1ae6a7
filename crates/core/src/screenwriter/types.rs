//! Script types produced by the screenwriter.

use serde::{Deserialize, Serialize};

/// A generated script for a single short video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// What should be on screen, fed to the video model.
    pub visual_prompt: String,
    /// Voiceover / sound direction.
    pub audio_prompt: String,
    /// The full script text as returned by the model.
    pub raw_script: String,
}

impl Script {
    /// The combined prompt handed to the video generator.
    pub fn generation_prompt(&self) -> String {
        format!("{}\n\nAudio: {}", self.visual_prompt, self.audio_prompt)
    }
}
