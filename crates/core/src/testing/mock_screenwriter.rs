//! Mock screenwriter.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::screenwriter::{Script, ScriptError, Screenwriter};

pub struct MockScreenwriter {
    script: Script,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockScreenwriter {
    pub fn succeeding() -> Self {
        Self {
            script: Script {
                visual_prompt: "a test scene".to_string(),
                audio_prompt: "a test voiceover".to_string(),
                raw_script: "{}".to_string(),
            },
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Screenwriter for MockScreenwriter {
    async fn write_script(&self, idea_text: &str) -> Result<Script, ScriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(ScriptError::Parse(message.clone())),
            None => Ok(Script {
                visual_prompt: format!("{}: {}", self.script.visual_prompt, idea_text),
                ..self.script.clone()
            }),
        }
    }
}
