//! Test doubles and fixtures shared by unit and integration tests.

pub mod mock_generator;
pub mod mock_screenwriter;
pub mod mock_sink;
pub mod mock_update_source;

pub use mock_generator::{MockGenOutcome, MockVideoGenerator};
pub use mock_screenwriter::MockScreenwriter;
pub use mock_sink::MockSink;
pub use mock_update_source::MockUpdateSource;

pub mod fixtures {
    use crate::pool::{AccountSeed, CredentialRef};
    use crate::screenwriter::Script;

    pub fn script() -> Script {
        Script {
            visual_prompt: "an otter surfs a wave at sunset".to_string(),
            audio_prompt: "upbeat ukulele with crashing waves".to_string(),
            raw_script: "{\"visual_prompt\": \"...\", \"audio_prompt\": \"...\"}".to_string(),
        }
    }

    pub fn account_seeds(count: usize) -> Vec<AccountSeed> {
        (0..count)
            .map(|i| AccountSeed {
                id: format!("acc-{}", i),
                credential: CredentialRef::new(format!("key-{}", i)),
            })
            .collect()
    }
}
