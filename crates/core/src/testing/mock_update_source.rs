//! Mock bot update source.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::bot::{BotError, BotUpdate, UpdateSource};

/// Serves pre-loaded update batches; once drained it returns empties.
pub struct MockUpdateSource {
    batches: Mutex<VecDeque<Vec<BotUpdate>>>,
}

impl MockUpdateSource {
    pub fn new(batches: Vec<Vec<BotUpdate>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl UpdateSource for MockUpdateSource {
    async fn fetch_updates(&self, _offset: Option<i64>) -> Result<Vec<BotUpdate>, BotError> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
