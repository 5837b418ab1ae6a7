use std::sync::Arc;

use reelforge_core::{
    Config, IdeaStore, SanitizedConfig, Scheduler, TaskOrchestrator,
};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: TaskOrchestrator,
    scheduler: Arc<Scheduler>,
    idea_store: Arc<dyn IdeaStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: TaskOrchestrator,
        scheduler: Arc<Scheduler>,
        idea_store: Arc<dyn IdeaStore>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            scheduler,
            idea_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        self.config.sanitized()
    }

    pub fn orchestrator(&self) -> &TaskOrchestrator {
        &self.orchestrator
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn idea_store(&self) -> &dyn IdeaStore {
        self.idea_store.as_ref()
    }
}
