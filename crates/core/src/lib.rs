pub mod bot;
pub mod config;
pub mod delivery;
pub mod generator;
pub mod idea;
pub mod metrics;
pub mod orchestrator;
pub mod pool;
pub mod scheduler;
pub mod screenwriter;
pub mod task;
pub mod testing;

pub use bot::{BotUpdate, TelegramUpdateSource, UpdatePoller, UpdateSource};
pub use config::{
    load_config, load_config_from_str, AccountConfig, BotConfig, Config, ConfigError,
    SanitizedConfig, ServerConfig,
};
pub use delivery::{
    DeliveryFanout, DeliveryMetadata, DeliveryOutcome, DeliveryResult, Sink, SinkError, SinkKind,
    TelegramSink, TikTokSink,
};
pub use generator::{ArtifactRef, GenerationError, VeoClient, VideoGenerator};
pub use idea::{CreateIdeaRequest, Idea, IdeaError, IdeaStore, SqliteIdeaStore};
pub use orchestrator::{
    OrchestratorError, SubmitRequest, SubmitSource, TaskOrchestrator,
};
pub use pool::{
    AccountLease, AccountPool, AccountSeed, AccountSnapshot, AccountState, CredentialRef,
    PoolConfig, PoolError, ReleaseOutcome,
};
pub use scheduler::{
    FireTime, IdeaSelection, Scheduler, SchedulerConfig, SchedulerError, SchedulerStatus,
    SchedulerStore, SqliteSchedulerStore,
};
pub use screenwriter::{GeminiScreenwriter, Script, ScriptError, Screenwriter};
pub use task::{
    CreateTaskRequest, FailureKind, SqliteTaskStore, Task, TaskError, TaskFilter, TaskState,
    TaskStore,
};
