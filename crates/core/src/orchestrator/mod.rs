//! Task orchestration: submission, pipeline execution, cancellation.

pub mod runner;
pub mod types;

pub use runner::TaskOrchestrator;
pub use types::{OrchestratorError, SubmitRequest, SubmitSource, TaskFailure};
