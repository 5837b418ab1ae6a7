//! Task types and state machine.
//!
//! A task tracks one content idea through script generation, video
//! generation and delivery. States are serialized as internally tagged
//! JSON so they can live in a single database column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delivery::{DeliveryOutcome, SinkKind};
use crate::generator::ArtifactRef;

/// Why a task ended up in the `failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Cancelled cooperatively before completion.
    Cancelled,
    /// The screenwriter could not produce a script.
    ScriptError,
    /// Every account in the pool was tried and none produced a video.
    GenerationExhausted,
    /// No account could be acquired within the timeout.
    NoAccountAvailable,
    /// Unexpected failure (store errors, panicked invariants).
    InternalError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Cancelled => "cancelled",
            FailureKind::ScriptError => "script_error",
            FailureKind::GenerationExhausted => "generation_exhausted",
            FailureKind::NoAccountAvailable => "no_account_available",
            FailureKind::InternalError => "internal_error",
        }
    }
}

/// Task lifecycle state.
///
/// Legal transitions move forward only:
/// `pending -> generating_script -> generating_video -> delivering ->
/// completed`, with `failed` reachable from any non-terminal state.
/// `generating_video -> generating_video` is allowed for account
/// rotation attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted, execution unit not yet picked up the work.
    Pending,

    /// The screenwriter is turning the idea into a script.
    GeneratingScript { started_at: DateTime<Utc> },

    /// An upstream account is bound and a video is being generated.
    GeneratingVideo {
        account_id: String,
        /// 1-based attempt number across account rotations.
        attempt: u32,
        started_at: DateTime<Utc>,
    },

    /// The artifact exists and sinks are being attempted.
    Delivering {
        artifact: ArtifactRef,
        started_at: DateTime<Utc>,
    },

    /// Terminal. The artifact exists; deliveries may have partially failed.
    Completed {
        artifact: ArtifactRef,
        deliveries: Vec<DeliveryOutcome>,
        completed_at: DateTime<Utc>,
    },

    /// Terminal. Absorbing state for every non-terminal state.
    Failed {
        kind: FailureKind,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl TaskState {
    /// The tag used in the serialized form and in store filters.
    pub fn state_type(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::GeneratingScript { .. } => "generating_script",
            TaskState::GeneratingVideo { .. } => "generating_video",
            TaskState::Delivering { .. } => "delivering",
            TaskState::Completed { .. } => "completed",
            TaskState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed { .. } | TaskState::Failed { .. })
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Ordinal position in the pipeline, used to reject backward
    /// transitions. Terminal states share the highest rank.
    pub fn phase(&self) -> u8 {
        match self {
            TaskState::Pending => 0,
            TaskState::GeneratingScript { .. } => 1,
            TaskState::GeneratingVideo { .. } => 2,
            TaskState::Delivering { .. } => 3,
            TaskState::Completed { .. } | TaskState::Failed { .. } => 4,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn allows_transition_to(&self, next: &TaskState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, TaskState::Failed { .. }) {
            return true;
        }
        next.phase() >= self.phase()
    }
}

/// A content generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Freeform idea text the script is generated from.
    pub idea_text: String,
    /// Set when the task was submitted from a stored idea.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea_id: Option<String>,
    /// Sinks the artifact should be delivered to. May be empty.
    pub targets: Vec<SinkKind>,
    pub state: TaskState,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact() -> ArtifactRef {
        ArtifactRef {
            path: PathBuf::from("/tmp/video.mp4"),
            source_url: None,
        }
    }

    #[test]
    fn test_state_type_tags() {
        assert_eq!(TaskState::Pending.state_type(), "pending");
        assert_eq!(
            TaskState::GeneratingScript {
                started_at: Utc::now()
            }
            .state_type(),
            "generating_script"
        );
        assert_eq!(
            TaskState::Failed {
                kind: FailureKind::ScriptError,
                reason: "boom".to_string(),
                failed_at: Utc::now(),
            }
            .state_type(),
            "failed"
        );
    }

    #[test]
    fn test_terminal_states() {
        let completed = TaskState::Completed {
            artifact: artifact(),
            deliveries: vec![],
            completed_at: Utc::now(),
        };
        let failed = TaskState::Failed {
            kind: FailureKind::Cancelled,
            reason: "cancelled by user".to_string(),
            failed_at: Utc::now(),
        };
        assert!(completed.is_terminal());
        assert!(failed.is_terminal());
        assert!(!completed.can_cancel());
        assert!(!TaskState::Pending.is_terminal());
        assert!(TaskState::Pending.can_cancel());
    }

    #[test]
    fn test_forward_only_transitions() {
        let pending = TaskState::Pending;
        let script = TaskState::GeneratingScript {
            started_at: Utc::now(),
        };
        let video = TaskState::GeneratingVideo {
            account_id: "acc-1".to_string(),
            attempt: 1,
            started_at: Utc::now(),
        };

        assert!(pending.allows_transition_to(&script));
        assert!(script.allows_transition_to(&video));
        assert!(!video.allows_transition_to(&pending));
        assert!(!video.allows_transition_to(&script));
    }

    #[test]
    fn test_rotation_keeps_same_phase() {
        let first = TaskState::GeneratingVideo {
            account_id: "acc-1".to_string(),
            attempt: 1,
            started_at: Utc::now(),
        };
        let second = TaskState::GeneratingVideo {
            account_id: "acc-2".to_string(),
            attempt: 2,
            started_at: Utc::now(),
        };
        assert!(first.allows_transition_to(&second));
    }

    #[test]
    fn test_failed_absorbs_from_any_non_terminal() {
        let failed = TaskState::Failed {
            kind: FailureKind::InternalError,
            reason: "store went away".to_string(),
            failed_at: Utc::now(),
        };
        for state in [
            TaskState::Pending,
            TaskState::GeneratingScript {
                started_at: Utc::now(),
            },
            TaskState::Delivering {
                artifact: artifact(),
                started_at: Utc::now(),
            },
        ] {
            assert!(state.allows_transition_to(&failed));
        }
        let completed = TaskState::Completed {
            artifact: artifact(),
            deliveries: vec![],
            completed_at: Utc::now(),
        };
        assert!(!completed.allows_transition_to(&failed));
    }

    #[test]
    fn test_state_serde_round_trip() {
        let state = TaskState::GeneratingVideo {
            account_id: "acc-2".to_string(),
            attempt: 3,
            started_at: Utc::now(),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"type\":\"generating_video\""));
        let back: TaskState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_failure_kind_tag() {
        let json = serde_json::to_string(&FailureKind::NoAccountAvailable).unwrap();
        assert_eq!(json, "\"no_account_available\"");
        assert_eq!(FailureKind::GenerationExhausted.as_str(), "generation_exhausted");
    }
}
