use thiserror::Error;

use crate::domain::workflow::{SpecError, WorkflowId};
use crate::machine::TransitionError;

/// Caller-facing taxonomy for every workflow operation. Each variant maps
/// to a precise rejection the UI can show; only `Store` is transient and
/// safe to retry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid workflow spec: {0}")]
    InvalidSpec(#[from] SpecError),
    #[error("workflow `{0}` not found")]
    NotFound(WorkflowId),
    #[error("role `{actor_role}` may not act on step {step}, which is owned by `{required_role}`")]
    RoleMismatch { actor_role: String, required_role: String, step: u32 },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("workflow `{0}` was modified concurrently; retry against fresh state")]
    ConcurrentModification(WorkflowId),
    #[error("store failure: {0}")]
    Store(String),
}

impl WorkflowError {
    /// Stable machine-readable discriminator carried in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSpec(_) => "invalid_spec",
            Self::NotFound(_) => "not_found",
            Self::RoleMismatch { .. } => "role_mismatch",
            Self::Transition(TransitionError::StepNotActive { .. }) => "step_not_active",
            Self::Transition(TransitionError::WorkflowTerminated { .. }) => "workflow_terminated",
            Self::Transition(TransitionError::CommentRequired) => "comment_required",
            Self::ConcurrentModification(_) => "concurrent_modification",
            Self::Store(_) => "store_unavailable",
        }
    }

    /// Transient infrastructure failures, as opposed to rejections of the
    /// request itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::workflow::{SpecError, WorkflowId};
    use crate::errors::WorkflowError;
    use crate::machine::TransitionError;

    #[test]
    fn kinds_are_stable() {
        let cases: Vec<(WorkflowError, &str)> = vec![
            (WorkflowError::InvalidSpec(SpecError::EmptyChain), "invalid_spec"),
            (WorkflowError::NotFound(WorkflowId("wf-1".to_string())), "not_found"),
            (
                WorkflowError::RoleMismatch {
                    actor_role: "Legal Team".to_string(),
                    required_role: "Client".to_string(),
                    step: 3,
                },
                "role_mismatch",
            ),
            (
                WorkflowError::Transition(TransitionError::StepNotActive {
                    requested: 2,
                    current: 1,
                }),
                "step_not_active",
            ),
            (WorkflowError::Transition(TransitionError::CommentRequired), "comment_required"),
            (
                WorkflowError::ConcurrentModification(WorkflowId("wf-1".to_string())),
                "concurrent_modification",
            ),
            (WorkflowError::Store("pool exhausted".to_string()), "store_unavailable"),
        ];

        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
        }
    }

    #[test]
    fn only_store_failures_are_transient() {
        assert!(WorkflowError::Store("down".to_string()).is_transient());
        assert!(!WorkflowError::Transition(TransitionError::CommentRequired).is_transient());
        assert!(!WorkflowError::NotFound(WorkflowId("wf-1".to_string())).is_transient());
    }
}
