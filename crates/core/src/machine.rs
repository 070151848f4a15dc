//! Pure step-transition logic for the approval chain.
//!
//! `transition` never touches storage or notifications; callers feed it the
//! persisted workflow and persist the outcome themselves.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::workflow::{StepStatus, StepUpdate, Workflow, WorkflowStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("workflow is already {status:?} and can no longer be modified")]
    WorkflowTerminated { status: WorkflowStatus },
    #[error("step {requested} is not the active step (current step is {current})")]
    StepNotActive { requested: u32, current: u32 },
    #[error("a denial must carry a non-empty comment")]
    CommentRequired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub workflow: Workflow,
    pub from_step: u32,
    pub to_step: u32,
    /// The decision recorded on the step, if any. `None` means a
    /// comment-only update that left the chain position untouched.
    pub decision: Option<StepStatus>,
}

/// Apply `update` to the step at `step_number` and derive the new overall
/// status and current step.
///
/// Rules:
/// - approving the final step terminates the workflow as `approved`;
/// - approving any earlier step advances `current_step` and marks the
///   workflow `in_progress`;
/// - a denial terminates the workflow as `denied` with `current_step`
///   frozen, leaving later steps `pending` forever;
/// - an update that sets no decision (comments and/or email only) changes
///   nothing but the step's comments/email/timestamp.
pub fn transition(
    workflow: &Workflow,
    step_number: u32,
    update: &StepUpdate,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    if workflow.status.is_terminal() {
        return Err(TransitionError::WorkflowTerminated { status: workflow.status });
    }
    if step_number != workflow.current_step || workflow.step(step_number).is_none() {
        return Err(TransitionError::StepNotActive {
            requested: step_number,
            current: workflow.current_step,
        });
    }

    if update.status == Some(StepStatus::Denied) {
        let existing = workflow.step(step_number).and_then(|step| step.comments.as_deref());
        let comment = update.comments.as_deref().or(existing).unwrap_or("");
        if comment.trim().is_empty() {
            return Err(TransitionError::CommentRequired);
        }
    }

    let mut next = workflow.clone();
    let index = step_number as usize - 1;
    let step = &mut next.workflow_steps[index];

    if let Some(status) = update.status {
        step.status = status;
    }
    if let Some(comments) = &update.comments {
        step.comments = Some(comments.clone());
    }
    if let Some(email) = &update.email {
        step.email = Some(email.clone());
    }
    step.timestamp = Some(now);

    let decision = update.status.filter(|status| status.is_decided());
    let (new_status, new_current) = match step.status {
        StepStatus::Approved => {
            if step_number == workflow.total_steps {
                (WorkflowStatus::Approved, workflow.current_step)
            } else {
                (WorkflowStatus::InProgress, step_number + 1)
            }
        }
        StepStatus::Denied => (WorkflowStatus::Denied, workflow.current_step),
        StepStatus::Pending => (workflow.status, workflow.current_step),
    };

    next.status = new_status;
    next.current_step = new_current;
    next.updated_at = now;

    Ok(TransitionOutcome {
        workflow: next,
        from_step: step_number,
        to_step: new_current,
        decision,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::workflow::{
        StepSpec, StepStatus, StepUpdate, Workflow, WorkflowId, WorkflowSpec, WorkflowStatus,
    };
    use crate::machine::{transition, TransitionError};

    fn chain(roles: &[&str]) -> Workflow {
        let spec = WorkflowSpec {
            document_id: "doc-1".to_string(),
            document_type: "quote".to_string(),
            client_name: "Globex".to_string(),
            amount: Decimal::new(48_000_00, 2),
            workflow_steps: roles
                .iter()
                .enumerate()
                .map(|(index, role)| StepSpec {
                    step: index as u32 + 1,
                    role: role.to_string(),
                    email: None,
                })
                .collect(),
        };
        Workflow::from_spec(spec, WorkflowId("wf-test".to_string()), Utc::now())
            .expect("valid chain")
    }

    fn approve() -> StepUpdate {
        StepUpdate { status: Some(StepStatus::Approved), comments: None, email: None }
    }

    fn deny(comment: &str) -> StepUpdate {
        StepUpdate {
            status: Some(StepStatus::Denied),
            comments: Some(comment.to_string()),
            email: None,
        }
    }

    #[test]
    fn approving_mid_chain_advances_current_step() {
        let workflow = chain(&["Technical Team", "Legal Team", "Client"]);

        let outcome = transition(&workflow, 1, &approve(), Utc::now()).expect("approve step 1");

        assert_eq!(outcome.workflow.status, WorkflowStatus::InProgress);
        assert_eq!(outcome.workflow.current_step, 2);
        assert_eq!(outcome.from_step, 1);
        assert_eq!(outcome.to_step, 2);
        assert_eq!(outcome.decision, Some(StepStatus::Approved));
        assert_eq!(outcome.workflow.workflow_steps[0].status, StepStatus::Approved);
        assert!(outcome.workflow.workflow_steps[0].timestamp.is_some());
    }

    #[test]
    fn approving_final_step_approves_workflow() {
        let mut workflow = chain(&["Technical Team", "Legal Team"]);
        workflow = transition(&workflow, 1, &approve(), Utc::now()).expect("step 1").workflow;

        let outcome = transition(&workflow, 2, &approve(), Utc::now()).expect("final step");

        assert_eq!(outcome.workflow.status, WorkflowStatus::Approved);
        assert_eq!(outcome.workflow.current_step, 2, "current step stays at the exhausted chain");
        assert_eq!(outcome.to_step, 2);
    }

    #[test]
    fn denial_short_circuits_regardless_of_position() {
        let mut workflow = chain(&["Technical Team", "Legal Team", "Client"]);
        workflow = transition(&workflow, 1, &approve(), Utc::now()).expect("step 1").workflow;

        let outcome =
            transition(&workflow, 2, &deny("missing SOW"), Utc::now()).expect("deny step 2");

        assert_eq!(outcome.workflow.status, WorkflowStatus::Denied);
        assert_eq!(outcome.workflow.current_step, 2, "current step frozen at the denial");
        assert_eq!(outcome.decision, Some(StepStatus::Denied));
        assert_eq!(outcome.workflow.workflow_steps[2].status, StepStatus::Pending);
    }

    #[test]
    fn terminal_workflow_rejects_any_further_mutation() {
        let mut workflow = chain(&["Technical Team", "Legal Team", "Client"]);
        workflow = transition(&workflow, 1, &approve(), Utc::now()).expect("step 1").workflow;
        workflow =
            transition(&workflow, 2, &deny("missing SOW"), Utc::now()).expect("step 2").workflow;

        let error = transition(&workflow, 3, &approve(), Utc::now())
            .expect_err("denied workflow is immutable");

        assert_eq!(error, TransitionError::WorkflowTerminated { status: WorkflowStatus::Denied });
    }

    #[test]
    fn approved_workflow_rejects_any_further_mutation() {
        let mut workflow = chain(&["Technical Team"]);
        workflow = transition(&workflow, 1, &approve(), Utc::now()).expect("only step").workflow;
        assert_eq!(workflow.status, WorkflowStatus::Approved);

        let error = transition(&workflow, 1, &approve(), Utc::now())
            .expect_err("approved workflow is immutable");

        assert_eq!(
            error,
            TransitionError::WorkflowTerminated { status: WorkflowStatus::Approved }
        );
    }

    #[test]
    fn acting_on_past_or_future_step_is_rejected() {
        let mut workflow = chain(&["Technical Team", "Legal Team", "Client"]);
        workflow = transition(&workflow, 1, &approve(), Utc::now()).expect("step 1").workflow;

        let past = transition(&workflow, 1, &approve(), Utc::now()).expect_err("step 1 is past");
        assert_eq!(past, TransitionError::StepNotActive { requested: 1, current: 2 });

        let future = transition(&workflow, 3, &approve(), Utc::now()).expect_err("step 3 is future");
        assert_eq!(future, TransitionError::StepNotActive { requested: 3, current: 2 });
    }

    #[test]
    fn denial_without_comment_is_rejected_and_state_unchanged() {
        let workflow = chain(&["Technical Team", "Legal Team"]);
        let update =
            StepUpdate { status: Some(StepStatus::Denied), comments: None, email: None };

        let error = transition(&workflow, 1, &update, Utc::now()).expect_err("comment required");

        assert_eq!(error, TransitionError::CommentRequired);
        assert_eq!(workflow.workflow_steps[0].status, StepStatus::Pending);
        assert_eq!(workflow.status, WorkflowStatus::Pending);
    }

    #[test]
    fn whitespace_only_denial_comment_is_rejected() {
        let workflow = chain(&["Technical Team"]);

        let error =
            transition(&workflow, 1, &deny("   "), Utc::now()).expect_err("blank comment");

        assert_eq!(error, TransitionError::CommentRequired);
    }

    #[test]
    fn denial_may_rely_on_a_previously_recorded_comment() {
        let workflow = chain(&["Technical Team", "Legal Team"]);
        let comment_only = StepUpdate {
            status: None,
            comments: Some("pricing looks off, checking".to_string()),
            email: None,
        };
        let commented =
            transition(&workflow, 1, &comment_only, Utc::now()).expect("comment").workflow;

        let deny_without_new_comment =
            StepUpdate { status: Some(StepStatus::Denied), comments: None, email: None };
        let outcome = transition(&commented, 1, &deny_without_new_comment, Utc::now())
            .expect("existing comment satisfies the requirement");

        assert_eq!(outcome.workflow.status, WorkflowStatus::Denied);
    }

    #[test]
    fn comment_only_update_leaves_chain_position_untouched() {
        let workflow = chain(&["Technical Team", "Legal Team"]);
        let update = StepUpdate {
            status: None,
            comments: Some("reviewing the migration plan".to_string()),
            email: None,
        };

        let outcome = transition(&workflow, 1, &update, Utc::now()).expect("comment only");

        assert_eq!(outcome.workflow.status, WorkflowStatus::Pending);
        assert_eq!(outcome.workflow.current_step, 1);
        assert_eq!(outcome.decision, None);
        assert_eq!(
            outcome.workflow.workflow_steps[0].comments.as_deref(),
            Some("reviewing the migration plan")
        );
        assert!(outcome.workflow.workflow_steps[0].timestamp.is_some());
    }

    #[test]
    fn email_can_be_resolved_on_the_active_step() {
        let workflow = chain(&["Technical Team"]);
        let update = StepUpdate {
            status: None,
            comments: None,
            email: Some("tech-lead@example.com".to_string()),
        };

        let outcome = transition(&workflow, 1, &update, Utc::now()).expect("email update");

        assert_eq!(
            outcome.workflow.workflow_steps[0].email.as_deref(),
            Some("tech-lead@example.com")
        );
        assert_eq!(outcome.decision, None);
    }

    #[test]
    fn full_chain_walk_keeps_invariants() {
        let roles = ["Technical Team", "Legal Team", "Client", "Deal Desk"];
        let mut workflow = chain(&roles);

        for step in 1..=roles.len() as u32 {
            assert!(workflow.current_step >= 1 && workflow.current_step <= workflow.total_steps);
            let outcome = transition(&workflow, step, &approve(), Utc::now()).expect("approve");
            workflow = outcome.workflow;

            for earlier in &workflow.workflow_steps[..workflow.current_step as usize - 1] {
                assert_eq!(earlier.status, StepStatus::Approved);
            }
        }

        assert_eq!(workflow.status, WorkflowStatus::Approved);
    }

    #[test]
    fn updated_at_moves_on_every_successful_transition() {
        let workflow = chain(&["Technical Team", "Legal Team"]);
        let later = workflow.updated_at + chrono::Duration::seconds(90);

        let outcome = transition(&workflow, 1, &approve(), later).expect("approve");

        assert_eq!(outcome.workflow.updated_at, later);
    }
}
