//! Orchestration layer: validates step mutations against persisted state,
//! applies the state machine, persists with a version check, and emits
//! transition events. The single write path for workflow records.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use quoteflow_core::domain::workflow::{
    SpecError, StepUpdate, Workflow, WorkflowId, WorkflowPatch, WorkflowSpec,
};
use quoteflow_core::errors::WorkflowError;
use quoteflow_core::machine;
use quoteflow_core::notify::{NotificationTrigger, TransitionEvent};
use quoteflow_db::repositories::{RepositoryError, WorkflowRepository};

#[derive(Clone)]
pub struct WorkflowService {
    repo: Arc<dyn WorkflowRepository>,
    trigger: Arc<dyn NotificationTrigger>,
}

impl WorkflowService {
    pub fn new(repo: Arc<dyn WorkflowRepository>, trigger: Arc<dyn NotificationTrigger>) -> Self {
        Self { repo, trigger }
    }

    pub async fn create_workflow(&self, spec: WorkflowSpec) -> Result<Workflow, WorkflowError> {
        let workflow = Workflow::from_spec(spec, WorkflowId::generate(), Utc::now())?;
        self.repo
            .insert(workflow.clone())
            .await
            .map_err(|error| map_store_error(&workflow.id, error))?;

        info!(
            event_name = "workflow.created",
            workflow_id = %workflow.id,
            total_steps = workflow.total_steps,
            "workflow created"
        );
        Ok(workflow)
    }

    pub async fn get_workflow(&self, id: &WorkflowId) -> Result<Workflow, WorkflowError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|error| map_store_error(id, error))?
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, WorkflowError> {
        self.repo.list_all().await.map_err(|error| WorkflowError::Store(error.to_string()))
    }

    pub async fn my_queue(&self, role: &str) -> Result<Vec<Workflow>, WorkflowError> {
        self.repo.list_queue(role).await.map_err(|error| WorkflowError::Store(error.to_string()))
    }

    pub async fn update_workflow_step(
        &self,
        id: &WorkflowId,
        step_number: u32,
        actor_role: &str,
        update: StepUpdate,
    ) -> Result<Workflow, WorkflowError> {
        let workflow = self.get_workflow(id).await?;

        // Role ownership is checked before step activity so an
        // unauthorized caller learns nothing about chain position.
        if let Some(step) = workflow.step(step_number) {
            if step.role != actor_role {
                return Err(WorkflowError::RoleMismatch {
                    actor_role: actor_role.to_string(),
                    required_role: step.role.clone(),
                    step: step_number,
                });
            }
        }

        let outcome = machine::transition(&workflow, step_number, &update, Utc::now())?;

        let expected_version = workflow.version;
        let mut next = outcome.workflow;
        next.version = expected_version + 1;

        self.repo
            .update(next.clone(), expected_version)
            .await
            .map_err(|error| map_store_error(id, error))?;

        info!(
            event_name = "workflow.step_updated",
            workflow_id = %next.id,
            step = step_number,
            status = ?next.status,
            current_step = next.current_step,
            "workflow step updated"
        );

        // Every recorded decision notifies downstream; the transition is
        // durable first and delivery is best-effort.
        if outcome.decision.is_some() {
            self.trigger.notify(TransitionEvent::for_workflow(
                &next,
                outcome.from_step,
                outcome.to_step,
            ));
        }

        Ok(next)
    }

    pub async fn update_workflow(
        &self,
        id: &WorkflowId,
        patch: WorkflowPatch,
    ) -> Result<Workflow, WorkflowError> {
        let workflow = self.get_workflow(id).await?;
        if patch.is_empty() {
            return Ok(workflow);
        }

        if let Some(current_step) = patch.current_step {
            if current_step == 0 || current_step > workflow.total_steps {
                return Err(WorkflowError::InvalidSpec(SpecError::CurrentStepOutOfRange {
                    requested: current_step,
                    total_steps: workflow.total_steps,
                }));
            }
        }

        let expected_version = workflow.version;
        let mut next = workflow;
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(current_step) = patch.current_step {
            next.current_step = current_step;
        }
        if let Some(document_type) = patch.document_type {
            next.document_type = document_type;
        }
        if let Some(client_name) = patch.client_name {
            next.client_name = client_name;
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        next.version = expected_version + 1;
        next.updated_at = Utc::now();

        self.repo
            .update(next.clone(), expected_version)
            .await
            .map_err(|error| map_store_error(id, error))?;

        warn!(
            event_name = "workflow.admin_updated",
            workflow_id = %next.id,
            status = ?next.status,
            current_step = next.current_step,
            "workflow updated outside the state machine"
        );
        Ok(next)
    }

    pub async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), WorkflowError> {
        let removed =
            self.repo.delete(id).await.map_err(|error| map_store_error(id, error))?;
        if !removed {
            return Err(WorkflowError::NotFound(id.clone()));
        }

        info!(event_name = "workflow.deleted", workflow_id = %id, "workflow deleted");
        Ok(())
    }
}

fn map_store_error(id: &WorkflowId, error: RepositoryError) -> WorkflowError {
    match error {
        RepositoryError::VersionConflict { .. } => {
            WorkflowError::ConcurrentModification(id.clone())
        }
        other => WorkflowError::Store(other.to_string()),
    }
}
