use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::workflow::{Workflow, WorkflowId, WorkflowStatus};

/// Message handed to the external notification system when a step decision
/// moves the workflow. Composition and delivery of actual messages live
/// outside this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub workflow_id: WorkflowId,
    pub from_step: u32,
    pub to_step: u32,
    pub new_status: WorkflowStatus,
    pub document_id: String,
    pub client_name: String,
    pub amount: Decimal,
}

impl TransitionEvent {
    pub fn for_workflow(workflow: &Workflow, from_step: u32, to_step: u32) -> Self {
        Self {
            workflow_id: workflow.id.clone(),
            from_step,
            to_step,
            new_status: workflow.status,
            document_id: workflow.document_id.clone(),
            client_name: workflow.client_name.clone(),
            amount: workflow.amount,
        }
    }
}

/// Fire-and-forget boundary: implementations must not block the approval
/// path, and their failures must never roll back a persisted transition.
pub trait NotificationTrigger: Send + Sync {
    fn notify(&self, event: TransitionEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationTrigger {
    events: Arc<Mutex<Vec<TransitionEvent>>>,
}

impl InMemoryNotificationTrigger {
    pub fn events(&self) -> Vec<TransitionEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationTrigger for InMemoryNotificationTrigger {
    fn notify(&self, event: TransitionEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotificationTrigger;

impl NotificationTrigger for NoopNotificationTrigger {
    fn notify(&self, _event: TransitionEvent) {}
}
