use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    InProgress,
    Approved,
    Denied,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Denied)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Approved,
    Denied,
}

impl StepStatus {
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Approved | Self::Denied)
    }
}

/// One stage in the approval chain. `step` is 1-indexed and matches the
/// step's position in `Workflow::workflow_steps`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub step: u32,
    pub role: String,
    pub email: Option<String>,
    pub status: StepStatus,
    pub comments: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// The unit of approval: a quote document moving through an ordered chain
/// of approver roles. Steps are embedded and never reordered; `version` is
/// the optimistic-concurrency token incremented on every persisted write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub document_id: String,
    pub document_type: String,
    pub client_name: String,
    pub amount: Decimal,
    pub status: WorkflowStatus,
    pub current_step: u32,
    pub total_steps: u32,
    pub workflow_steps: Vec<WorkflowStep>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// The step awaiting a decision. `None` only on a corrupt record;
    /// `current_step` is kept within `[1, total_steps]` by construction.
    pub fn active_step(&self) -> Option<&WorkflowStep> {
        self.step(self.current_step)
    }

    pub fn step(&self, step_number: u32) -> Option<&WorkflowStep> {
        if step_number == 0 {
            return None;
        }
        self.workflow_steps.get(step_number as usize - 1)
    }

    /// Build a freshly-created workflow from a validated spec: all steps
    /// pending, `current_step = 1`, overall status `pending`.
    pub fn from_spec(
        spec: WorkflowSpec,
        id: WorkflowId,
        now: DateTime<Utc>,
    ) -> Result<Self, SpecError> {
        spec.validate()?;

        let total_steps = spec.workflow_steps.len() as u32;
        let workflow_steps = spec
            .workflow_steps
            .into_iter()
            .map(|step| WorkflowStep {
                step: step.step,
                role: step.role,
                email: step.email,
                status: StepStatus::Pending,
                comments: None,
                timestamp: None,
            })
            .collect();

        Ok(Self {
            id,
            document_id: spec.document_id,
            document_type: spec.document_type,
            client_name: spec.client_name,
            amount: spec.amount,
            status: WorkflowStatus::Pending,
            current_step: 1,
            total_steps,
            workflow_steps,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Creation request: chain definition plus the descriptive payload the
/// workflow carries for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    pub document_id: String,
    pub document_type: String,
    pub client_name: String,
    pub amount: Decimal,
    pub workflow_steps: Vec<StepSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    pub step: u32,
    pub role: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("workflow must have at least one step")]
    EmptyChain,
    #[error("step numbers must be contiguous starting at 1: position {position} has step {found}, expected {expected}")]
    NonContiguousSteps { position: usize, expected: u32, found: u32 },
    #[error("step {step} has a blank role")]
    BlankRole { step: u32 },
    #[error("current step {requested} is outside the chain (1..={total_steps})")]
    CurrentStepOutOfRange { requested: u32, total_steps: u32 },
}

impl WorkflowSpec {
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.workflow_steps.is_empty() {
            return Err(SpecError::EmptyChain);
        }

        for (index, step) in self.workflow_steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.step != expected {
                return Err(SpecError::NonContiguousSteps {
                    position: index,
                    expected,
                    found: step.step,
                });
            }
            if step.role.trim().is_empty() {
                return Err(SpecError::BlankRole { step: step.step });
            }
        }

        Ok(())
    }
}

/// Mutation payload for the active step. All fields optional; a payload
/// with only `comments` set records a comment without deciding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdate {
    pub status: Option<StepStatus>,
    pub comments: Option<String>,
    pub email: Option<String>,
}

/// Administrative partial update of non-step fields. Bypasses the state
/// machine; trusted internal callers only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    pub status: Option<WorkflowStatus>,
    pub current_step: Option<u32>,
    pub document_type: Option<String>,
    pub client_name: Option<String>,
    pub amount: Option<Decimal>,
}

impl WorkflowPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.current_step.is_none()
            && self.document_type.is_none()
            && self.client_name.is_none()
            && self.amount.is_none()
    }
}
