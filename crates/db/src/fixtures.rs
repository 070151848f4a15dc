//! Deterministic demo workflows for local runs and seed-style tests.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use quoteflow_core::domain::workflow::{
    StepSpec, StepStatus, Workflow, WorkflowId, WorkflowSpec, WorkflowStatus,
};

use crate::repositories::{RepositoryError, WorkflowRepository};

pub const SEED_WORKFLOW_IDS: &[&str] = &["wf-seed-fresh", "wf-seed-midchain", "wf-seed-denied"];

pub struct SeedDataset;

impl SeedDataset {
    /// Load the demo workflows. Idempotent per id: an already-seeded store
    /// reports `DuplicateId`, which callers may treat as "already loaded".
    pub async fn load<R: WorkflowRepository>(repo: &R) -> Result<(), RepositoryError> {
        for workflow in Self::workflows() {
            repo.insert(workflow).await?;
        }
        Ok(())
    }

    pub fn workflows() -> Vec<Workflow> {
        vec![fresh_workflow(), midchain_workflow(), denied_workflow()]
    }
}

fn seed_spec(document_suffix: &str, client_name: &str, amount: Decimal) -> WorkflowSpec {
    WorkflowSpec {
        document_id: format!("doc-seed-{document_suffix}"),
        document_type: "migration-quote".to_string(),
        client_name: client_name.to_string(),
        amount,
        workflow_steps: vec![
            StepSpec { step: 1, role: "Technical Team".to_string(), email: None },
            StepSpec {
                step: 2,
                role: "Legal Team".to_string(),
                email: Some("legal@example.com".to_string()),
            },
            StepSpec { step: 3, role: "Client".to_string(), email: None },
        ],
    }
}

fn seed_time(offset_secs: i64) -> chrono::DateTime<Utc> {
    // Fixed anchor keeps the dataset byte-stable across loads.
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).single().expect("valid seed timestamp")
        + chrono::Duration::seconds(offset_secs)
}

fn fresh_workflow() -> Workflow {
    Workflow::from_spec(
        seed_spec("fresh", "Acme Corp", Decimal::new(48_000_00, 2)),
        WorkflowId("wf-seed-fresh".to_string()),
        seed_time(0),
    )
    .expect("seed spec is valid")
}

fn midchain_workflow() -> Workflow {
    let mut workflow = Workflow::from_spec(
        seed_spec("midchain", "Globex Industries", Decimal::new(125_500_00, 2)),
        WorkflowId("wf-seed-midchain".to_string()),
        seed_time(60),
    )
    .expect("seed spec is valid");

    workflow.workflow_steps[0].status = StepStatus::Approved;
    workflow.workflow_steps[0].comments = Some("Sizing validated".to_string());
    workflow.workflow_steps[0].timestamp = Some(seed_time(120));
    workflow.status = WorkflowStatus::InProgress;
    workflow.current_step = 2;
    workflow.version = 2;
    workflow.updated_at = seed_time(120);
    workflow
}

fn denied_workflow() -> Workflow {
    let mut workflow = Workflow::from_spec(
        seed_spec("denied", "Initech LLC", Decimal::new(9_750_00, 2)),
        WorkflowId("wf-seed-denied".to_string()),
        seed_time(180),
    )
    .expect("seed spec is valid");

    workflow.workflow_steps[0].status = StepStatus::Approved;
    workflow.workflow_steps[0].timestamp = Some(seed_time(240));
    workflow.workflow_steps[1].status = StepStatus::Denied;
    workflow.workflow_steps[1].comments = Some("Missing signed SOW".to_string());
    workflow.workflow_steps[1].timestamp = Some(seed_time(300));
    workflow.status = WorkflowStatus::Denied;
    workflow.current_step = 2;
    workflow.version = 3;
    workflow.updated_at = seed_time(300);
    workflow
}
