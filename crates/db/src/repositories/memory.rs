use std::collections::HashMap;

use tokio::sync::RwLock;

use quoteflow_core::domain::workflow::{Workflow, WorkflowId, WorkflowStatus};

use super::{RepositoryError, WorkflowRepository};

/// In-memory store with the same version semantics as the SQL repository.
/// Backs service and handler tests.
#[derive(Default)]
pub struct InMemoryWorkflowRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    rows: HashMap<String, (u64, Workflow)>,
}

#[async_trait::async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn insert(&self, workflow: Workflow) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.rows.contains_key(&workflow.id.0) {
            return Err(RepositoryError::DuplicateId(workflow.id.0.clone()));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.rows.insert(workflow.id.0.clone(), (seq, workflow));
        Ok(())
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.get(&id.0).map(|(_, workflow)| workflow.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<(u64, Workflow)> = inner.rows.values().cloned().collect();
        rows.sort_by(|left, right| right.0.cmp(&left.0));
        Ok(rows.into_iter().map(|(_, workflow)| workflow).collect())
    }

    async fn list_queue(&self, role: &str) -> Result<Vec<Workflow>, RepositoryError> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|workflow| {
                matches!(
                    workflow.status,
                    WorkflowStatus::Pending | WorkflowStatus::InProgress
                ) && workflow.active_step().is_some_and(|step| step.role == role)
            })
            .collect())
    }

    async fn update(
        &self,
        workflow: Workflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some((seq, stored)) = inner.rows.get(&workflow.id.0) else {
            return Err(RepositoryError::VersionConflict {
                id: workflow.id.0.clone(),
                expected: expected_version,
            });
        };

        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                id: workflow.id.0.clone(),
                expected: expected_version,
            });
        }

        let seq = *seq;
        inner.rows.insert(workflow.id.0.clone(), (seq, workflow));
        Ok(())
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        Ok(inner.rows.remove(&id.0).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use quoteflow_core::domain::workflow::{
        StepSpec, StepStatus, Workflow, WorkflowId, WorkflowSpec, WorkflowStatus,
    };

    use crate::repositories::{
        InMemoryWorkflowRepository, RepositoryError, WorkflowRepository,
    };

    fn sample_workflow(id: &str, roles: &[&str]) -> Workflow {
        let spec = WorkflowSpec {
            document_id: format!("doc-{id}"),
            document_type: "quote".to_string(),
            client_name: "Globex".to_string(),
            amount: Decimal::new(12_000_00, 2),
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
        Workflow::from_spec(spec, WorkflowId(id.to_string()), Utc::now()).expect("valid spec")
    }

    #[tokio::test]
    async fn round_trip_and_duplicate_rejection() {
        let repo = InMemoryWorkflowRepository::default();
        let workflow = sample_workflow("WF-1", &["Technical Team"]);

        repo.insert(workflow.clone()).await.expect("insert");
        let found = repo.find_by_id(&workflow.id).await.expect("find");
        assert_eq!(found, Some(workflow.clone()));

        let error = repo.insert(workflow).await.expect_err("duplicate");
        assert!(matches!(error, RepositoryError::DuplicateId(_)));
    }

    #[tokio::test]
    async fn list_all_is_reverse_insertion_order() {
        let repo = InMemoryWorkflowRepository::default();
        for id in ["WF-1", "WF-2", "WF-3"] {
            repo.insert(sample_workflow(id, &["Technical Team"])).await.expect("insert");
        }

        let ids: Vec<String> =
            repo.list_all().await.expect("list").into_iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec!["WF-3", "WF-2", "WF-1"]);
    }

    #[tokio::test]
    async fn queue_respects_role_and_terminal_status() {
        let repo = InMemoryWorkflowRepository::default();

        repo.insert(sample_workflow("WF-1", &["Technical Team", "Legal Team"]))
            .await
            .expect("insert");

        let mut terminal = sample_workflow("WF-2", &["Technical Team"]);
        terminal.workflow_steps[0].status = StepStatus::Approved;
        terminal.status = WorkflowStatus::Approved;
        repo.insert(terminal).await.expect("insert terminal");

        let technical = repo.list_queue("Technical Team").await.expect("queue");
        assert_eq!(technical.len(), 1);
        assert_eq!(technical[0].id.0, "WF-1");

        assert!(repo.list_queue("Legal Team").await.expect("queue").is_empty());
    }

    #[tokio::test]
    async fn version_conflicts_mirror_the_sql_repository() {
        let repo = InMemoryWorkflowRepository::default();
        let workflow = sample_workflow("WF-1", &["Technical Team"]);
        repo.insert(workflow.clone()).await.expect("insert");

        let mut next = workflow.clone();
        next.version = 2;
        repo.update(next.clone(), 1).await.expect("first write");

        let error = repo.update(next, 1).await.expect_err("stale write");
        assert!(matches!(error, RepositoryError::VersionConflict { expected: 1, .. }));

        let missing = sample_workflow("WF-404", &["Technical Team"]);
        let error = repo.update(missing, 1).await.expect_err("missing record");
        assert!(matches!(error, RepositoryError::VersionConflict { .. }));
    }
}
