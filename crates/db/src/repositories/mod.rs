use async_trait::async_trait;
use thiserror::Error;

use quoteflow_core::domain::workflow::{Workflow, WorkflowId};

pub mod memory;
pub mod workflow;

pub use memory::InMemoryWorkflowRepository;
pub use workflow::SqlWorkflowRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("workflow `{0}` already exists")]
    DuplicateId(String),
    #[error("stale write for workflow `{id}`: expected version {expected}")]
    VersionConflict { id: String, expected: i64 },
}

/// Durable store for whole `Workflow` documents. Steps are embedded in the
/// record; there is no separate step table to keep consistent.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn insert(&self, workflow: Workflow) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError>;

    /// All workflows, most recently created first.
    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError>;

    /// Non-terminal workflows whose active step is owned by `role`,
    /// derived from `(status, current_step)` at query time.
    async fn list_queue(&self, role: &str) -> Result<Vec<Workflow>, RepositoryError>;

    /// Whole-document write conditioned on the version observed at read
    /// time. `workflow.version` must already carry the next version;
    /// the write applies only where the stored version still equals
    /// `expected_version`, otherwise `VersionConflict` (which also covers
    /// a record deleted since the read).
    async fn update(
        &self,
        workflow: Workflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: &WorkflowId) -> Result<bool, RepositoryError>;
}
