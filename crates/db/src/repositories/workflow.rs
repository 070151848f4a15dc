use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use quoteflow_core::domain::workflow::{
    Workflow, WorkflowId, WorkflowStatus, WorkflowStep,
};

use super::{RepositoryError, WorkflowRepository};
use crate::DbPool;

pub struct SqlWorkflowRepository {
    pool: DbPool,
}

impl SqlWorkflowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub fn workflow_status_as_str(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Pending => "pending",
        WorkflowStatus::InProgress => "in_progress",
        WorkflowStatus::Approved => "approved",
        WorkflowStatus::Denied => "denied",
    }
}

fn parse_status(s: &str) -> WorkflowStatus {
    match s {
        "in_progress" => WorkflowStatus::InProgress,
        "approved" => WorkflowStatus::Approved,
        "denied" => WorkflowStatus::Denied,
        _ => WorkflowStatus::Pending,
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field}: {e}")))
}

fn row_to_workflow(row: &sqlx::sqlite::SqliteRow) -> Result<Workflow, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let document_id: String =
        row.try_get("document_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let document_type: String =
        row.try_get("document_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let client_name: String =
        row.try_get("client_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let amount_str: String =
        row.try_get("amount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let current_step: i64 =
        row.try_get("current_step").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_steps: i64 =
        row.try_get("total_steps").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let steps_json: String =
        row.try_get("steps").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let version: i64 =
        row.try_get("version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let amount = amount_str
        .parse::<Decimal>()
        .map_err(|e| RepositoryError::Decode(format!("amount: {e}")))?;
    let workflow_steps: Vec<WorkflowStep> = serde_json::from_str(&steps_json)
        .map_err(|e| RepositoryError::Decode(format!("steps: {e}")))?;

    Ok(Workflow {
        id: WorkflowId(id),
        document_id,
        document_type,
        client_name,
        amount,
        status: parse_status(&status_str),
        current_step: current_step as u32,
        total_steps: total_steps as u32,
        workflow_steps,
        version,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

fn steps_to_json(steps: &[WorkflowStep]) -> Result<String, RepositoryError> {
    serde_json::to_string(steps).map_err(|e| RepositoryError::Decode(format!("steps: {e}")))
}

const SELECT_COLUMNS: &str = "id, document_id, document_type, client_name, amount, status,
             current_step, total_steps, steps, version, created_at, updated_at";

#[async_trait::async_trait]
impl WorkflowRepository for SqlWorkflowRepository {
    async fn insert(&self, workflow: Workflow) -> Result<(), RepositoryError> {
        let steps_json = steps_to_json(&workflow.workflow_steps)?;

        let result = sqlx::query(
            "INSERT INTO workflow (id, document_id, document_type, client_name, amount, status,
                                   current_step, total_steps, steps, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workflow.id.0)
        .bind(&workflow.document_id)
        .bind(&workflow.document_type)
        .bind(&workflow.client_name)
        .bind(workflow.amount.to_string())
        .bind(workflow_status_as_str(workflow.status))
        .bind(workflow.current_step as i64)
        .bind(workflow.total_steps as i64)
        .bind(&steps_json)
        .bind(workflow.version)
        .bind(workflow.created_at.to_rfc3339())
        .bind(workflow.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                let duplicate = error
                    .as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation());
                if duplicate {
                    Err(RepositoryError::DuplicateId(workflow.id.0.clone()))
                } else {
                    Err(RepositoryError::Database(error))
                }
            }
        }
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM workflow WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_workflow(r)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM workflow ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_workflow).collect::<Result<Vec<_>, _>>()
    }

    async fn list_queue(&self, role: &str) -> Result<Vec<Workflow>, RepositoryError> {
        // The active step's role lives inside the embedded JSON array;
        // current_step is 1-indexed, json paths are 0-indexed.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM workflow
             WHERE status IN ('pending', 'in_progress')
               AND json_extract(steps, '$[' || (current_step - 1) || '].role') = ?
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_workflow).collect::<Result<Vec<_>, _>>()
    }

    async fn update(
        &self,
        workflow: Workflow,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let steps_json = steps_to_json(&workflow.workflow_steps)?;

        let result = sqlx::query(
            "UPDATE workflow
             SET document_type = ?, client_name = ?, amount = ?, status = ?,
                 current_step = ?, steps = ?, version = ?, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(&workflow.document_type)
        .bind(&workflow.client_name)
        .bind(workflow.amount.to_string())
        .bind(workflow_status_as_str(workflow.status))
        .bind(workflow.current_step as i64)
        .bind(&steps_json)
        .bind(workflow.version)
        .bind(workflow.updated_at.to_rfc3339())
        .bind(&workflow.id.0)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::VersionConflict {
                id: workflow.id.0.clone(),
                expected: expected_version,
            });
        }

        Ok(())
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM workflow WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
