//! Database repository for automate workspaces. Workspaces are addressed by guid.

use crate::db::{
    errors::{DbError, Result},
    models::automate_workspaces::AutomateWorkspaceDBResponse,
};
use serde_json::Value;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct AutomateWorkspaces<'c> {
    db: &'c mut PgConnection,
}

impl<'c> AutomateWorkspaces<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_guid(&mut self, guid: Uuid) -> Result<Option<AutomateWorkspaceDBResponse>> {
        let workspace = sqlx::query_as::<_, AutomateWorkspaceDBResponse>("SELECT * FROM automate_workspaces WHERE guid = $1")
            .bind(guid)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(workspace)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM automate_workspaces")
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, input, output), err)]
    pub async fn create(&mut self, user_id: Option<i64>, tenant_id: Option<i64>, input: &Value, output: &Value) -> Result<AutomateWorkspaceDBResponse> {
        let workspace = sqlx::query_as::<_, AutomateWorkspaceDBResponse>(
            "INSERT INTO automate_workspaces (user_id, tenant_id, input, output) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(input)
        .bind(output)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(workspace)
    }

    /// Replace the output document. The caller does the merging.
    #[instrument(skip(self, output), err)]
    pub async fn update_output(&mut self, guid: Uuid, output: &Value) -> Result<AutomateWorkspaceDBResponse> {
        let workspace = sqlx::query_as::<_, AutomateWorkspaceDBResponse>(
            "UPDATE automate_workspaces SET output = $2, updated_on = NOW() WHERE guid = $1 RETURNING *",
        )
        .bind(guid)
        .bind(output)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(workspace)
    }
}
