//! Queued provider-bound operations.
//!
//! Creating or deleting key pairs and deleting cloud volumes are not done inline by the request
//! handlers. They are written to the `tasks` table through a [`TaskQueue`] and the caller gets the
//! task id back immediately. A [`worker`] claims queued tasks and carries them out.

pub mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::{
    db::{handlers::Tasks, models::tasks::TaskCreateDBRequest},
    errors::{Error, Result},
    types::{Id, ProviderId, TaskId},
};

/// What a task does, stored as JSON in `tasks.action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskAction {
    CreateKeyPair { provider_id: ProviderId, name: String },
    DeleteKeyPair { key_pair_id: Id },
    DeleteCloudVolume { volume_id: Id },
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Record a task for `userid` and return its id without waiting for it to run.
    async fn enqueue(&self, userid: &str, action: TaskAction, name: &str) -> Result<TaskId>;
}

/// Queue backed by the `tasks` table.
#[derive(Debug, Clone)]
pub struct PgTaskQueue {
    db: PgPool,
}

impl PgTaskQueue {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    #[instrument(skip(self), err)]
    async fn enqueue(&self, userid: &str, action: TaskAction, name: &str) -> Result<TaskId> {
        let action = serde_json::to_value(&action).map_err(|e| Error::Internal {
            operation: format!("serialize task action: {e}"),
        })?;
        let mut conn = self.db.acquire().await?;
        let task = Tasks::new(&mut conn)
            .create(&TaskCreateDBRequest {
                name: name.to_string(),
                userid: userid.to_string(),
                action,
            })
            .await?;
        info!(task_id = task.id, name, "Queued task");
        Ok(task.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tasks::STATE_QUEUED;
    use serde_json::json;

    #[test]
    fn test_action_serialization() {
        let action = TaskAction::CreateKeyPair {
            provider_id: 3,
            name: "deploy".to_string(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({"type": "create_key_pair", "provider_id": 3, "name": "deploy"}));
        assert_eq!(serde_json::from_value::<TaskAction>(value).unwrap(), action);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_enqueue_writes_a_queued_task(pool: PgPool) {
        let queue = PgTaskQueue::new(pool.clone());
        let id = queue
            .enqueue("alice", TaskAction::DeleteCloudVolume { volume_id: 9 }, "Deleting Cloud Volume vol")
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let task = Tasks::new(&mut conn).get_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.state, STATE_QUEUED);
        assert_eq!(task.userid, "alice");
        assert_eq!(task.action["type"], "delete_cloud_volume");
    }
}
