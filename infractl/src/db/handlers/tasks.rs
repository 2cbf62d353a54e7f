//! Database repository for the task queue table.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Page,
    models::tasks::{STATE_ACTIVE, STATE_FINISHED, TaskCreateDBRequest, TaskDBResponse},
};
use crate::types::TaskId;
use sqlx::PgConnection;
use std::time::Duration;
use tracing::instrument;

/// Filter for listing tasks. `userid` limits the listing to tasks queued by one user.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub page: Page,
    pub userid: Option<String>,
}

pub struct Tasks<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tasks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name, userid = %request.userid), err)]
    pub async fn create(&mut self, request: &TaskCreateDBRequest) -> Result<TaskDBResponse> {
        let task = sqlx::query_as::<_, TaskDBResponse>("INSERT INTO tasks (name, userid, action) VALUES ($1, $2, $3) RETURNING *")
            .bind(&request.name)
            .bind(&request.userid)
            .bind(&request.action)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(task)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: TaskId) -> Result<Option<TaskDBResponse>> {
        let task = sqlx::query_as::<_, TaskDBResponse>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(task)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &TaskFilter) -> Result<Vec<TaskDBResponse>> {
        let tasks = sqlx::query_as::<_, TaskDBResponse>(
            "SELECT * FROM tasks WHERE ($1::TEXT IS NULL OR userid = $1) ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(&filter.userid)
        .bind(filter.page.limit)
        .bind(filter.page.skip)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(tasks)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self, userid: Option<&str>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE ($1::TEXT IS NULL OR userid = $1)")
            .bind(userid)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }

    /// Move up to `limit` claimable tasks to `active` and return them. Claimable means queued, or
    /// active without an update for `claim_timeout`. Rows locked by another worker are skipped.
    #[instrument(skip(self), err)]
    pub async fn claim_queued(&mut self, limit: i64, claim_timeout: Duration) -> Result<Vec<TaskDBResponse>> {
        let tasks = sqlx::query_as::<_, TaskDBResponse>(
            r#"
            UPDATE tasks SET state = $2, updated_on = NOW()
            WHERE id IN (
                SELECT id FROM tasks
                WHERE state = 'queued'
                   OR (state = $2 AND updated_on < NOW() - make_interval(secs => $3))
                ORDER BY id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(limit)
        .bind(STATE_ACTIVE)
        .bind(claim_timeout.as_secs_f64())
        .fetch_all(&mut *self.db)
        .await?;
        Ok(tasks)
    }

    #[instrument(skip(self, message), err)]
    pub async fn finish(&mut self, id: TaskId, status: &str, message: &str) -> Result<TaskDBResponse> {
        let task = sqlx::query_as::<_, TaskDBResponse>(
            "UPDATE tasks SET state = $2, status = $3, message = $4, updated_on = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(STATE_FINISHED)
        .bind(status)
        .bind(message)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tasks::{STATE_QUEUED, STATUS_OK};
    use serde_json::json;
    use sqlx::PgPool;

    const CLAIM_TIMEOUT: Duration = Duration::from_secs(300);

    fn request(name: &str, userid: &str) -> TaskCreateDBRequest {
        TaskCreateDBRequest {
            name: name.to_string(),
            userid: userid.to_string(),
            action: json!({"type": "delete_cloud_volume", "volume_id": 1}),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_claim_and_finish(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut tasks = Tasks::new(&mut conn);

        let first = tasks.create(&request("one", "alice")).await.unwrap();
        let second = tasks.create(&request("two", "bob")).await.unwrap();
        assert_eq!(first.state, STATE_QUEUED);

        let claimed = tasks.claim_queued(1, CLAIM_TIMEOUT).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, first.id);
        assert_eq!(claimed[0].state, STATE_ACTIVE);

        let finished = tasks.finish(first.id, STATUS_OK, "done").await.unwrap();
        assert_eq!(finished.state, STATE_FINISHED);
        assert_eq!(finished.status.as_deref(), Some(STATUS_OK));

        let rest = tasks.claim_queued(10, CLAIM_TIMEOUT).await.unwrap();
        assert_eq!(rest.iter().map(|t| t.id).collect::<Vec<_>>(), vec![second.id]);
        assert!(tasks.claim_queued(10, CLAIM_TIMEOUT).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stale_active_task_is_claimed_again(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let task = Tasks::new(&mut conn).create(&request("one", "alice")).await.unwrap();
        assert_eq!(Tasks::new(&mut conn).claim_queued(10, CLAIM_TIMEOUT).await.unwrap().len(), 1);

        // Still fresh: left to its worker
        assert!(Tasks::new(&mut conn).claim_queued(10, CLAIM_TIMEOUT).await.unwrap().is_empty());

        sqlx::query("UPDATE tasks SET updated_on = NOW() - INTERVAL '10 minutes' WHERE id = $1")
            .bind(task.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let reclaimed = Tasks::new(&mut conn).claim_queued(10, CLAIM_TIMEOUT).await.unwrap();
        assert_eq!(reclaimed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task.id]);
        assert_eq!(reclaimed[0].state, STATE_ACTIVE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_userid(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut tasks = Tasks::new(&mut conn);
        tasks.create(&request("one", "alice")).await.unwrap();
        tasks.create(&request("two", "bob")).await.unwrap();

        assert_eq!(tasks.count(None).await.unwrap(), 2);
        assert_eq!(tasks.count(Some("alice")).await.unwrap(), 1);

        let filter = TaskFilter {
            page: Page::new(0, 10),
            userid: Some("bob".to_string()),
        };
        let listed = tasks.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "two");
    }
}
