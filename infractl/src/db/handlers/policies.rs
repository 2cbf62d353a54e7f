//! Database repositories for events, policy actions and policies.

use crate::db::{
    errors::Result,
    handlers::repository::Page,
    models::policies::{EventDBResponse, PolicyActionDBResponse, PolicyDBResponse},
};
use crate::types::Id;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Events<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Events<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<EventDBResponse>> {
        let event = sqlx::query_as::<_, EventDBResponse>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(event)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<EventDBResponse>> {
        let events = sqlx::query_as::<_, EventDBResponse>("SELECT * FROM events ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(events)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

pub struct PolicyActions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PolicyActions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<PolicyActionDBResponse>> {
        let action = sqlx::query_as::<_, PolicyActionDBResponse>("SELECT * FROM policy_actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(action)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<PolicyActionDBResponse>> {
        let actions = sqlx::query_as::<_, PolicyActionDBResponse>("SELECT * FROM policy_actions ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(actions)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM policy_actions").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

pub struct Policies<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Policies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: Id) -> Result<Option<PolicyDBResponse>> {
        let policy = sqlx::query_as::<_, PolicyDBResponse>("SELECT * FROM policies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(policy)
    }

    #[instrument(skip(self, page), err)]
    pub async fn list(&mut self, page: &Page) -> Result<Vec<PolicyDBResponse>> {
        let policies = sqlx::query_as::<_, PolicyDBResponse>("SELECT * FROM policies ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(policies)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM policies").fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn events_of(&mut self, policy_id: Id) -> Result<Vec<EventDBResponse>> {
        let events = sqlx::query_as::<_, EventDBResponse>(
            r#"
            SELECT e.* FROM events e
            INNER JOIN policy_events pe ON pe.event_id = e.id
            WHERE pe.policy_id = $1
            ORDER BY e.id
            "#,
        )
        .bind(policy_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(events)
    }

    #[instrument(skip(self), err)]
    pub async fn actions_of(&mut self, policy_id: Id) -> Result<Vec<PolicyActionDBResponse>> {
        let actions = sqlx::query_as::<_, PolicyActionDBResponse>(
            r#"
            SELECT a.* FROM policy_actions a
            INNER JOIN policy_policy_actions ppa ON ppa.policy_action_id = a.id
            WHERE ppa.policy_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(policy_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(actions)
    }
}
