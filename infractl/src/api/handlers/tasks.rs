//! Read access to queued provider operations.
//!
//! Callers with `tasks_read` see every task. Everyone else sees the tasks they queued.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::{
        handlers::{not_found, path_id},
        models::{
            collections::{CollectionQuery, CollectionResponse},
            tasks::TaskResponse,
            users::CurrentUser,
        },
    },
    db::handlers::{Tasks, tasks::TaskFilter},
    errors::Result,
    types::Collection,
};

fn visible_owner(current_user: &CurrentUser) -> Option<String> {
    if current_user.role_allows(&Collection::Tasks.identifier("read")) {
        None
    } else {
        Some(current_user.userid.clone())
    }
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    summary = "List tasks",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Tasks visible to the caller", body = CollectionResponse<TaskResponse>),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    current_user: CurrentUser,
) -> Result<Json<CollectionResponse<TaskResponse>>> {
    let filter = TaskFilter {
        page: query.page(&state.config.api),
        userid: visible_owner(&current_user),
    };

    let mut conn = state.db.acquire().await?;
    let mut repo = Tasks::new(&mut conn);
    let count = repo.count(filter.userid.as_deref()).await?;
    let tasks = repo.list(&filter).await?;

    let api_base = state.api_base();
    let tasks = tasks.into_iter().map(|t| TaskResponse::new(t, &api_base)).collect();
    Ok(Json(CollectionResponse::for_collection(
        Collection::Tasks,
        count,
        tasks,
        query.expands_resources(),
    )))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    summary = "Show a task",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task with its state and outcome", body = TaskResponse),
        (status = 404, description = "Task not found or not visible to the caller"),
    ),
    security(("BasicAuth" = []), ("AuthToken" = []), ("ProxyHeader" = []))
)]
#[tracing::instrument(skip_all, fields(userid = %current_user.userid))]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>, current_user: CurrentUser) -> Result<Json<TaskResponse>> {
    let id = path_id(Collection::Tasks, &id)?;
    let mut conn = state.db.acquire().await?;
    let task = Tasks::new(&mut conn)
        .get_by_id(id)
        .await?
        .filter(|t| visible_owner(&current_user).is_none_or(|owner| owner == t.userid))
        .ok_or_else(|| not_found(Collection::Tasks, id))?;
    Ok(Json(TaskResponse::new(task, &state.api_base())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{PgTaskQueue, TaskAction, TaskQueue};
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_user};
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::PgPool;

    async fn queue_for(pool: &PgPool, userid: &str) -> i64 {
        PgTaskQueue::new(pool.clone())
            .enqueue(userid, TaskAction::DeleteCloudVolume { volume_id: 1 }, "Deleting Cloud Volume vol")
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_owner_sees_only_own_tasks(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool, &[]).await;
        let other = create_test_user(&pool, &[]).await;
        let mine = queue_for(&pool, &owner.userid).await;
        let theirs = queue_for(&pool, &other.userid).await;
        let (name, value) = add_auth_headers(&owner);

        let body: Value = app.get("/api/tasks?expand=resources").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(body["count"], 1);
        assert_eq!(body["resources"][0]["state"], "queued");

        app.get(&format!("/api/tasks/{mine}"))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_ok();
        app.get(&format!("/api/tasks/{theirs}"))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tasks_read_sees_everything(pool: PgPool) {
        let (app, _bg) = create_test_app(pool.clone()).await;
        let reader = create_test_user(&pool, &["tasks_read"]).await;
        let other = create_test_user(&pool, &[]).await;
        let theirs = queue_for(&pool, &other.userid).await;
        queue_for(&pool, &other.userid).await;
        let (name, value) = add_auth_headers(&reader);

        let body: Value = app.get("/api/tasks").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(body["count"], 2);

        let task: TaskResponse = app.get(&format!("/api/tasks/{theirs}")).add_header(name, value).await.json();
        assert_eq!(task.userid, other.userid);
        assert_eq!(task.message, None);
    }
}
