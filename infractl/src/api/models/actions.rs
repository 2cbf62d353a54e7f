//! The action result envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::Error;
use crate::types::{Collection, TaskId};

/// Outcome of one action on one target.
///
/// Queued actions carry the task that will carry them out:
///
/// ```json
/// {"success": true, "message": "Deleting Cloud Volume vol-1", "task_id": "17",
///  "task_href": "http://localhost:3000/api/tasks/17"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ActionResult {
    fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            task_id: None,
            task_href: None,
            result: None,
            href: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(true, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }

    /// Failure envelope carrying the client-safe message of `err`.
    pub fn from_error(err: &Error) -> Self {
        Self::failure(err.user_message())
    }

    pub fn with_task(mut self, task_id: TaskId, api_base: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self.task_href = Some(Collection::Tasks.href(api_base, task_id));
        self
    }

    pub fn with_href(mut self, href: String) -> Self {
        self.href = Some(href);
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Response to a bulk request, one entry per requested resource in request order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkResults<T> {
    pub results: Vec<T>,
}

impl<T> BulkResults<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self { results }
    }
}

/// One entry of an action response: the resource itself (create, edit) or an envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome<T> {
    Resource(T),
    Result(ActionResult),
}

impl<T> From<ActionResult> for ActionOutcome<T> {
    fn from(result: ActionResult) -> Self {
        ActionOutcome::Result(result)
    }
}

/// Body of a `POST` action: a single outcome, or `{"results": [...]}` for `resources` requests.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionResponse<T> {
    Single(ActionOutcome<T>),
    Bulk(BulkResults<ActionOutcome<T>>),
}

impl<T> ActionResponse<T> {
    pub fn new(bulk: bool, mut outcomes: Vec<ActionOutcome<T>>) -> Self {
        if bulk || outcomes.len() != 1 {
            ActionResponse::Bulk(BulkResults::new(outcomes))
        } else {
            match outcomes.pop() {
                Some(outcome) => ActionResponse::Single(outcome),
                None => ActionResponse::Bulk(BulkResults::new(Vec::new())),
            }
        }
    }

    pub fn resource(resource: T) -> Self {
        ActionResponse::Single(ActionOutcome::Resource(resource))
    }

    pub fn result(result: ActionResult) -> Self {
        ActionResponse::Single(ActionOutcome::Result(result))
    }
}
