//! Todo API endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use entities::{CreateTask, Task, UpdateTask};
use task_store::{TaskStore, UpdateOutcome};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Lists all todos.
pub async fn list_todos<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<Vec<Task>>> {
    let tasks = state.store.list_all().await?;
    Ok(Json(tasks))
}

/// Lists open todos due within the next day, including overdue ones.
pub async fn list_due_soon<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<Vec<Task>>> {
    let tasks = state.store.list_due_soon().await?;
    Ok(Json(tasks))
}

/// Creates a todo.
pub async fn create_todo<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<Task>)> {
    let Json(input) = payload?;

    let task = state.store.create(input).await?;

    tracing::info!(todo_id = task.id, "Todo created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Gets a todo by ID.
pub async fn get_todo<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ServerResult<Json<Task>> {
    let Path(id) = path?;

    let task = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("Todo not found: {id}")))?;

    Ok(Json(task))
}

/// Applies a partial update to a todo.
pub async fn update_todo<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> ServerResult<Json<Task>> {
    let Path(id) = path?;
    let Json(patch) = payload?;

    let task = match state.store.update(id, patch).await? {
        UpdateOutcome::Updated(task) => {
            tracing::info!(todo_id = id, "Todo updated");
            task
        }
        UpdateOutcome::Unchanged(task) => {
            tracing::debug!(todo_id = id, "Empty todo update ignored");
            task
        }
    };

    Ok(Json(task))
}

/// Deletes a todo.
pub async fn delete_todo<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ServerResult<StatusCode> {
    let Path(id) = path?;

    if !state.store.delete(id).await? {
        return Err(ServerError::NotFound(format!("Todo not found: {id}")));
    }

    tracing::info!(todo_id = id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, Response},
    };
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use task_store::{
        DEFAULT_STORAGE_KEY, LocalTaskStore, MemoryStorage, SqliteTaskStore, TaskStoreError,
        TaskStoreResult,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, create_app, create_state};

    /// Store whose medium is always unavailable.
    struct FailingStore;

    fn unavailable() -> TaskStoreError {
        TaskStoreError::Io(std::io::Error::other("disk unavailable"))
    }

    #[async_trait]
    impl TaskStore for FailingStore {
        async fn list_all(&self) -> TaskStoreResult<Vec<Task>> {
            Err(unavailable())
        }

        async fn list_due_soon(&self) -> TaskStoreResult<Vec<Task>> {
            Err(unavailable())
        }

        async fn create(&self, _input: CreateTask) -> TaskStoreResult<Task> {
            Err(unavailable())
        }

        async fn update(&self, _id: i64, _patch: UpdateTask) -> TaskStoreResult<UpdateOutcome> {
            Err(unavailable())
        }

        async fn delete(&self, _id: i64) -> TaskStoreResult<bool> {
            Err(unavailable())
        }

        async fn get(&self, _id: i64) -> TaskStoreResult<Option<Task>> {
            Err(unavailable())
        }
    }

    fn test_config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn local_app() -> Router {
        let store = LocalTaskStore::new(MemoryStorage::with_item(DEFAULT_STORAGE_KEY, "[]"));
        create_app(create_state(test_config(), store))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn days_from_today(days: i64) -> String {
        (Utc::now() + Duration::days(days))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let app = local_app();

        let response = send(
            &app,
            "POST",
            "/todos",
            Some(json!({ "title": "A", "due_date": days_from_today(1) })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let a = json_body(response).await;
        assert_eq!(a["completed"], false);
        assert_eq!(a["created_at"], a["updated_at"]);

        let b = json_body(send(&app, "POST", "/todos", Some(json!({ "title": "B" }))).await).await;
        let c = json_body(
            send(
                &app,
                "POST",
                "/todos",
                Some(json!({ "title": "C", "due_date": days_from_today(10) })),
            )
            .await,
        )
        .await;

        let response = send(&app, "GET", "/todos", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let all = json_body(response).await;
        let ids: Vec<&Value> = all.as_array().unwrap().iter().map(|t| &t["id"]).collect();
        assert_eq!(ids, vec![&a["id"], &c["id"], &b["id"]]);

        let due = json_body(send(&app, "GET", "/todos/due-soon", None).await).await;
        let due = due.as_array().unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0]["title"], "A");
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let app = local_app();

        for body in [json!({}), json!({ "title": "" }), json!({ "title": "   " })] {
            let response = send(&app, "POST", "/todos", Some(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let error = json_body(response).await;
            assert_eq!(error["error"]["code"], "invalid_request");
        }

        let all = json_body(send(&app, "GET", "/todos", None).await).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = local_app();

        let response = send(
            &app,
            "POST",
            "/todos",
            Some(json!({ "title": "x", "due_date": "next week" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_get_and_delete() {
        let app = local_app();
        let task = json_body(send(&app, "POST", "/todos", Some(json!({ "title": "x" }))).await).await;
        let uri = format!("/todos/{}", task["id"]);

        let response = send(&app, "PUT", &uri, Some(json!({ "completed": true }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = json_body(response).await;
        assert_eq!(updated["completed"], true);
        assert_ne!(updated["updated_at"], task["updated_at"]);

        let fetched = json_body(send(&app, "GET", &uri, None).await).await;
        assert_eq!(fetched, updated);

        let unchanged = json_body(send(&app, "PUT", &uri, Some(json!({}))).await).await;
        assert_eq!(unchanged, updated);

        let response = send(&app, "PUT", &uri, Some(json!({ "title": "" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let app = local_app();

        for (method, body) in [
            ("GET", None),
            ("PUT", Some(json!({ "completed": true }))),
            ("DELETE", None),
        ] {
            let response = send(&app, method, "/todos/abc", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
            let error = json_body(response).await;
            assert_eq!(error["error"]["code"], "invalid_request");
            assert!(error["error"]["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let app = local_app();

        let response = send(&app, "PUT", "/todos/9999", Some(json!({ "completed": true }))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error = json_body(response).await;
        assert_eq!(error["error"]["code"], "not_found");

        let all = json_body(send(&app, "GET", "/todos", None).await).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn test_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTaskStore::open(&dir.path().join("todos.db"))
            .await
            .unwrap();
        let app = create_app(create_state(test_config(), store));

        let response = send(
            &app,
            "POST",
            "/todos",
            Some(json!({ "title": "Pay rent", "description": "by transfer" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let task = json_body(response).await;
        assert_eq!(task["description"], "by transfer");
        assert!(task["due_date"].is_null());

        let all = json_body(send(&app, "GET", "/todos", None).await).await;
        assert_eq!(all, json!([task]));
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let app = create_app(create_state(test_config(), FailingStore));

        for (method, uri, body) in [
            ("GET", "/todos", None),
            ("GET", "/todos/due-soon", None),
            ("POST", "/todos", Some(json!({ "title": "x" }))),
            ("PUT", "/todos/1", Some(json!({ "completed": true }))),
            ("DELETE", "/todos/1", None),
        ] {
            let response = send(&app, method, uri, body).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let error = json_body(response).await;
            assert_eq!(error["error"]["code"], "internal_error");
            assert_eq!(error["error"]["message"], "Internal server error");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(&local_app(), "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
