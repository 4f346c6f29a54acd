//! HttpRemote against a fake JSONPlaceholder.
//!
//! Starts an axum server and exercises it through reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use optimistic_cache::{
    Collection, HttpRemote, HttpRemoteConfig, MutationKind, RefetchError, RefetchOutcome,
    RemoteError, Todo,
};
use serde_json::{json, Value};

use crate::support::{init_tracing, todos};

#[derive(Default)]
struct FakeServer {
    todos: Vec<Todo>,
    next_id: i64,
    /// Canned response for the next request, if any.
    fail_next: Option<(StatusCode, String)>,
}

type Shared = Arc<Mutex<FakeServer>>;

fn canned(state: &Shared) -> Option<Response> {
    let (status, body) = state.lock().unwrap().fail_next.take()?;
    Some((status, body).into_response())
}

async fn list(State(state): State<Shared>) -> Response {
    if let Some(response) = canned(&state) {
        return response;
    }
    Json(state.lock().unwrap().todos.clone()).into_response()
}

async fn create(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    if let Some(response) = canned(&state) {
        return response;
    }
    let mut server = state.lock().unwrap();
    body["id"] = json!(server.next_id);
    server.next_id += 1;
    let todo: Todo = serde_json::from_value(body).unwrap();
    server.todos.push(todo.clone());
    (StatusCode::CREATED, Json(todo)).into_response()
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = canned(&state) {
        return response;
    }
    let mut server = state.lock().unwrap();
    let Some(slot) = server.todos.iter_mut().find(|t| t.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut merged = serde_json::to_value(&*slot).unwrap();
    for (field, value) in body.as_object().cloned().unwrap_or_default() {
        merged[field] = value;
    }
    *slot = serde_json::from_value(merged).unwrap();
    Json(slot.clone()).into_response()
}

async fn delete(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    if let Some(response) = canned(&state) {
        return response;
    }
    let mut server = state.lock().unwrap();
    server.todos.retain(|t| t.id != id);
    Json(json!({})).into_response()
}

/// Bind to port 0 and return the base url plus the server state.
async fn start_server(seed: Vec<Todo>) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeServer {
        next_id: seed.len() as i64 + 1,
        todos: seed,
        fail_next: None,
    }));
    let app = Router::new()
        .route("/todos", get(list).post(create))
        .route("/todos/:id", put(update).delete(delete))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn collection(base: &str) -> Collection<Todo, HttpRemote<Todo>> {
    let config = HttpRemoteConfig::new(base).with_timeout(Duration::from_secs(5));
    Collection::new(HttpRemote::new(config).unwrap())
}

fn fail_next(state: &Shared, status: StatusCode, body: &str) {
    state.lock().unwrap().fail_next = Some((status, body.to_string()));
}

#[tokio::test]
async fn refetch_lists_over_http() {
    init_tracing();
    let (base, _state) = start_server(todos(&[(1, "a"), (2, "b")])).await;
    let todos_http = collection(&base);

    let outcome = todos_http.refetch().await.unwrap();

    assert_eq!(outcome, RefetchOutcome::Applied { count: 2 });
    assert_eq!(todos_http.store().get_all().unwrap(), todos(&[(1, "a"), (2, "b")]));
}

#[tokio::test]
async fn create_update_delete_round_trip() {
    let (base, state) = start_server(todos(&[(1, "a")])).await;
    let todos_http = collection(&base);
    todos_http.refetch().await.unwrap();

    let created = todos_http.create(json!({ "title": "x" })).await.unwrap();
    assert_eq!(created.entity, Some(Todo::new(2, "x")));

    todos_http
        .update(&2, json!({ "completed": true }))
        .await
        .unwrap();
    todos_http.delete(&1).await.unwrap();

    let expected = vec![Todo::new(2, "x").completed(true)];
    assert_eq!(todos_http.store().get_all().unwrap(), expected);
    assert_eq!(state.lock().unwrap().todos, expected);
}

#[tokio::test]
async fn server_error_message_is_surfaced_and_rolled_back() {
    let (base, state) = start_server(todos(&[(1, "a")])).await;
    let todos_http = collection(&base);
    todos_http.refetch().await.unwrap();
    fail_next(
        &state,
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"message": "Title too long"}"#,
    );

    let err = todos_http
        .execute(MutationKind::Update, json!({ "id": 1, "title": "y" }))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Title too long");
    assert_eq!(todos_http.store().get_all().unwrap(), todos(&[(1, "a")]));
}

#[tokio::test]
async fn bare_status_uses_default_message() {
    let (base, state) = start_server(todos(&[(1, "a")])).await;
    let todos_http = collection(&base);
    todos_http.refetch().await.unwrap();
    fail_next(&state, StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");

    let err = todos_http.delete(&1).await.unwrap_err();

    assert_eq!(err.message(), "Failed to delete todo");
    assert!(todos_http.store().contains(&1).unwrap());
}

#[tokio::test]
async fn undecodable_list_is_a_remote_error() {
    let (base, state) = start_server(todos(&[(1, "a")])).await;
    let todos_http = collection(&base);
    todos_http.store().upsert(Todo::new(9, "local")).unwrap();
    fail_next(&state, StatusCode::OK, "not json");

    let err = todos_http.refetch().await.unwrap_err();

    assert!(matches!(err, RefetchError::Remote(RemoteError::Decode(_))));
    assert_eq!(todos_http.store().get_all().unwrap(), todos(&[(9, "local")]));
}

#[tokio::test]
async fn unreachable_server_rolls_back_with_default_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let todos_http = collection(&format!("http://{addr}"));

    let err = todos_http.create(json!({ "title": "x" })).await.unwrap_err();

    assert!(matches!(
        err,
        optimistic_cache::MutationError::RolledBack {
            cause: RemoteError::Transport(_),
            ..
        }
    ));
    assert_eq!(err.message(), "Failed to create todo");
    assert!(todos_http.store().is_empty().unwrap());
}
