//! In-process mock of the remote todo catalog.
//!
//! Serves the catalog's two-endpoint contract: `GET /todos` returns the
//! full page object and `PUT /todos/{id}` applies the body to the todo with
//! that id and echoes it. DTOs are defined independently of the core crate;
//! the core's integration tests catch any schema drift.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    #[serde(rename = "todo")]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId")]
    pub user_id: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoPage {
    pub limit: i64,
    pub skip: i64,
    pub total: i64,
    pub todos: Vec<Todo>,
}

pub type Db = Arc<RwLock<Vec<Todo>>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(seed: Vec<Todo>) -> Router {
    let db: Db = Arc::new(RwLock::new(seed));
    Router::new()
        .route("/todos", get(list_todos))
        .route("/todos/{id}", put(update_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Vec::new()).await
}

pub async fn run_with(listener: TcpListener, seed: Vec<Todo>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(seed)).await
}

async fn list_todos(State(db): State<Db>) -> Json<TodoPage> {
    let todos = db.read().await.clone();
    let total = todos.len() as i64;
    Json(TodoPage {
        limit: total,
        skip: 0,
        total,
        todos,
    })
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<Todo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut todos = db.write().await;
    let todo = todos.iter_mut().find(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
    todo.title = input.title;
    todo.completed = input.completed;
    todo.user_id = input.user_id;
    Ok(Json(todo.clone()))
}
