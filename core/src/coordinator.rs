//! Orchestration between the remote catalog, the synchronized store and the
//! published list state.
//!
//! # Design
//! Every operation is fire-and-forget from the caller's point of view: the
//! outcome is delivered through two watch channels (the list state and the
//! last deleted index), never as a return value. Concurrent invocations are
//! not de-duplicated; whichever publication completes last wins. Every
//! catalog or store failure is caught where it occurs and converted into an
//! `Error` publication, so nothing here can take the process down.
//!
//! Update and delete address entries by their position in the last
//! published list, under path `todos/todos/<index>`. The position is not a
//! stable identifier: a refetch racing with the user action can retarget
//! the mutation. That fragility is part of the documented contract.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::catalog::RemoteCatalog;
use crate::error::SyncError;
use crate::state::Resource;
use crate::store::SyncStore;
use crate::types::{Todo, TodoPage};

/// Store path holding the full list snapshot.
const TODOS_PATH: &str = "todos";

/// Owner tags are sampled uniformly from this inclusive upper bound.
const OWNER_TAG_MAX: u32 = 1000;

fn entry_path(index: usize) -> String {
    format!("{TODOS_PATH}/todos/{index}")
}

/// Coordinates list reads and mutations, publishing results through watch
/// channels.
pub struct TodoCoordinator {
    catalog: Arc<dyn RemoteCatalog>,
    store: Arc<dyn SyncStore>,
    todos_tx: watch::Sender<Resource<TodoPage>>,
    deleted_tx: watch::Sender<Option<usize>>,
}

impl TodoCoordinator {
    pub fn new(catalog: Arc<dyn RemoteCatalog>, store: Arc<dyn SyncStore>) -> Self {
        let (todos_tx, _) = watch::channel(Resource::Idle);
        let (deleted_tx, _) = watch::channel(None);
        Self {
            catalog,
            store,
            todos_tx,
            deleted_tx,
        }
    }

    /// Subscribes to the published list state.
    pub fn todos(&self) -> watch::Receiver<Resource<TodoPage>> {
        self.todos_tx.subscribe()
    }

    /// Subscribes to the last deleted index, letting a presenter drop that
    /// position without waiting for the full refetch.
    pub fn deleted_index(&self) -> watch::Receiver<Option<usize>> {
        self.deleted_tx.subscribe()
    }

    /// Reads the list from the store and publishes it. On first run (no
    /// snapshot at `todos`) the remote catalog is consulted and its full
    /// response seeded into the store before publication.
    pub async fn request_list(&self) {
        match self.store.read(TODOS_PATH).await {
            Ok(Some(snapshot)) => match TodoPage::from_snapshot(&snapshot) {
                Ok(page) => {
                    debug!(count = page.todos.len(), "list loaded from store");
                    self.todos_tx.send_replace(Resource::Success(page));
                }
                Err(e) => self.publish_error(SyncError::StoreRead(e.to_string())),
            },
            Ok(None) => self.seed_from_catalog().await,
            Err(e) => self.publish_error(e),
        }
    }

    async fn seed_from_catalog(&self) {
        self.todos_tx.send_replace(Resource::Loading);

        let page = match self.catalog.fetch_todos().await {
            Ok(page) => page,
            Err(e) => return self.publish_error(e),
        };
        let value = match serde_json::to_value(&page) {
            Ok(value) => value,
            Err(e) => return self.publish_error(SyncError::StoreWrite(e.to_string())),
        };
        match self.store.write(TODOS_PATH, value).await {
            Ok(()) => {
                debug!(count = page.todos.len(), "store seeded from remote catalog");
                self.todos_tx.send_replace(Resource::Success(page));
            }
            Err(e) => self.publish_error(e),
        }
    }

    /// Creates a todo with the next sequential id and a fresh owner tag,
    /// writes it at `todos/<id>`, then republishes the merged list.
    ///
    /// The read-then-write here is not atomic: two concurrent calls against
    /// the same snapshot may compute the same id and overwrite each other.
    /// The store offers no transaction to close that window.
    pub async fn add_todo(&self, title: &str) {
        let existing = match self.store.read(TODOS_PATH).await {
            Ok(Some(snapshot)) => match TodoPage::from_snapshot(&snapshot) {
                Ok(page) => page.todos,
                Err(e) => return self.publish_error(SyncError::StoreRead(e.to_string())),
            },
            Ok(None) => Vec::new(),
            Err(e) => return self.publish_error(e),
        };

        let new_id = existing.iter().map(|t| t.id).max().map_or(0, |max| max + 1);
        let todo = Todo {
            id: new_id,
            title: title.to_string(),
            completed: false,
            owner_tag: Self::unique_owner_tag(&existing),
        };

        let value = match serde_json::to_value(&todo) {
            Ok(value) => value,
            Err(e) => return self.publish_error(SyncError::StoreWrite(e.to_string())),
        };
        match self.store.write(&format!("{TODOS_PATH}/{new_id}"), value).await {
            Ok(()) => {
                debug!(id = new_id, "todo added");
                self.request_list().await;
            }
            Err(e) => self.publish_error(e),
        }
    }

    /// Writes `updated` over the entry at `index` in the last published
    /// list, then republishes. No timeout is enforced at this layer; the
    /// write inherits the store transport's.
    pub async fn update_todo(&self, index: usize, updated: Todo) {
        let value = match serde_json::to_value(&updated) {
            Ok(value) => value,
            Err(e) => return self.publish_error(SyncError::StoreWrite(e.to_string())),
        };
        match self.store.write(&entry_path(index), value).await {
            Ok(()) => {
                debug!(index, "todo updated");
                self.request_list().await;
            }
            Err(e) => self.publish_error(e),
        }
    }

    /// Deletes the entry at `index` in the last published list, publishes
    /// the index on the deleted-index channel, then republishes the list.
    pub async fn delete_todo(&self, index: usize) {
        match self.store.delete(&entry_path(index)).await {
            Ok(()) => {
                debug!(index, "todo deleted");
                self.deleted_tx.send_replace(Some(index));
                self.request_list().await;
            }
            Err(e) => self.publish_error(e),
        }
    }

    fn publish_error(&self, e: SyncError) {
        error!(%e, "publishing error state");
        self.todos_tx.send_replace(Resource::Error(e.to_string()));
    }

    /// Samples tags in `[0, OWNER_TAG_MAX]` until one not already taken
    /// turns up.
    fn unique_owner_tag(existing: &[Todo]) -> u32 {
        let taken: std::collections::HashSet<u32> =
            existing.iter().map(|t| t.owner_tag).collect();
        let mut rng = rand::thread_rng();
        loop {
            let tag = rng.gen_range(0..=OWNER_TAG_MAX);
            if !taken.contains(&tag) {
                return tag;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::{oneshot, Mutex};

    fn sample_page() -> TodoPage {
        TodoPage {
            limit: 2,
            skip: 0,
            total: 2,
            todos: vec![
                Todo {
                    id: 1,
                    title: "A".to_string(),
                    completed: false,
                    owner_tag: 5,
                },
                Todo {
                    id: 2,
                    title: "B".to_string(),
                    completed: false,
                    owner_tag: 6,
                },
            ],
        }
    }

    struct StubCatalog {
        page: TodoPage,
    }

    #[async_trait]
    impl RemoteCatalog for StubCatalog {
        async fn fetch_todos(&self) -> Result<TodoPage, SyncError> {
            Ok(self.page.clone())
        }

        async fn push_todo(&self, _id: i64, todo: &Todo) -> Result<Todo, SyncError> {
            Ok(todo.clone())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl RemoteCatalog for FailingCatalog {
        async fn fetch_todos(&self) -> Result<TodoPage, SyncError> {
            Err(SyncError::Network("connection refused".to_string()))
        }

        async fn push_todo(&self, _id: i64, _todo: &Todo) -> Result<Todo, SyncError> {
            Err(SyncError::Network("connection refused".to_string()))
        }
    }

    /// Catalog whose fetch blocks until the test releases it, so the
    /// intermediate `Loading` publication can be observed.
    struct GatedCatalog {
        page: TodoPage,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl RemoteCatalog for GatedCatalog {
        async fn fetch_todos(&self) -> Result<TodoPage, SyncError> {
            if let Some(gate) = self.gate.lock().await.take() {
                let _ = gate.await;
            }
            Ok(self.page.clone())
        }

        async fn push_todo(&self, _id: i64, todo: &Todo) -> Result<Todo, SyncError> {
            Ok(todo.clone())
        }
    }

    /// Store that fails every operation, for exercising the error paths.
    struct FailingStore;

    #[async_trait]
    impl SyncStore for FailingStore {
        async fn read(&self, _path: &str) -> Result<Option<Value>, SyncError> {
            Err(SyncError::StoreRead("permission denied".to_string()))
        }

        async fn write(&self, _path: &str, _value: Value) -> Result<(), SyncError> {
            Err(SyncError::StoreWrite("permission denied".to_string()))
        }

        async fn delete(&self, _path: &str) -> Result<(), SyncError> {
            Err(SyncError::StoreDelete("permission denied".to_string()))
        }
    }

    fn coordinator_with(
        catalog: Arc<dyn RemoteCatalog>,
        store: Arc<dyn SyncStore>,
    ) -> TodoCoordinator {
        TodoCoordinator::new(catalog, store)
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .write(TODOS_PATH, serde_json::to_value(sample_page()).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn empty_store_fetches_from_catalog_and_seeds() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator_with(
            Arc::new(StubCatalog {
                page: sample_page(),
            }),
            store.clone(),
        );

        coordinator.request_list().await;

        let state = coordinator.todos().borrow().clone();
        let page = state.as_success().expect("expected success").clone();
        assert_eq!(page.todos.len(), 2);

        // The store now holds the exact response.
        let seeded = store.read(TODOS_PATH).await.unwrap().unwrap();
        assert_eq!(seeded, serde_json::to_value(sample_page()).unwrap());
    }

    #[tokio::test]
    async fn loading_is_published_while_the_catalog_is_consulted() {
        let (release, gate) = oneshot::channel();
        let coordinator = Arc::new(coordinator_with(
            Arc::new(GatedCatalog {
                page: sample_page(),
                gate: Mutex::new(Some(gate)),
            }),
            Arc::new(MemoryStore::new()),
        ));
        let mut rx = coordinator.todos();

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.request_list().await }
        });

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_loading());

        release.send(()).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().as_success().is_some());
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn seeded_store_is_read_without_touching_the_catalog() {
        // A failing catalog proves the remote is never consulted.
        let coordinator = coordinator_with(Arc::new(FailingCatalog), seeded_store().await);

        coordinator.request_list().await;

        let state = coordinator.todos().borrow().clone();
        assert_eq!(state.as_success().map(|p| p.todos.len()), Some(2));
    }

    #[tokio::test]
    async fn catalog_failure_publishes_error() {
        let coordinator =
            coordinator_with(Arc::new(FailingCatalog), Arc::new(MemoryStore::new()));

        coordinator.request_list().await;

        let state = coordinator.todos().borrow().clone();
        match state {
            Resource::Error(message) => assert!(message.contains("network request failed")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_read_failure_publishes_error() {
        let coordinator = coordinator_with(
            Arc::new(StubCatalog {
                page: sample_page(),
            }),
            Arc::new(FailingStore),
        );

        coordinator.request_list().await;

        let state = coordinator.todos().borrow().clone();
        match state {
            Resource::Error(message) => assert!(message.contains("store read failed")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_snapshot_publishes_error() {
        let store = Arc::new(MemoryStore::new());
        store.write(TODOS_PATH, json!("not a list")).await.unwrap();
        let coordinator = coordinator_with(Arc::new(FailingCatalog), store);

        coordinator.request_list().await;

        let state = coordinator.todos().borrow().clone();
        match state {
            Resource::Error(message) => assert!(message.contains("store read failed")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_assigns_sequential_ids_and_fresh_tags() {
        let store = seeded_store().await;
        let coordinator = coordinator_with(Arc::new(FailingCatalog), store.clone());

        coordinator.add_todo("C").await;

        let written = store.read("todos/3").await.unwrap().unwrap();
        assert_eq!(written["id"], 3);
        assert_eq!(written["todo"], "C");
        assert_eq!(written["completed"], false);
        let tag = written["userId"].as_u64().unwrap();
        assert!(tag != 5 && tag != 6, "tag {tag} collides with the snapshot");

        let state = coordinator.todos().borrow().clone();
        let page = state.as_success().expect("expected success").clone();
        assert_eq!(page.todos.len(), 3);
        assert_eq!(page.todos[2].id, 3);

        // The next add sees the merged snapshot and continues the sequence.
        coordinator.add_todo("D").await;
        let written = store.read("todos/4").await.unwrap().unwrap();
        assert_eq!(written["id"], 4);
    }

    #[tokio::test]
    async fn add_on_an_empty_store_starts_at_zero() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator_with(Arc::new(FailingCatalog), store.clone());

        coordinator.add_todo("First").await;

        let written = store.read("todos/0").await.unwrap().unwrap();
        assert_eq!(written["id"], 0);

        let state = coordinator.todos().borrow().clone();
        assert_eq!(state.as_success().map(|p| p.todos.len()), Some(1));
    }

    #[tokio::test]
    async fn add_against_a_failing_store_publishes_error_and_writes_nothing() {
        let coordinator = coordinator_with(
            Arc::new(StubCatalog {
                page: sample_page(),
            }),
            Arc::new(FailingStore),
        );

        coordinator.add_todo("C").await;

        let state = coordinator.todos().borrow().clone();
        match state {
            Resource::Error(message) => assert!(message.contains("store read failed")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_rewrites_the_positional_entry_and_refetches() {
        let store = seeded_store().await;
        let coordinator = coordinator_with(Arc::new(FailingCatalog), store.clone());

        let updated = Todo {
            id: 2,
            title: "B updated".to_string(),
            completed: true,
            owner_tag: 6,
        };
        coordinator.update_todo(1, updated).await;

        let entry = store.read("todos/todos/1").await.unwrap().unwrap();
        assert_eq!(entry["todo"], "B updated");
        assert_eq!(entry["completed"], true);

        let state = coordinator.todos().borrow().clone();
        let page = state.as_success().expect("expected success").clone();
        assert_eq!(page.todos[1].title, "B updated");
    }

    #[tokio::test]
    async fn delete_publishes_the_index_and_drops_the_entry() {
        let store = seeded_store().await;
        let coordinator = coordinator_with(Arc::new(FailingCatalog), store);

        coordinator.delete_todo(0).await;

        assert_eq!(*coordinator.deleted_index().borrow(), Some(0));
        let state = coordinator.todos().borrow().clone();
        let page = state.as_success().expect("expected success").clone();
        assert_eq!(page.todos.len(), 1);
        assert!(page.todos.iter().all(|t| t.title != "A"));
    }

    #[tokio::test]
    async fn delete_failure_publishes_error() {
        let coordinator = coordinator_with(Arc::new(FailingCatalog), Arc::new(FailingStore));

        coordinator.delete_todo(0).await;

        assert_eq!(*coordinator.deleted_index().borrow(), None);
        let state = coordinator.todos().borrow().clone();
        match state {
            Resource::Error(message) => assert!(message.contains("store delete failed")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[test]
    fn owner_tag_avoids_every_taken_value() {
        // Leave a single free tag and insist the sampler finds it.
        let mut existing: Vec<Todo> = (0..=OWNER_TAG_MAX)
            .filter(|tag| *tag != 37)
            .map(|tag| Todo {
                id: i64::from(tag),
                title: "x".to_string(),
                completed: false,
                owner_tag: tag,
            })
            .collect();
        existing.push(Todo {
            id: 9999,
            title: "remote".to_string(),
            completed: false,
            owner_tag: 4242,
        });

        assert_eq!(TodoCoordinator::unique_owner_tag(&existing), 37);
    }
}
