//! Screen controller: connects user intents, connectivity changes and the
//! coordinator's published state to a [`ListPresenter`].
//!
//! # Design
//! The controller owns its coordinator and presenter; both arrive through
//! the constructor, never through an ambient registry. Input validation
//! that belongs to the UI boundary (empty titles) happens here so the data
//! layer never sees it. Published state is pumped to the presenter either
//! continuously (`run`) or on demand (`render_latest`), whichever fits the
//! host's event loop.

use std::sync::Arc;

use tokio::sync::watch;

use crate::coordinator::TodoCoordinator;
use crate::presenter::ListPresenter;
use crate::state::Resource;
use crate::types::{Todo, TodoPage};

const OFFLINE_NOTICE: &str = "Please connect to the internet";
const EMPTY_ADD_NOTICE: &str = "Todo cannot be empty";
const EMPTY_UPDATE_NOTICE: &str = "Title cannot be empty";

/// The single todo screen.
pub struct TodoScreen<P: ListPresenter> {
    coordinator: Arc<TodoCoordinator>,
    presenter: P,
    todos_rx: watch::Receiver<Resource<TodoPage>>,
    deleted_rx: watch::Receiver<Option<usize>>,
}

impl<P: ListPresenter> TodoScreen<P> {
    pub fn new(coordinator: Arc<TodoCoordinator>, presenter: P) -> Self {
        let todos_rx = coordinator.todos();
        let deleted_rx = coordinator.deleted_index();
        Self {
            coordinator,
            presenter,
            todos_rx,
            deleted_rx,
        }
    }

    /// Connectivity callback: a (re)connect triggers a list request, going
    /// offline surfaces a notice. Called once with the initial state and on
    /// every change after that.
    pub async fn network_changed(&self, online: bool) {
        if online {
            self.coordinator.request_list().await;
        } else {
            self.presenter.notice(OFFLINE_NOTICE);
        }
    }

    /// User-driven retry (pull-to-refresh).
    pub async fn refresh(&self) {
        self.coordinator.request_list().await;
    }

    /// Add-dialog confirmation. Blank input never reaches the coordinator.
    pub async fn add_submitted(&self, input: &str) {
        let title = input.trim();
        if title.is_empty() {
            self.presenter.notice(EMPTY_ADD_NOTICE);
            return;
        }
        self.coordinator.add_todo(title).await;
    }

    /// Update-dialog confirmation for the entry at `index`.
    pub async fn update_submitted(&self, index: usize, mut todo: Todo, input: &str) {
        let title = input.trim();
        if title.is_empty() {
            self.presenter.notice(EMPTY_UPDATE_NOTICE);
            return;
        }
        todo.title = title.to_string();
        self.coordinator.update_todo(index, todo).await;
    }

    /// Delete tapped on the entry at `index`.
    pub async fn delete_tapped(&self, index: usize) {
        self.coordinator.delete_todo(index).await;
    }

    /// Forwards any yet-unseen publications to the presenter and returns.
    pub fn render_latest(&mut self) {
        if self.deleted_rx.has_changed().unwrap_or(false) {
            if let Some(index) = *self.deleted_rx.borrow_and_update() {
                self.presenter.item_removed(index);
            }
        }
        if self.todos_rx.has_changed().unwrap_or(false) {
            let state = self.todos_rx.borrow_and_update().clone();
            self.apply(&state);
        }
    }

    /// Pumps publications to the presenter until the coordinator goes away.
    pub async fn run(&mut self) {
        loop {
            tokio::select! {
                changed = self.deleted_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if let Some(index) = *self.deleted_rx.borrow_and_update() {
                        self.presenter.item_removed(index);
                    }
                }
                changed = self.todos_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let state = self.todos_rx.borrow_and_update().clone();
                    self.apply(&state);
                }
            }
        }
    }

    fn apply(&self, state: &Resource<TodoPage>) {
        match state {
            Resource::Idle => {}
            Resource::Loading => self.presenter.loading(true),
            Resource::Success(page) => {
                self.presenter.loading(false);
                self.presenter.list_changed(&page.todos);
            }
            Resource::Error(message) => {
                self.presenter.loading(false);
                self.presenter.notice(message);
            }
        }
    }
}
