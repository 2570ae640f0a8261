//! Synchronization core for a todo list backed by a remote catalog and a
//! path-addressed synchronized store.
//!
//! # Overview
//! On first run the list is pulled from the remote HTTP catalog and seeded
//! into the store at path `todos`; every later read and mutation goes
//! through the store. [`TodoCoordinator`] orchestrates that flow and
//! publishes `Idle | Loading | Success | Error` states (plus a deleted-index
//! event) through watch channels; [`TodoScreen`] pumps those publications
//! into a [`ListPresenter`] and carries user intents the other way.
//!
//! # Design
//! - All collaborators are injected through constructors; the seams are the
//!   [`RemoteCatalog`] and [`SyncStore`] traits, with [`HttpCatalog`] and
//!   [`MemoryStore`] as the shipped implementations.
//! - Operations publish outcomes instead of returning them; concurrent
//!   invocations race and the last completed publication wins.
//! - Every failure becomes an `Error` publication with a readable message;
//!   retry is user-driven, never automatic.

pub mod catalog;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod presenter;
pub mod state;
pub mod store;
pub mod types;

pub use catalog::{HttpCatalog, RemoteCatalog, DEFAULT_BASE_URL};
pub use controller::TodoScreen;
pub use coordinator::TodoCoordinator;
pub use error::SyncError;
pub use presenter::ListPresenter;
pub use state::Resource;
pub use store::{MemoryStore, SyncStore};
pub use types::{Todo, TodoPage};
