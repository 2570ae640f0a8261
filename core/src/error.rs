//! Error types for the synchronization core.
//!
//! # Design
//! One variant per failure origin — the remote catalog and each store
//! operation — carrying only a human-readable message, because the only
//! consumer is the published `Error` state shown to the user. Callers that
//! need to react differently to "does not exist" never see these: an absent
//! store path is `Ok(None)`, not an error.

use thiserror::Error;

/// Failures surfaced by the coordinator, the catalog client and the store.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The remote catalog was unreachable or returned a non-2xx status.
    #[error("network request failed: {0}")]
    Network(String),

    /// A store read failed, or a stored snapshot could not be parsed.
    #[error("store read failed: {0}")]
    StoreRead(String),

    /// A store write was not acknowledged.
    #[error("store write failed: {0}")]
    StoreWrite(String),

    /// A store delete was not acknowledged.
    #[error("store delete failed: {0}")]
    StoreDelete(String),
}
