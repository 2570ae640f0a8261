//! Published list state.

/// State of an asynchronously loaded value, published through a watch
/// channel. `Idle` is the initial value before anything has been requested;
/// `Loading` is only published while the remote catalog is being consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Resource<T> {
    /// Returns the success payload, if this is a `Success`.
    pub fn as_success(&self) -> Option<&T> {
        match self {
            Resource::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }
}
