//! Rendering seam between the screen controller and whatever draws the list.

use crate::types::Todo;

/// Receives list changes and user-facing signals from the screen
/// controller. Implementations are expected to be cheap; calls arrive on
/// the controller's observation context.
pub trait ListPresenter: Send + Sync {
    /// The full list was (re)published.
    fn list_changed(&self, todos: &[Todo]);

    /// The entry at `index` was deleted; the position can be dropped
    /// without waiting for the next full list.
    fn item_removed(&self, index: usize);

    /// A long-running load started (`true`) or finished (`false`).
    fn loading(&self, active: bool);

    /// A transient, user-visible message.
    fn notice(&self, message: &str);
}

impl<P: ListPresenter + ?Sized> ListPresenter for std::sync::Arc<P> {
    fn list_changed(&self, todos: &[Todo]) {
        (**self).list_changed(todos);
    }

    fn item_removed(&self, index: usize) {
        (**self).item_removed(index);
    }

    fn loading(&self, active: bool) {
        (**self).loading(active);
    }

    fn notice(&self, message: &str) {
        (**self).notice(message);
    }
}
