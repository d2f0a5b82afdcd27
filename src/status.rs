use std::sync::Arc;

use crate::item::Status;
use crate::store::{Store, Subscription};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusState {
    pub status: Option<Status>,
    pub overlay_visible: bool,
}

/// Observable companion status, fed by the status poller.
#[derive(Clone)]
pub struct StatusStore {
    store: Store<StatusState>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self {
            store: Store::new(StatusState::default()),
        }
    }

    pub fn snapshot(&self) -> Arc<StatusState> {
        self.store.get()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&StatusState) + Send + Sync + 'static,
    {
        self.store.subscribe(observer)
    }

    pub fn set_status(&self, status: Option<Status>) {
        self.store.update(|s| StatusState {
            status,
            overlay_visible: s.overlay_visible,
        });
    }

    pub fn toggle_overlay(&self) {
        self.store.update(|s| StatusState {
            overlay_visible: !s.overlay_visible,
            ..s.clone()
        });
    }

    pub fn show_overlay(&self) {
        self.store.update(|s| StatusState {
            overlay_visible: true,
            ..s.clone()
        });
    }

    pub fn hide_overlay(&self) {
        self.store.update(|s| StatusState {
            overlay_visible: false,
            ..s.clone()
        });
    }

    pub fn reset(&self) {
        self.store.set(StatusState::default());
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::PlaybackState;

    fn playing() -> Status {
        Status {
            title: "Test Song".into(),
            subtitle: "Test Artist".into(),
            state: PlaybackState::Active,
        }
    }

    #[test]
    fn defaults_to_no_status_and_hidden_overlay() {
        let store = StatusStore::new();
        let state = store.snapshot();
        assert!(state.status.is_none());
        assert!(!state.overlay_visible);
    }

    #[test]
    fn set_and_clear_status() {
        let store = StatusStore::new();
        store.set_status(Some(playing()));
        assert_eq!(store.snapshot().status, Some(playing()));
        store.set_status(None);
        assert!(store.snapshot().status.is_none());
    }

    #[test]
    fn overlay_toggle_show_hide() {
        let store = StatusStore::new();
        store.toggle_overlay();
        assert!(store.snapshot().overlay_visible);
        store.toggle_overlay();
        assert!(!store.snapshot().overlay_visible);
        store.show_overlay();
        store.show_overlay();
        assert!(store.snapshot().overlay_visible);
        store.hide_overlay();
        assert!(!store.snapshot().overlay_visible);
    }

    #[test]
    fn setting_status_keeps_overlay() {
        let store = StatusStore::new();
        store.show_overlay();
        store.set_status(Some(playing()));
        assert!(store.snapshot().overlay_visible);
    }

    #[test]
    fn reset_clears_everything() {
        let store = StatusStore::new();
        store.set_status(Some(playing()));
        store.show_overlay();
        store.reset();
        assert_eq!(*store.snapshot(), StatusState::default());
    }
}
