use std::collections::VecDeque;
use std::sync::Arc;

use crate::item::Item;
use crate::store::{Store, Subscription};

/// Production slide length in seconds (five minutes).
pub const DEFAULT_SLIDE_SECONDS: i64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct SlideshowState {
    pub current: Option<Item>,
    /// Items not yet shown, in arrival order. Never contains `current`.
    pub queue: VecDeque<Item>,
    pub paused: bool,
    /// Seconds until the next advance. The driver reacts at zero; ticking is
    /// not clamped.
    pub countdown: i64,
}

impl SlideshowState {
    fn initial(slide_seconds: i64) -> Self {
        Self {
            current: None,
            queue: VecDeque::new(),
            paused: false,
            countdown: slide_seconds,
        }
    }
}

/// Observable slideshow state, mutated by the session driver.
#[derive(Clone)]
pub struct SlideshowStore {
    store: Store<SlideshowState>,
    slide_seconds: i64,
}

impl SlideshowStore {
    pub fn new(slide_seconds: i64) -> Self {
        Self {
            store: Store::new(SlideshowState::initial(slide_seconds)),
            slide_seconds,
        }
    }

    pub fn slide_seconds(&self) -> i64 {
        self.slide_seconds
    }

    pub fn snapshot(&self) -> Arc<SlideshowState> {
        self.store.get()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SlideshowState) + Send + Sync + 'static,
    {
        self.store.subscribe(observer)
    }

    pub fn set_current(&self, item: Item) {
        self.store.update(|s| SlideshowState {
            current: Some(item),
            ..s.clone()
        });
    }

    pub fn set_queue(&self, queue: VecDeque<Item>) {
        self.store.update(|s| SlideshowState {
            queue,
            ..s.clone()
        });
    }

    pub fn toggle_paused(&self) {
        self.store.update(|s| SlideshowState {
            paused: !s.paused,
            ..s.clone()
        });
    }

    pub fn tick_countdown(&self) {
        self.store.update(|s| SlideshowState {
            countdown: s.countdown - 1,
            ..s.clone()
        });
    }

    pub fn reset_countdown(&self) {
        let countdown = self.slide_seconds;
        self.store.update(|s| SlideshowState {
            countdown,
            ..s.clone()
        });
    }

    /// Publishes a completed advance as a single snapshot: new current, new
    /// queue and a fresh countdown.
    pub fn commit(&self, current: Item, queue: VecDeque<Item>) {
        let countdown = self.slide_seconds;
        self.store.update(|s| SlideshowState {
            current: Some(current),
            queue,
            paused: s.paused,
            countdown,
        });
    }

    pub fn reset(&self) {
        self.store.set(SlideshowState::initial(self.slide_seconds));
    }
}

impl Default for SlideshowStore {
    fn default() -> Self {
        Self::new(DEFAULT_SLIDE_SECONDS)
    }
}
