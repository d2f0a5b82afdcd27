//! Observable state container shared by the slideshow and status stores.
//!
//! Every mutation swaps in a fresh immutable snapshot and then calls each live
//! observer synchronously with it. Handles are cheap to clone and all clones
//! see the same state, so a driver task and the presentation layer can each
//! hold one without any global instance.
//!
//! Writes are delivered one at a time: observers see snapshots in the order
//! they were committed even with several writers. Observers may read the
//! store but must not write to it from inside the callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Registration<S> {
    id: u64,
    active: Arc<AtomicBool>,
    observer: Observer<S>,
}

struct Inner<S> {
    state: Arc<S>,
    observers: Vec<Registration<S>>,
    next_id: u64,
}

pub struct Store<S> {
    inner: Arc<Mutex<Inner<S>>>,
    // Held across compute and notify so deliveries never interleave.
    delivery: Arc<Mutex<()>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            delivery: Arc::clone(&self.delivery),
        }
    }
}

impl<S: Send + Sync + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: Arc::new(initial),
                observers: Vec::new(),
                next_id: 0,
            })),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> Arc<S> {
        Arc::clone(&self.lock().state)
    }

    /// Registers `observer`, delivering the current state once right away and
    /// then after every mutation until the returned guard is cancelled or dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let observer: Observer<S> = Arc::new(observer);
        let _delivering = self.deliver_lock();
        let active = Arc::new(AtomicBool::new(true));
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.push(Registration {
                id,
                active: Arc::clone(&active),
                observer: Arc::clone(&observer),
            });
            (id, Arc::clone(&inner.state))
        };
        observer(&snapshot);

        let weak = Arc::downgrade(&self.inner);
        let flag = Arc::clone(&active);
        Subscription {
            cancel: Some(Box::new(move || {
                flag.store(false, Ordering::SeqCst);
                if let Some(inner) = weak.upgrade() {
                    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    inner.observers.retain(|r| r.id != id);
                }
            })),
        }
    }

    /// Replaces the state wholesale.
    pub fn set(&self, next: S) {
        self.update(|_| next);
    }

    /// Computes the next snapshot from the current one and notifies observers.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S,
    {
        let _delivering = self.deliver_lock();
        let (snapshot, observers) = {
            let mut inner = self.lock();
            let next = Arc::new(f(&inner.state));
            inner.state = Arc::clone(&next);
            let observers: Vec<(Arc<AtomicBool>, Observer<S>)> = inner
                .observers
                .iter()
                .map(|r| (Arc::clone(&r.active), Arc::clone(&r.observer)))
                .collect();
            (next, observers)
        };
        // State lock released so observers may read the store.
        for (active, observer) in observers {
            if active.load(Ordering::SeqCst) {
                observer(&snapshot);
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver_lock(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}
