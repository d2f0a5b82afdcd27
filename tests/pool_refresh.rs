use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use photo_rotator::item::Item;
use photo_rotator::ports::Pool;
use photo_rotator::tasks::refresh;
use tokio_util::sync::CancellationToken;

const EVERY: Duration = Duration::from_millis(10);

/// Pool whose first refresh fails and later ones each store one photo.
struct FlakyPool {
    calls: AtomicUsize,
}

impl FlakyPool {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pool for FlakyPool {
    async fn stored_items(&self) -> Result<Vec<Item>> {
        Ok(Vec::new())
    }

    async fn fetch_and_store(&self) -> Result<Vec<Item>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            return Err(anyhow!("disk unavailable"));
        }
        Ok(vec![Item::new(
            format!("p{n}"),
            format!("/photos/p{n}.jpg"),
            "Someone",
            "https://example.com",
        )?])
    }
}

async fn wait_for_calls(pool: &FlakyPool, at_least: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while pool.calls() < at_least {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {at_least} refreshes, saw {}", pool.calls()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_refresh_runs_immediately() {
    let pool = Arc::new(FlakyPool::new());
    let cancel = CancellationToken::new();
    // Far longer than the wait below, so only the immediate tick can count.
    let handle = tokio::spawn(refresh::run(
        Arc::clone(&pool),
        cancel.clone(),
        Duration::from_secs(3600),
    ));

    wait_for_calls(&pool, 1).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(pool.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn keeps_refreshing_after_a_failure() {
    let pool = Arc::new(FlakyPool::new());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(refresh::run(Arc::clone(&pool), cancel.clone(), EVERY));

    wait_for_calls(&pool, 3).await;
    assert!(!handle.is_finished());

    cancel.cancel();
    let res = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("refresh task did not stop on cancel")
        .unwrap();
    assert!(res.is_ok());
}

#[tokio::test]
async fn exits_on_cancel_before_first_tick() {
    let pool = Arc::new(FlakyPool::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    refresh::run(Arc::clone(&pool), cancel, EVERY).await.unwrap();
}
