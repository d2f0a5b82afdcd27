use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use photo_rotator::engine::advance::{LOW_WATER_MARK, advance};
use photo_rotator::engine::prefetch::prefetch;
use photo_rotator::error::EngineError;
use photo_rotator::item::Item;
use photo_rotator::ports::Source;

fn photo(id: &str) -> Item {
    Item::new(
        id,
        format!("https://images.example.com/photo-{id}"),
        format!("Photographer {id}"),
        format!("https://example.com/@p{id}"),
    )
    .expect("valid item")
}

fn queue_of(ids: &[&str]) -> VecDeque<Item> {
    ids.iter().map(|id| photo(id)).collect()
}

fn ids(queue: &VecDeque<Item>) -> Vec<&str> {
    queue.iter().map(|p| p.id.as_str()).collect()
}

struct ScriptedSource {
    batch: Vec<Item>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn returning(ids: &[&str]) -> Self {
        Self {
            batch: ids.iter().map(|id| photo(id)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for ScriptedSource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.batch.clone())
    }
}

struct BrokenSource {
    calls: Mutex<usize>,
}

#[async_trait]
impl Source for BrokenSource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        *self.calls.lock().unwrap() += 1;
        Err(anyhow!("source offline"))
    }
}

#[tokio::test]
async fn pops_head_and_skips_fetch_at_low_water_mark() {
    let source = ScriptedSource::returning(&["x"]);
    let next = advance(&source, queue_of(&["1", "2", "3", "4"]))
        .await
        .expect("advance");

    assert_eq!(next.current.id, "1");
    assert_eq!(ids(&next.queue), ["2", "3", "4"]);
    assert_eq!(next.queue.len(), LOW_WATER_MARK);
    assert_eq!(source.calls(), 0, "3 left is not below the mark");
}

#[tokio::test]
async fn long_queue_tail_is_returned_unchanged() {
    let source = ScriptedSource::returning(&["x"]);
    let queue = queue_of(&["1", "2", "3", "4", "5", "6"]);
    let tail: VecDeque<Item> = queue.iter().skip(1).cloned().collect();

    let next = advance(&source, queue).await.expect("advance");
    assert_eq!(next.current, photo("1"));
    assert_eq!(next.queue, tail);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn short_queue_is_replenished_once_in_order() {
    let source = ScriptedSource::returning(&["3"]);
    let next = advance(&source, queue_of(&["1", "2"]))
        .await
        .expect("advance");

    assert_eq!(next.current.id, "1");
    assert_eq!(ids(&next.queue), ["2", "3"]);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn every_short_length_triggers_exactly_one_fetch() {
    for len in 1..=LOW_WATER_MARK {
        let names: Vec<String> = (0..len).map(|i| format!("q{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let source = ScriptedSource::returning(&["a", "b"]);

        let next = advance(&source, queue_of(&refs)).await.expect("advance");

        let mut expected: Vec<&str> = refs[1..].to_vec();
        expected.extend(["a", "b"]);
        assert_eq!(next.current.id, refs[0]);
        assert_eq!(ids(&next.queue), expected, "queue length {len}");
        assert_eq!(source.calls(), 1, "queue length {len}");
    }
}

#[tokio::test]
async fn single_item_with_empty_fetch_leaves_empty_queue() {
    let source = ScriptedSource::returning(&[]);
    let next = advance(&source, queue_of(&["only"]))
        .await
        .expect("advance");
    assert_eq!(next.current.id, "only");
    assert!(next.queue.is_empty());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn empty_queue_is_a_fault() {
    let source = ScriptedSource::returning(&["x"]);
    let err = advance(&source, VecDeque::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyQueue));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn failed_replenishment_hands_back_current_and_tail() {
    let source = BrokenSource {
        calls: Mutex::new(0),
    };
    let err = advance(&source, queue_of(&["1", "2", "3"]))
        .await
        .unwrap_err();

    match err {
        EngineError::Replenishment {
            current,
            tail,
            cause,
        } => {
            assert_eq!(current.id, "1");
            assert_eq!(ids(&tail), ["2", "3"]);
            assert!(cause.to_string().contains("source offline"));
        }
        other => panic!("expected replenishment failure, got {other:?}"),
    }
    assert_eq!(*source.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn prefetch_keeps_prefix_and_length() {
    let source = ScriptedSource::returning(&["n1", "n2", "n3"]);
    let queue = queue_of(&["a", "b"]);

    let out = prefetch(&source, queue.clone()).await.expect("prefetch");

    assert_eq!(out.len(), queue.len() + 3);
    assert!(out.iter().take(queue.len()).eq(queue.iter()));
    assert_eq!(ids(&out), ["a", "b", "n1", "n2", "n3"]);
}

#[tokio::test]
async fn prefetch_does_not_dedupe() {
    let source = ScriptedSource::returning(&["a"]);
    let out = prefetch(&source, queue_of(&["a"])).await.expect("prefetch");
    assert_eq!(ids(&out), ["a", "a"]);
}

#[tokio::test]
async fn prefetch_failure_propagates() {
    let source = BrokenSource {
        calls: Mutex::new(0),
    };
    let err = prefetch(&source, queue_of(&["a"])).await.unwrap_err();
    assert!(err.to_string().contains("source offline"));
}
