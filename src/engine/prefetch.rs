use std::collections::VecDeque;

use anyhow::Result;
use tracing::debug;

use crate::item::Item;
use crate::ports::Source;

/// Fetches one batch from `source` and appends it behind `queue`.
///
/// Order is preserved on both sides. An empty batch is not retried; the next
/// advance below the low-water mark will ask again.
pub async fn prefetch<S>(source: &S, mut queue: VecDeque<Item>) -> Result<VecDeque<Item>>
where
    S: Source + ?Sized,
{
    let fetched = source.fetch_items().await?;
    debug!(queued = queue.len(), fetched = fetched.len(), "prefetched batch");
    queue.extend(fetched);
    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Batch {
        items: Vec<Item>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Source for Batch {
        async fn fetch_items(&self) -> Result<Vec<Item>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    fn item(id: &str) -> Item {
        Item::new(id, format!("/photos/{id}.jpg"), "Alice", "https://example.com/@alice")
            .expect("valid item")
    }

    fn ids(queue: &VecDeque<Item>) -> Vec<&str> {
        queue.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn fills_an_empty_queue() {
        let source = Batch {
            items: vec![item("1"), item("2")],
            calls: AtomicUsize::new(0),
        };
        let queue = prefetch(&source, VecDeque::new()).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ids(&queue), ["1", "2"]);
    }

    #[tokio::test]
    async fn appends_behind_existing_items() {
        let source = Batch {
            items: vec![item("new")],
            calls: AtomicUsize::new(0),
        };
        let queue = prefetch(&source, VecDeque::from([item("existing")]))
            .await
            .unwrap();
        assert_eq!(ids(&queue), ["existing", "new"]);
    }

    #[tokio::test]
    async fn empty_batch_leaves_queue_alone() {
        let source = Batch {
            items: Vec::new(),
            calls: AtomicUsize::new(0),
        };
        let queue = prefetch(&source, VecDeque::from([item("a"), item("b")]))
            .await
            .unwrap();
        assert_eq!(ids(&queue), ["a", "b"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
