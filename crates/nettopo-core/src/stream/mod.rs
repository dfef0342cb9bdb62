// ── Reactive entity streams ──
//
// Subscription handles over the store's published snapshots.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub use filter::{ConnectionFilter, NodeFilter};

/// A subscription to one entity collection.
///
/// Gives point-in-time access plus change notification, either through
/// [`changed`](Self::changed) or by converting into a `Stream`. Every
/// snapshot it yields is a fully published state: a cascade or a batch
/// never shows up half-applied.
pub struct EntityStream<T: Clone + Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct EntityWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for EntityWatchStream<T> {
    type Item = Arc<Vec<Arc<T>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Arc<Vec<Arc<T>>> is Unpin, so the WatchStream is too.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use crate::model::{Node, NodeType};
    use crate::store::TopologyStore;

    #[tokio::test]
    async fn changed_yields_after_publication() {
        let mut store = TopologyStore::new();
        let mut stream = store.subscribe_nodes();

        store.add_node(Node::new("a", "a", NodeType::Router));
        let snap = stream.changed().await;
        assert_eq!(snap.map(|s| s.len()), Some(1));
        assert_eq!(stream.current().len(), 1);
    }

    #[tokio::test]
    async fn into_stream_starts_with_current_snapshot() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("a", "a", NodeType::Router));

        let mut stream = store.subscribe_nodes().into_stream();
        let first = stream.next().await;
        assert_eq!(first.map(|s| s.len()), Some(1));
    }

    #[tokio::test]
    async fn changed_returns_none_when_store_dropped() {
        let store = TopologyStore::new();
        let mut stream = store.subscribe_nodes();
        drop(store);
        assert!(stream.changed().await.is_none());
    }
}
