use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::db::models::{CollectionKind, ContentRecord, ListQuery};
use crate::db::repository::DocumentStore;
use crate::error::AppError;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A committed write to one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: CollectionKind,
    pub id: String,
    pub change: ChangeKind,
}

/// Fan-out of committed writes to every live subscription in this process.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Notify subscribers. Having none is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of subscriptions currently holding a listener.
    pub fn active_subscriptions(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<ContentRecord>, AppError>> + Send>>;

/// A live query over one collection: ordering and an optional limit.
pub struct LiveQuery {
    store: Arc<dyn DocumentStore>,
    feed: ChangeFeed,
    kind: CollectionKind,
    query: ListQuery,
}

impl LiveQuery {
    pub fn new(store: Arc<dyn DocumentStore>, feed: ChangeFeed, kind: CollectionKind, query: ListQuery) -> Self {
        Self {
            store,
            feed,
            kind,
            query,
        }
    }

    /// Start listening. The first snapshot is the current state of the
    /// collection; a fresh snapshot follows every change to it.
    ///
    /// The listener is registered before the initial read, so a write that
    /// lands in between still produces a snapshot.
    pub fn start(self) -> Subscription {
        let LiveQuery {
            store,
            feed,
            kind,
            query,
        } = self;
        let mut receiver = feed.subscribe();

        let stream = async_stream::try_stream! {
            yield store.list(kind, &query).await?;

            loop {
                match receiver.recv().await {
                    Ok(event) if event.kind != kind => continue,
                    Ok(_) => yield store.list(kind, &query).await?,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Live query on {kind} skipped {skipped} change events");
                        yield store.list(kind, &query).await?;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        tracing::debug!("Live query started on {kind}");
        Subscription {
            kind,
            inner: Box::pin(stream),
        }
    }
}

/// A running live query. Dropping it (or calling [`Subscription::stop`])
/// releases the listener.
pub struct Subscription {
    kind: CollectionKind,
    inner: SnapshotStream,
}

impl Subscription {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Wait for the next snapshot. `None` once the feed is closed.
    pub async fn next_snapshot(&mut self) -> Option<Result<Vec<ContentRecord>, AppError>> {
        use futures::StreamExt;
        self.inner.next().await
    }

    pub fn stop(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("Live query stopped on {}", self.kind);
    }
}

impl Stream for Subscription {
    type Item = Result<Vec<ContentRecord>, AppError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
