//! Published timeline state.
//!
//! The processing task owns the [`PublishedState`] writer; consumers hold a
//! [`PublishedReader`]. The current snapshot and provider state live in watch
//! channels and can be read without waiting. Per-flush notifications go
//! through a broadcast channel so every flush reaches every subscriber, even
//! when two flushes produce equal sequences.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use futures_util::Stream;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream, errors::BroadcastStreamRecvError};
use tracing::warn;

use crate::models::{GroupStyle, ProviderState, TimelineItem};

/// Immutable, styled copy of the sequence as of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimelineSnapshot {
    flush: u64,
    items: Vec<TimelineItem>,
}

impl TimelineSnapshot {
    #[must_use]
    pub const fn new(flush: u64, items: Vec<TimelineItem>) -> Self {
        Self { flush, items }
    }

    /// Sequence number of the flush that produced this snapshot; 0 for the
    /// initial seed.
    #[must_use]
    pub const fn flush(&self) -> u64 {
        self.flush
    }

    #[must_use]
    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimelineItem> {
        self.items.get(index)
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&TimelineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Locates a local echo by the transaction id it was sent with.
    #[must_use]
    pub fn find_by_transaction_id(&self, transaction_id: &str) -> Option<&TimelineItem> {
        self.items.iter().find(|item| {
            item.as_event()
                .and_then(|event| event.properties.transaction_id.as_deref())
                == Some(transaction_id)
        })
    }

    /// Group style per position; `None` for virtual items.
    #[must_use]
    pub fn styles(&self) -> Vec<Option<GroupStyle>> {
        self.items.iter().map(TimelineItem::group_style).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimelineItem> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a TimelineSnapshot {
    type Item = &'a TimelineItem;
    type IntoIter = std::slice::Iter<'a, TimelineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Writer half, owned by the processing task.
#[derive(Debug)]
pub struct PublishedState {
    snapshot: watch::Sender<Arc<TimelineSnapshot>>,
    state: watch::Sender<ProviderState>,
    updates: broadcast::Sender<Arc<TimelineSnapshot>>,
}

/// Reader half, held by the provider handle.
///
/// Once the writer is dropped the last snapshot stays readable and update
/// streams end after draining.
#[derive(Debug)]
pub struct PublishedReader {
    snapshot: watch::Receiver<Arc<TimelineSnapshot>>,
    state: watch::Receiver<ProviderState>,
    updates: broadcast::Receiver<Arc<TimelineSnapshot>>,
}

/// Creates a linked writer and reader seeded with `initial`.
///
/// A zero `capacity` is raised to one.
#[must_use]
pub fn channel(initial: TimelineSnapshot, capacity: usize) -> (PublishedState, PublishedReader) {
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));
    let (state_tx, state_rx) = watch::channel(ProviderState::default());
    let (updates_tx, updates_rx) = broadcast::channel(capacity.max(1));

    (
        PublishedState {
            snapshot: snapshot_tx,
            state: state_tx,
            updates: updates_tx,
        },
        PublishedReader {
            snapshot: snapshot_rx,
            state: state_rx,
            updates: updates_rx,
        },
    )
}

impl PublishedState {
    /// Replaces the current snapshot and notifies every subscriber once.
    pub fn publish(&self, snapshot: TimelineSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.snapshot.send_replace(Arc::clone(&snapshot));
        // No live subscribers is not an error; the watch copy stays current.
        let _ = self.updates.send(snapshot);
    }

    pub fn set_provider_state(&self, state: ProviderState) {
        self.state.send_replace(state);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}

impl PublishedReader {
    #[must_use]
    pub fn snapshot(&self) -> Arc<TimelineSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    #[must_use]
    pub fn provider_state(&self) -> ProviderState {
        *self.state.borrow()
    }

    /// Stream of snapshots, one per flush published after this call.
    #[must_use]
    pub fn subscribe(&self) -> TimelineUpdates {
        TimelineUpdates::new(self.updates.resubscribe())
    }

    /// Stream of provider states, starting with the current one.
    #[must_use]
    pub fn subscribe_state(&self) -> WatchStream<ProviderState> {
        WatchStream::new(self.state.clone())
    }
}

/// Per-flush notification stream.
///
/// A subscriber that falls more than the channel capacity behind skips to the
/// oldest retained snapshot; the skipped count is logged. Dropping the stream
/// only stops delivery to this subscriber.
#[derive(Debug)]
pub struct TimelineUpdates {
    inner: BroadcastStream<Arc<TimelineSnapshot>>,
}

impl TimelineUpdates {
    fn new(receiver: broadcast::Receiver<Arc<TimelineSnapshot>>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for TimelineUpdates {
    type Item = Arc<TimelineSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(snapshot)) => return Poll::Ready(Some(snapshot)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "Timeline subscriber lagged behind, skipping snapshots");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
