//! Upstream subscription boundary.
//!
//! The sync layer hands the timeline an initial snapshot, a live diff stream
//! and an independent provider-state stream. [`TimelineSubscription::channel`]
//! builds one backed by in-process channels for replays and tests.

use std::fmt;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    errors::SourceError,
    models::{DiffOperation, ProviderState, RawItem},
};

/// Something that can open a live subscription to one timeline.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn subscribe(&self) -> Result<TimelineSubscription, SourceError>;
}

pub struct TimelineSubscription {
    pub initial_items: Vec<RawItem>,
    pub diffs: BoxStream<'static, DiffOperation>,
    pub states: BoxStream<'static, ProviderState>,
}

impl TimelineSubscription {
    /// Bundles upstream streams; both are fused so they may be polled after
    /// they end.
    #[must_use]
    pub fn new<D, S>(initial_items: Vec<RawItem>, diffs: D, states: S) -> Self
    where
        D: Stream<Item = DiffOperation> + Send + 'static,
        S: Stream<Item = ProviderState> + Send + 'static,
    {
        Self {
            initial_items,
            diffs: diffs.fuse().boxed(),
            states: states.fuse().boxed(),
        }
    }

    /// Subscription fed by the returned [`SubscriptionFeed`].
    ///
    /// Both streams end once every clone of the feed has been dropped.
    #[must_use]
    pub fn channel(initial_items: Vec<RawItem>) -> (Self, SubscriptionFeed) {
        let (diff_tx, diff_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = mpsc::unbounded_channel();

        let subscription = Self::new(
            initial_items,
            UnboundedReceiverStream::new(diff_rx),
            UnboundedReceiverStream::new(state_rx),
        );
        let feed = SubscriptionFeed {
            diffs: diff_tx,
            states: state_tx,
        };
        (subscription, feed)
    }
}

impl fmt::Debug for TimelineSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineSubscription")
            .field("initial_items", &self.initial_items.len())
            .finish_non_exhaustive()
    }
}

/// Producer handle for a channel-backed subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionFeed {
    diffs: mpsc::UnboundedSender<DiffOperation>,
    states: mpsc::UnboundedSender<ProviderState>,
}

impl SubscriptionFeed {
    /// Queues a diff; returns `false` once the timeline has gone away.
    #[must_use]
    pub fn push(&self, op: DiffOperation) -> bool {
        self.diffs.send(op).is_ok()
    }

    /// Queues diffs in order, stopping at the first one that cannot be delivered.
    #[must_use]
    pub fn push_all<I>(&self, ops: I) -> bool
    where
        I: IntoIterator<Item = DiffOperation>,
    {
        ops.into_iter().all(|op| self.push(op))
    }

    #[must_use]
    pub fn set_state(&self, state: ProviderState) -> bool {
        self.states.send(state).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.diffs.is_closed()
    }
}
