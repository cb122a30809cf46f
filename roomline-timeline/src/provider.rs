//! Per-timeline processing task and its handle.
//!
//! Each [`TimelineProvider`] owns one tokio task. The task is the only writer
//! of the materialized sequence: it merges incoming diffs into the open batch,
//! waits out the debounce window, then reconciles, restyles and publishes the
//! result as a single snapshot.

use std::sync::Arc;

use futures_util::{FutureExt, StreamExt, stream::BoxStream};
use metrics::{counter, histogram};
use tokio::{
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    batcher::DiffBatcher,
    config::TimelineConfig,
    context::FlushContext,
    errors::SourceError,
    materializer::materialize_all,
    models::{DiffOperation, ProviderState, TimelineItem},
    published::{self, PublishedReader, PublishedState, TimelineSnapshot, TimelineUpdates},
    reconciler::{self, BatchReport},
    source::{TimelineSource, TimelineSubscription},
    stylist,
};

/// Handle to a running timeline.
///
/// Dropping the handle cancels the processing task; a batch that is still
/// waiting for its window to close is abandoned.
#[derive(Debug)]
pub struct TimelineProvider {
    label: Arc<str>,
    reader: PublishedReader,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TimelineProvider {
    /// Opens a subscription on `source` and starts processing it.
    ///
    /// # Errors
    /// Returns the source's error when the subscription cannot be opened.
    pub async fn connect<S>(source: &S, config: &TimelineConfig) -> Result<Self, SourceError>
    where
        S: TimelineSource + ?Sized,
    {
        let subscription = source.subscribe().await?;
        Ok(Self::spawn(subscription, config))
    }

    /// Seeds the sequence from the subscription's initial items and spawns
    /// the processing task under a generated label.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(subscription: TimelineSubscription, config: &TimelineConfig) -> Self {
        Self::spawn_labeled(Uuid::new_v4().to_string(), subscription, config)
    }

    /// Like [`TimelineProvider::spawn`], with `label` used in every log span.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn_labeled(
        label: impl Into<Arc<str>>,
        subscription: TimelineSubscription,
        config: &TimelineConfig,
    ) -> Self {
        let label = label.into();
        let TimelineSubscription {
            initial_items,
            diffs,
            states,
        } = subscription;

        let mut items = materialize_all(initial_items);
        stylist::restyle(&mut items);
        warn_on_duplicates(&label, &items);

        let window = config.effective_debounce_window();
        let capacity = config.effective_channel_capacity();
        if window != config.debounce_window() || capacity != config.update_channel_capacity {
            warn!(
                timeline = %label,
                window_ms = config.debounce_window_ms,
                capacity = config.update_channel_capacity,
                "Timeline configuration out of range; using clamped values"
            );
        }

        let (writer, reader) =
            published::channel(TimelineSnapshot::new(0, items.clone()), capacity);
        let token = CancellationToken::new();
        let worker = TimelineWorker {
            label: Arc::clone(&label),
            items,
            flushes: 0,
            published: writer,
        };

        info!(timeline = %label, items = worker.items.len(), "Starting timeline");
        let task = tokio::spawn(run(
            worker,
            DiffBatcher::new(window),
            diffs,
            states,
            token.clone(),
        ));

        Self {
            label,
            reader,
            token,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest published snapshot, without waiting.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TimelineSnapshot> {
        self.reader.snapshot()
    }

    #[must_use]
    pub fn provider_state(&self) -> ProviderState {
        self.reader.provider_state()
    }

    /// One snapshot per flush published after this call.
    #[must_use]
    pub fn subscribe(&self) -> TimelineUpdates {
        self.reader.subscribe()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> WatchStream<ProviderState> {
        self.reader.subscribe_state()
    }

    /// Whether the processing task is still consuming diffs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the upstream diff stream to end and the final batch to be
    /// published.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            join(&self.label, task).await;
        }
    }

    /// Cancels the processing task and waits for it to stop.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            join(&self.label, task).await;
        }
        debug!(timeline = %self.label, "Timeline shut down");
    }
}

impl Drop for TimelineProvider {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn join(label: &str, task: JoinHandle<()>) {
    if let Err(err) = task.await {
        warn!(timeline = %label, error = %err, "Timeline task ended abnormally");
    }
}

struct TimelineWorker {
    label: Arc<str>,
    items: Vec<TimelineItem>,
    flushes: u64,
    published: PublishedState,
}

impl TimelineWorker {
    fn flush(&mut self, ops: Vec<DiffOperation>) {
        self.flushes += 1;
        let ctx = FlushContext::new(Arc::clone(&self.label), self.flushes, ops.len());
        let started = Instant::now();

        let report = reconciler::apply_batch(&mut self.items, ops, &ctx);
        stylist::restyle(&mut self.items);

        let _entered = ctx.enter();
        warn_on_duplicates(&self.label, &self.items);
        record_metrics(&report);

        debug!(
            applied = report.applied,
            rejected = report.rejected.len(),
            len = self.items.len(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Finished applying timeline diffs"
        );
        trace!(items = ?reconciler::debug_identifiers(&self.items), "Published sequence");

        self.published
            .publish(TimelineSnapshot::new(self.flushes, self.items.clone()));
    }

    fn set_state(&self, state: ProviderState) {
        debug!(timeline = %self.label, state = %state, "Provider state changed");
        self.published.set_provider_state(state);
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_metrics(report: &BatchReport) {
    counter!("roomline_timeline_flushes_total").increment(1);
    histogram!("roomline_timeline_batch_size").record(report.total() as f64);
    counter!("roomline_timeline_diffs_applied_total").increment(report.applied as u64);
    counter!("roomline_timeline_diffs_rejected_total").increment(report.rejected.len() as u64);
}

fn warn_on_duplicates(label: &str, items: &[TimelineItem]) {
    let duplicates = reconciler::duplicate_ids(items);
    if !duplicates.is_empty() {
        warn!(timeline = %label, ids = ?duplicates, "Timeline contains duplicate item ids");
    }
}

async fn run(
    mut worker: TimelineWorker,
    mut batcher: DiffBatcher,
    mut diffs: BoxStream<'static, DiffOperation>,
    mut states: BoxStream<'static, ProviderState>,
    token: CancellationToken,
) {
    let mut states_open = true;

    loop {
        let deadline = batcher.deadline();
        tokio::select! {
            biased;
            () = token.cancelled() => {
                let abandoned = batcher.discard();
                debug!(timeline = %worker.label, abandoned, "Timeline cancelled");
                break;
            }
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                worker.flush(batcher.take());
            }
            next = diffs.next() => match next {
                Some(op) => batcher.push(op, Instant::now()),
                None => {
                    while states_open {
                        match states.next().now_or_never() {
                            Some(Some(state)) => worker.set_state(state),
                            Some(None) => states_open = false,
                            None => break,
                        }
                    }
                    if !batcher.is_empty() {
                        worker.flush(batcher.take());
                    }
                    debug!(timeline = %worker.label, flushes = worker.flushes, "Diff stream ended");
                    break;
                }
            },
            next = states.next(), if states_open => match next {
                Some(state) => worker.set_state(state),
                None => states_open = false,
            },
        }
    }
}
