//! Explicit logging context for one batch flush.

use std::sync::Arc;

use tracing::{Span, info_span, span::Entered};

/// Carries the tracing span of a single flush into the reconciler.
///
/// Every log line emitted while a batch is applied is recorded inside this
/// span, so a flush can be followed end to end without ambient state.
#[derive(Debug, Clone)]
pub struct FlushContext {
    timeline: Arc<str>,
    flush: u64,
    span: Span,
}

impl FlushContext {
    /// Opens the span for flush number `flush` of `timeline` covering `ops` operations.
    #[must_use]
    pub fn new(timeline: Arc<str>, flush: u64, ops: usize) -> Self {
        let span = info_span!(
            "process_timeline_diffs",
            timeline = %timeline,
            flush,
            ops,
            rejected = tracing::field::Empty
        );
        Self {
            timeline,
            flush,
            span,
        }
    }

    /// Context with a disabled span, for callers outside a provider.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            timeline: Arc::from("detached"),
            flush: 0,
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn timeline(&self) -> &str {
        &self.timeline
    }

    #[must_use]
    pub const fn flush(&self) -> u64 {
        self.flush
    }

    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    pub fn enter(&self) -> Entered<'_> {
        self.span.enter()
    }

    /// Records the number of rejected operations on the flush span.
    pub fn record_rejected(&self, rejected: usize) {
        self.span.record("rejected", rejected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use tracing_subscriber::util::SubscriberInitExt;

    #[test]
    fn context_exposes_identity() {
        let _guard = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .set_default();

        let ctx = FlushContext::new(Arc::from("!room:example.org"), 3, 12);
        assert_eq!(ctx.timeline(), "!room:example.org");
        assert_eq!(ctx.flush(), 3);
        assert!(!ctx.span().is_disabled());

        let _entered = ctx.enter();
        ctx.record_rejected(1);
    }

    #[test]
    fn detached_context_has_no_span() {
        let ctx = FlushContext::detached();
        assert!(ctx.span().is_none());
        assert_eq!(ctx.flush(), 0);
    }
}
