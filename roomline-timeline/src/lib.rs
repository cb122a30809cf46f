#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)] // TODO(deps-001): remove once transitive dependencies converge.

//! Timeline reconciliation engine.
//!
//! Keeps a locally materialized copy of a remote, ordered chat timeline in
//! step with a stream of incremental diffs, batches bursts of diffs into a
//! single published update and derives per-item grouping styles.

pub mod batcher;
pub mod config;
pub mod context;
pub mod errors;
pub mod materializer;
pub mod models;
pub mod provider;
pub mod published;
pub mod reconciler;
pub mod source;
pub mod stylist;

pub use errors::{ReconcileError, SourceError};
pub use models::{DiffOperation, GroupStyle, ProviderState, RawItem, TimelineItem};
pub use provider::TimelineProvider;
pub use published::{TimelineSnapshot, TimelineUpdates};
pub use source::{SubscriptionFeed, TimelineSource, TimelineSubscription};
