//! # Configuration
//!
//! Timeline engine settings and their resolution from files, environment
//! variables and explicit overrides.

pub mod timeline;

pub use timeline::{ConfigFormat, LogFormat, LoggingConfig, TimelineConfig};
